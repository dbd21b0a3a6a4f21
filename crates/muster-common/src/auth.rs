//! Token verification for the API boundary.
//!
//! Muster does not issue tokens — authentication lives in an external
//! collaborator. We only verify the HS256 bearer tokens it mints and lift
//! the claims into an [`Claims`] value.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims embedded in access tokens issued by the auth collaborator.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Display name
    pub name: String,
    /// Role names held by the user on the chat platform
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiration
    pub exp: i64,
}

/// Validate and decode a JWT.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
