//! Middleware — authentication extraction and the admin predicate.

use axum::{extract::Request, http::header, middleware::Next, response::Response};
use muster_common::error::MusterError;

/// Authentication context extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: uuid::Uuid,
    pub display_name: String,
    /// Role names as asserted by the auth collaborator
    pub roles: Vec<String>,
}

impl AuthContext {
    /// Whether the caller holds a configured admin role.
    pub fn is_admin(&self) -> bool {
        muster_common::config::get().admin.is_admin(&self.roles)
    }
}

/// Extract and validate the JWT from the Authorization: Bearer <token> header.
pub async fn auth_middleware(mut request: Request, next: Next) -> Result<Response, MusterError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(MusterError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(MusterError::Unauthorized)?;

    let config = muster_common::config::get();
    let claims = muster_common::auth::validate_token(token, &config.auth.jwt_secret)
        .map_err(|_| MusterError::InvalidToken)?;

    let user_id = claims
        .sub
        .parse::<uuid::Uuid>()
        .map_err(|_| MusterError::InvalidToken)?;

    let auth_ctx = AuthContext {
        user_id,
        display_name: claims.name,
        roles: claims.roles,
    };

    // Insert auth context into request extensions for handlers to use
    request.extensions_mut().insert(auth_ctx);

    Ok(next.run(request).await)
}

/// Guard: the caller must be the game's DM or hold an admin role.
pub fn require_dm_or_admin(
    auth: &AuthContext,
    dm_id: uuid::Uuid,
) -> Result<(), MusterError> {
    if auth.user_id == dm_id || auth.is_admin() {
        Ok(())
    } else {
        Err(MusterError::Forbidden)
    }
}

/// Guard: the caller must hold an admin role.
pub fn require_admin(auth: &AuthContext) -> Result<(), MusterError> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(MusterError::Forbidden)
    }
}
