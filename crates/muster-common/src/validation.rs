//! Input validation utilities.
//!
//! Centralized validation helpers used across API routes.

use validator::Validate;

use crate::error::MusterError;

/// Validate a request body, returning a MusterError::Validation on failure.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), MusterError> {
    body.validate().map_err(|e| MusterError::Validation {
        message: format_validation_errors(e),
    })
}

/// Format validation errors into a human-readable string.
fn format_validation_errors(errors: validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for '{field}'"))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Req {
        #[validate(length(min = 1, max = 10, message = "name must be 1-10 characters"))]
        name: String,
    }

    #[test]
    fn valid_body_passes() {
        assert!(validate_request(&Req { name: "goblins".into() }).is_ok());
    }

    #[test]
    fn invalid_body_surfaces_field_message() {
        let err = validate_request(&Req { name: String::new() }).unwrap_err();
        match err {
            MusterError::Validation { message } => {
                assert!(message.contains("1-10 characters"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
