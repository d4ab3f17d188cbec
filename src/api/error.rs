use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field errors in the `{"errors": {"title": ["can't be blank"]}}` shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.into(), vec![message.into()]);
        Self { errors }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field} {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Rejected by server: {0}")]
    Validation(ValidationErrors),
}

impl ApiError {
    pub fn not_found(what: impl fmt::Display) -> Self {
        ApiError::Http {
            status: 404,
            message: format!("{what} not found"),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Http { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(ApiError::Transport("reset".into()).is_network());
        assert!(ApiError::not_found("article 'x'").is_network());

        let rejected = ApiError::Validation(ValidationErrors::single("article", "already favorited"));
        assert!(rejected.is_validation());
        assert!(!rejected.is_network());
        assert_eq!(rejected.to_string(), "Rejected by server: article already favorited");
    }

    #[test]
    fn test_validation_errors_from_wire() {
        let errors: ValidationErrors =
            serde_json::from_str(r#"{"errors": {"body": ["can't be empty"], "title": ["is taken", "is too long"]}}"#)
                .unwrap();
        assert_eq!(
            errors.to_string(),
            "body can't be empty; title is taken; title is too long"
        );
    }
}
