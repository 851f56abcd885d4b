//! Error types for component operations.

use hf_core::error::CoreError;
use thiserror::Error;

/// Errors raised while configuring or evaluating components.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Unsupported {what} type: '{tag}'")]
    UnsupportedType { what: &'static str, tag: String },

    #[error("Not implemented: {what}")]
    NotImplemented { what: String },

    #[error("Missing parameter '{name}' on '{owner}'")]
    MissingParameter { owner: String, name: String },

    #[error("Conception issue: {what}")]
    ConceptionIssue { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl ComponentError {
    pub(crate) fn unsupported(what: &'static str, tag: &str) -> Self {
        ComponentError::UnsupportedType {
            what,
            tag: tag.to_string(),
        }
    }
}

impl From<CoreError> for ComponentError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NonFinite { what, .. } => ComponentError::NonPhysical { what },
            other => ComponentError::InvalidArg {
                what: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ComponentError::unsupported("brick", "Glacier");
        assert!(err.to_string().contains("Glacier"));
        assert!(err.to_string().contains("brick"));
    }

    #[test]
    fn error_conversion() {
        let core = CoreError::NonFinite {
            what: "content",
            value: f64::NAN,
        };
        let err: ComponentError = core.into();
        assert!(matches!(err, ComponentError::NonPhysical { what: "content" }));
    }
}
