use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while parsing or evaluating a layout expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// A context reference could not be resolved against the evaluation context.
    #[error("unable to resolve {reference}: {reason}")]
    ContextResolution { reference: String, reason: String },

    /// A function was given the wrong number of arguments.
    #[error("function \"{function}\" expects {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: String,
        actual: usize,
    },

    /// The operator name is not one of the known functions.
    #[error("function \"{0}\" not implemented")]
    UnknownFunction(String),

    /// An argument could not be cast to the type the function needs.
    #[error("expected {expected}, got value {value}")]
    Type { expected: &'static str, value: String },

    /// JSON that is neither a literal nor a function application.
    #[error("invalid expression: {0}")]
    InvalidExpression(String),
}

impl ExprError {
    pub(crate) fn context(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        ExprError::ContextResolution {
            reference: reference.into(),
            reason: reason.into(),
        }
    }
}

/// Failures raised while loading a shared test corpus from disk.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("fixture directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to parse fixture {}: {source}", .file.display())]
    Parse {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// Type alias for results that use `ExprError` as the error type
pub type Result<T> = std::result::Result<T, ExprError>;
