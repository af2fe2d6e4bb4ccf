use stow_core::StowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("unbalanced nodes: {0}")]
    UnbalancedNodes(&'static str),

    #[error("a size tag must be the first value of a node")]
    MisplacedSizeTag,

    #[error("node exhausted after {0} values")]
    Exhausted(usize),

    #[error("non-finite float {0} has no JSON representation")]
    NonFinite(f64),

    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("JSON syntax error: {0}")]
    Syntax(#[from] serde_json::Error),
}

impl From<JsonError> for StowError {
    fn from(err: JsonError) -> Self {
        match err {
            JsonError::Exhausted(_) => StowError::Truncated(err.to_string()),
            other => StowError::archive(other),
        }
    }
}

impl JsonError {
    /// The JSON-specific cause of `err`, if it has one.
    pub fn find(err: &StowError) -> Option<&JsonError> {
        match err {
            StowError::Archive(source) => source.downcast_ref(),
            _ => None,
        }
    }
}

pub type JsonResult<T> = Result<T, JsonError>;
