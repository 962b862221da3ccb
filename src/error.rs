use thiserror::Error;

/// Errors surfaced by the public API.
///
/// Matrix shape mismatches are not represented here: they are programming
/// errors and panic at the offending operator.
#[derive(Debug, Error)]
pub enum NnError {
    /// A numeric tag did not name any known variant of `kind`.
    #[error("unknown {kind} tag: {tag}")]
    UnknownTag { kind: &'static str, tag: i32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("input has {actual} values, network expects {expected}")]
    InputSize { expected: usize, actual: usize },

    #[error("target has {actual} values, network produces {expected}")]
    TargetSize { expected: usize, actual: usize },

    #[error("corrupt model file: {0}")]
    CorruptModel(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NnError>;
