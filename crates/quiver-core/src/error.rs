use thiserror::Error;

/// Core error type with minimal dependencies
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}
