use thiserror::Error;

/// Error kinds surfaced by the service layer.
///
/// Callers only ever learn the kind; messages never name the failing layer.
#[derive(Error, Debug)]
pub enum MesmerError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("email is already registered")]
    Conflict,
    #[error("invalid credentials")]
    Unauthorized,
    #[error("record not found")]
    NotFound,
    #[error("internal error: {0}")]
    Internal(String),
}
