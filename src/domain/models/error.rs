use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),
    #[error("Session not found")]
    NotFound,
    #[error("{0}")]
    Backend(anyhow::Error),
    #[error("Failed to persist session data: {0}")]
    Storage(anyhow::Error),
}
