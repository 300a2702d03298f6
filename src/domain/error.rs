use thiserror::Error;

use super::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    /// Covers both a missing id and an id owned by someone else.
    #[error("todo not found")]
    NotFound,
    #[error("store failure: {0:#}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for TodoError {
    fn from(err: anyhow::Error) -> Self { TodoError::Store(err) }
}
