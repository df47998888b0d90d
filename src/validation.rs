use thiserror::Error;

/// Input problems caught before anything is sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a project name")]
    MissingName,
    #[error("Please select at least one file")]
    NoFiles,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("A request is already in progress")]
    Busy,
}
