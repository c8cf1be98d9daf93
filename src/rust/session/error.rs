/// Represents the different types of errors a classification session can report.
///
/// Errors are `Clone` because a single failed model load is delivered to every
/// caller that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The request text failed validation; nothing was loaded or run
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The model provider failed to produce a classifier
    #[error("Model load error: {0}")]
    ModelLoad(String),
    /// The loaded classifier failed to produce a prediction
    #[error("Inference error: {0}")]
    Inference(String),
    /// The caller cancelled while waiting on the load or the inference
    #[error("Operation cancelled")]
    Cancelled,
    /// The session could not be constructed
    #[error("Build error: {0}")]
    BuildError(String),
}

impl SessionError {
    /// Returns true when repeating the same call may succeed.
    ///
    /// Invalid input and build errors are deterministic; everything else
    /// leaves the session usable for another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ModelLoad(_) | Self::Inference(_) | Self::Cancelled
        )
    }

    pub(crate) fn model_load(err: impl std::fmt::Display) -> Self {
        Self::ModelLoad(err.to_string())
    }

    pub(crate) fn inference(err: impl std::fmt::Display) -> Self {
        Self::Inference(err.to_string())
    }
}
