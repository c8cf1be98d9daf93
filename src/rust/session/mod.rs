mod builder;
mod config;
mod error;
mod formatter;
mod provider;
mod session;

pub use builder::SessionBuilder;
pub use config::{SessionConfig, DEFAULT_MODEL, MODEL_ENV, TASK_ENV};
pub use error::SessionError;
pub use formatter::{
    FormattedResult, ResultFormatter, SymbolTable, NEGATIVE_SYMBOL, NEUTRAL_SYMBOL,
    POSITIVE_SYMBOL,
};
pub use provider::{ModelProvider, RawPrediction, TextClassifier, TEXT_CLASSIFICATION};
pub use session::ClassifierSession;

/// Lifecycle state of a [`ClassifierSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No model loaded and no load in flight
    Unloaded,
    /// A load is in flight; new requests wait on it
    Loading,
    /// The model is loaded and idle
    Ready,
    /// The model is loaded and at least one inference is running
    Busy,
}

/// Information about the current state and configuration of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Task kind requested from the provider
    pub task: String,
    /// Model identifier requested from the provider
    pub model: String,
    /// Current lifecycle state
    pub state: SessionState,
}
