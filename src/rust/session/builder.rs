use std::sync::Arc;

use super::config::SessionConfig;
use super::error::SessionError;
use super::formatter::{ResultFormatter, SymbolTable};
use super::provider::ModelProvider;
use super::session::ClassifierSession;

/// A builder for constructing a ClassifierSession with a fluent interface.
#[derive(Default)]
pub struct SessionBuilder {
    provider: Option<Arc<dyn ModelProvider>>,
    config: SessionConfig,
    formatter: ResultFormatter,
}

impl SessionBuilder {
    /// Creates a builder with the default task, model and symbol table
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the provider the session loads its model from (required)
    pub fn with_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replaces task and model identifiers at once
    ///
    /// # Example
    /// ```
    /// use sentiment_session::{SessionBuilder, SessionConfig};
    ///
    /// let builder = SessionBuilder::new()
    ///     .with_config(SessionConfig::from_env());
    /// ```
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.config.task = task.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn with_formatter(mut self, formatter: ResultFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Shorthand for `with_formatter(ResultFormatter::new(symbols))`
    pub fn with_symbols(self, symbols: SymbolTable) -> Self {
        self.with_formatter(ResultFormatter::new(symbols))
    }

    /// Builds the session. Nothing is loaded until the first request.
    ///
    /// # Returns
    /// * `Result<ClassifierSession, SessionError>` - The session, or a `BuildError` if:
    ///   - No provider was set
    ///   - The task or model identifier is blank
    pub fn build(self) -> Result<ClassifierSession, SessionError> {
        let provider = self
            .provider
            .ok_or_else(|| SessionError::BuildError("A model provider must be set".into()))?;

        if self.config.task.trim().is_empty() {
            return Err(SessionError::BuildError("Task kind cannot be empty".into()));
        }
        if self.config.model.trim().is_empty() {
            return Err(SessionError::BuildError("Model identifier cannot be empty".into()));
        }

        Ok(ClassifierSession::from_parts(
            self.config,
            provider,
            self.formatter,
        ))
    }
}
