use std::env;

use super::provider::TEXT_CLASSIFICATION;

/// Identifier of the model the reference application classifies with.
pub const DEFAULT_MODEL: &str = "Xenova/distilbert-base-uncased-finetuned-sst-2-english";

pub const TASK_ENV: &str = "SENTIMENT_SESSION_TASK";
pub const MODEL_ENV: &str = "SENTIMENT_SESSION_MODEL";

/// Which model a session asks its provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Task kind passed to the provider (e.g. "text-classification")
    pub task: String,
    /// Model identifier passed to the provider
    pub model: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            task: TEXT_CLASSIFICATION.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn new(task: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            model: model.into(),
        }
    }

    /// Returns the default configuration with `SENTIMENT_SESSION_TASK` and
    /// `SENTIMENT_SESSION_MODEL` applied when they are set and non-empty
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(task) = non_empty_var(TASK_ENV) {
            config.task = task;
        }
        if let Some(model) = non_empty_var(MODEL_ENV) {
            config.model = model;
        }
        config
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.task, "text-classification");
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_from_env() {
        env::set_var(MODEL_ENV, "Xenova/bert-base-multilingual-uncased-sentiment");
        env::set_var(TASK_ENV, "  ");
        let config = SessionConfig::from_env();
        assert_eq!(config.model, "Xenova/bert-base-multilingual-uncased-sentiment");
        assert_eq!(config.task, "text-classification");
        env::remove_var(MODEL_ENV);
        env::remove_var(TASK_ENV);

        assert_eq!(SessionConfig::from_env(), SessionConfig::default());
    }
}
