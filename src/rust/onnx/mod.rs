//! A [`ModelProvider`] backed by ONNX Runtime and HuggingFace tokenizers.

mod classifier;
mod utils;

use std::io;
use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;
use log::info;

pub use classifier::OnnxClassifier;

use crate::model_manager::{ModelError, ModelManager};
use crate::models::{BuiltinModel, ModelInfo};
use crate::runtime::RuntimeConfig;
use crate::session::{ModelProvider, TextClassifier, TEXT_CLASSIFICATION};

/// Loads hub models into local ONNX sessions, downloading them on first use.
#[derive(Debug, Clone)]
pub struct OnnxProvider {
    manager: ModelManager,
    runtime_config: RuntimeConfig,
    offline: bool,
}

impl OnnxProvider {
    pub fn new(manager: ModelManager) -> Self {
        Self {
            manager,
            runtime_config: RuntimeConfig::default(),
            offline: false,
        }
    }

    /// Creates a provider caching models in the default models directory
    pub fn new_default() -> io::Result<Self> {
        Ok(Self::new(ModelManager::new_default()?))
    }

    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// When offline, loads fail unless the model is already cached
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn manager(&self) -> &ModelManager {
        &self.manager
    }

    /// Resolves a model identifier to its download description.
    ///
    /// Identifiers must name a hub repository: blank identifiers and `.` / `..`
    /// segments are rejected with [`ModelError::UnknownModel`].
    pub fn resolve(model: &str) -> Result<ModelInfo, ModelError> {
        if let Some(builtin) = BuiltinModel::from_identifier(model) {
            return Ok(builtin.get_model_info());
        }

        let repo = model.trim().trim_matches('/');
        let invalid = repo.is_empty()
            || repo
                .split('/')
                .any(|segment| segment.trim().is_empty() || segment == "." || segment == "..");
        if invalid {
            return Err(ModelError::UnknownModel(model.to_string()));
        }
        Ok(ModelInfo::from_identifier(repo))
    }
}

#[async_trait]
impl ModelProvider for OnnxProvider {
    async fn load(&self, task: &str, model: &str) -> anyhow::Result<Arc<dyn TextClassifier>> {
        if task != TEXT_CLASSIFICATION {
            bail!("Unsupported task '{}', only '{}' is available", task, TEXT_CLASSIFICATION);
        }

        let info = Self::resolve(model)?;
        if self.offline {
            self.manager.require_downloaded(&info.name)?;
        } else {
            self.manager.ensure_model_downloaded(&info).await?;
        }

        let model_path = self.manager.get_model_path(&info.name);
        let tokenizer_path = self.manager.get_tokenizer_path(&info.name);
        let config_path = self.manager.get_config_path(&info.name);
        let runtime_config = self.runtime_config;
        let max_sequence_length = info.max_sequence_length;

        info!("Building ONNX session for '{}'", model);
        let classifier = tokio::task::spawn_blocking(move || {
            OnnxClassifier::from_files(
                &model_path,
                &tokenizer_path,
                &config_path,
                &runtime_config,
                max_sequence_length,
            )
        })
        .await
        .context("Model loading task failed")??;
        info!("Model '{}' labels: {:?}", model, classifier.labels());

        Ok(Arc::new(classifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn offline_provider(tag: &str) -> OnnxProvider {
        let dir = env::temp_dir()
            .join("sentiment-session-tests")
            .join(format!("onnx-{}-{}", tag, std::process::id()));
        OnnxProvider::new(ModelManager::new(dir).unwrap()).offline(true)
    }

    #[test]
    fn test_resolve_builtin_and_custom() {
        let builtin = OnnxProvider::resolve(BuiltinModel::DistilBertSst2.identifier()).unwrap();
        assert_eq!(builtin, BuiltinModel::DistilBertSst2.get_model_info());

        let custom = OnnxProvider::resolve(" org/custom-sentiment/ ").unwrap();
        assert_eq!(custom.name, "org--custom-sentiment");
    }

    #[test]
    fn test_resolve_rejects_unusable_identifiers() {
        for model in ["", "   ", "//", "org//model", "../secrets", "org/."] {
            let err = OnnxProvider::resolve(model).unwrap_err();
            assert!(
                matches!(err, ModelError::UnknownModel(ref id) if id == model),
                "accepted {:?}",
                model
            );
        }
    }

    #[tokio::test]
    async fn test_load_reports_unknown_model() {
        let provider = offline_provider("unknown");
        let err = provider.load(TEXT_CLASSIFICATION, " / ").await.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ModelError>(),
            Some(ModelError::UnknownModel(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_other_tasks() {
        let provider = offline_provider("task");
        let err = provider
            .load("token-classification", BuiltinModel::DistilBertSst2.identifier())
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("Unsupported task"));
    }

    #[tokio::test]
    async fn test_offline_requires_cached_model() {
        let provider = offline_provider("missing");
        let err = provider
            .load(TEXT_CLASSIFICATION, "org/not-cached")
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("not downloaded"));
    }
}
