use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use log::{debug, info};
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::utils::{label_for, parse_labels, softmax, truncate_tokens};
use crate::runtime::{create_session_builder, RuntimeConfig};
use crate::session::{RawPrediction, TextClassifier};

/// A sequence-classification model running on ONNX Runtime.
///
/// The graph is expected to take `input_ids` (and optionally `attention_mask`
/// and `token_type_ids`), each shaped `[1, sequence_length]`, and to produce
/// logits shaped `[1, num_labels]` as its first output.
///
/// Cloning is cheap; the session and tokenizer are shared.
#[derive(Debug, Clone)]
pub struct OnnxClassifier {
    session: Arc<Session>,
    tokenizer: Arc<Tokenizer>,
    labels: Arc<Vec<String>>,
    input_names: Arc<Vec<String>>,
    max_sequence_length: usize,
}

impl OnnxClassifier {
    /// Loads graph, tokenizer and label names. Blocking.
    pub fn from_files(
        model_path: &Path,
        tokenizer_path: &Path,
        config_path: &Path,
        runtime_config: &RuntimeConfig,
        max_sequence_length: usize,
    ) -> anyhow::Result<Self> {
        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {:?}: {}", tokenizer_path, e))?;
        debug!("Tokenizer loaded from {:?}", tokenizer_path);

        let session = create_session_builder(runtime_config)?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load model from {:?}", model_path))?;
        let input_names = Self::validate_model(&session)?;

        let raw_config = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read model config {:?}", config_path))?;
        let labels = parse_labels(&raw_config)?;

        info!(
            "Loaded ONNX classifier with inputs {:?} and labels {:?}",
            input_names, labels
        );

        Ok(Self {
            session: Arc::new(session),
            tokenizer: Arc::new(tokenizer),
            labels: Arc::new(labels),
            input_names: Arc::new(input_names),
            max_sequence_length,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Checks the graph's inputs and outputs, returning the input names in order
    fn validate_model(session: &Session) -> anyhow::Result<Vec<String>> {
        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        if !input_names.iter().any(|name| name == "input_ids") {
            bail!("Model must have an 'input_ids' input, found {:?}", input_names);
        }
        if session.outputs.is_empty() {
            bail!("Model must have at least 1 output for logits");
        }
        Ok(input_names)
    }

    /// Runs the model synchronously, returning predictions by descending score
    pub fn predict(&self, text: &str) -> anyhow::Result<Vec<RawPrediction>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Failed to tokenize input: {}", e))?;
        let ids = truncate_tokens(encoding.get_ids(), self.max_sequence_length);
        let len = ids.len();

        let mut inputs = HashMap::new();
        for name in self.input_names.iter() {
            let values: Vec<i64> = match name.as_str() {
                "input_ids" => ids.iter().map(|&id| i64::from(id)).collect(),
                "attention_mask" => vec![1; len],
                "token_type_ids" => vec![0; len],
                other => bail!("Unsupported model input '{}'", other),
            };
            let array = Array2::from_shape_vec((1, len), values)
                .context("Failed to create input array")?;
            inputs.insert(name.as_str(), Tensor::from_array(array)?);
        }

        let outputs = self.session.run(inputs).context("Failed to run model")?;
        let logits = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract logits")?;
        let logits: Vec<f32> = logits.iter().copied().collect();
        if logits.is_empty() {
            bail!("Model produced no logits");
        }

        let mut predictions: Vec<RawPrediction> = softmax(&logits)
            .into_iter()
            .enumerate()
            .map(|(index, score)| RawPrediction::new(label_for(&self.labels, index), score))
            .collect();
        predictions.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        Ok(predictions)
    }
}

#[async_trait]
impl TextClassifier for OnnxClassifier {
    async fn classify(&self, text: &str) -> anyhow::Result<Vec<RawPrediction>> {
        let classifier = self.clone();
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || classifier.predict(&text))
            .await
            .context("Inference task failed")?
    }
}
