use std::fmt;

const HUB_BASE_URL: &str = "https://huggingface.co";

/// Represents the models known to this library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinModel {
    /// DistilBERT fine-tuned on SST-2, quantized ONNX export
    ///
    /// Characteristics:
    /// - Labels: NEGATIVE, POSITIVE
    /// - Max sequence length: 512
    /// - Size: ~67MB
    DistilBertSst2,
}

/// Characteristics of a model including its capabilities and requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCharacteristics {
    /// Maximum sequence length the model can handle
    pub max_sequence_length: usize,
    /// Number of output labels
    pub num_labels: usize,
    /// Approximate size of the model in memory
    pub model_size_mb: usize,
}

/// Where to fetch a model's files from and how to verify them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Directory name under the models cache
    pub name: String,
    pub model_url: String,
    pub tokenizer_url: String,
    pub config_url: String,
    /// Expected SHA-256 digests, hex encoded; `None` skips verification
    pub model_hash: Option<String>,
    pub tokenizer_hash: Option<String>,
    pub config_hash: Option<String>,
    pub max_sequence_length: usize,
}

impl ModelInfo {
    /// Describes a hub repository laid out like the reference model:
    /// `onnx/model_quantized.onnx`, `tokenizer.json` and `config.json` at the root.
    ///
    /// # Example
    /// ```
    /// use sentiment_session::ModelInfo;
    ///
    /// let info = ModelInfo::from_identifier("Xenova/bert-base-multilingual-uncased-sentiment");
    /// assert_eq!(info.name, "Xenova--bert-base-multilingual-uncased-sentiment");
    /// ```
    pub fn from_identifier(identifier: &str) -> Self {
        let repo = identifier.trim().trim_matches('/');
        let base = format!("{}/{}/resolve/main", HUB_BASE_URL, repo);
        Self {
            name: repo.replace('/', "--"),
            model_url: format!("{}/onnx/model_quantized.onnx", base),
            tokenizer_url: format!("{}/tokenizer.json", base),
            config_url: format!("{}/config.json", base),
            model_hash: None,
            tokenizer_hash: None,
            config_hash: None,
            max_sequence_length: 512,
        }
    }

    pub fn with_max_sequence_length(mut self, max_sequence_length: usize) -> Self {
        self.max_sequence_length = max_sequence_length;
        self
    }
}

impl BuiltinModel {
    pub const ALL: [BuiltinModel; 1] = [BuiltinModel::DistilBertSst2];

    /// Hub identifier of the model
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::DistilBertSst2 => "Xenova/distilbert-base-uncased-finetuned-sst-2-english",
        }
    }

    /// Maps a hub identifier back to a builtin model, ignoring ASCII case
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|model| model.identifier().eq_ignore_ascii_case(identifier.trim()))
    }

    /// Get the characteristics of the model
    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            Self::DistilBertSst2 => ModelCharacteristics {
                max_sequence_length: 512,
                num_labels: 2,
                model_size_mb: 67,
            },
        }
    }

    pub fn get_model_info(&self) -> ModelInfo {
        ModelInfo::from_identifier(self.identifier())
            .with_max_sequence_length(self.characteristics().max_sequence_length)
    }
}

impl fmt::Display for BuiltinModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_model_info() {
        let info = BuiltinModel::DistilBertSst2.get_model_info();
        assert_eq!(info.name, "Xenova--distilbert-base-uncased-finetuned-sst-2-english");
        assert!(info.model_url.ends_with("/onnx/model_quantized.onnx"));
        assert!(info.tokenizer_url.ends_with("/tokenizer.json"));
        assert!(info.config_url.ends_with("/config.json"));
        assert_eq!(info.max_sequence_length, 512);
    }

    #[test]
    fn test_from_identifier_roundtrip() {
        let model = BuiltinModel::from_identifier(
            "xenova/distilbert-base-uncased-finetuned-sst-2-english",
        );
        assert_eq!(model, Some(BuiltinModel::DistilBertSst2));
        assert_eq!(BuiltinModel::from_identifier("someone/else"), None);
    }

    #[test]
    fn test_identifier_is_trimmed() {
        let info = ModelInfo::from_identifier(" org/model/ ");
        assert_eq!(info.name, "org--model");
        assert_eq!(
            info.config_url,
            "https://huggingface.co/org/model/resolve/main/config.json"
        );
    }
}
