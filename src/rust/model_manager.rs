use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::models::ModelInfo;

/// Environment variable that overrides the cache root.
pub const CACHE_ENV: &str = "SENTIMENT_SESSION_CACHE";

const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Unknown model: '{0}'")]
    UnknownModel(String),
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed for {0}")]
    VerificationFailed(String),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// One file belonging to a model, with its source and expected digest.
struct ModelFile<'a> {
    file_type: &'static str,
    url: &'a str,
    hash: Option<&'a str>,
    path: PathBuf,
}

/// Downloads, verifies and locates model files in a local cache directory.
///
/// Every model lives in its own directory (`<models_dir>/<info.name>/`)
/// holding `model.onnx`, `tokenizer.json` and `config.json`.
#[derive(Debug, Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(CACHE_ENV) {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("sentiment-session").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("sentiment-session").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("sentiment-session").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_dir(&self, name: &str) -> PathBuf {
        self.models_dir.join(name)
    }

    pub fn get_model_path(&self, name: &str) -> PathBuf {
        self.get_model_dir(name).join(MODEL_FILE)
    }

    pub fn get_tokenizer_path(&self, name: &str) -> PathBuf {
        self.get_model_dir(name).join(TOKENIZER_FILE)
    }

    pub fn get_config_path(&self, name: &str) -> PathBuf {
        self.get_model_dir(name).join(CONFIG_FILE)
    }

    pub fn is_model_downloaded(&self, name: &str) -> bool {
        let present = self.files_for_name(name).iter().all(|path| path.exists());
        log::debug!("Model '{}' downloaded: {}", name, present);
        present
    }

    /// Returns `NotDownloaded` unless every file of the model is on disk
    pub fn require_downloaded(&self, name: &str) -> Result<(), ModelError> {
        if self.is_model_downloaded(name) {
            Ok(())
        } else {
            Err(ModelError::NotDownloaded(name.to_string()))
        }
    }

    /// Downloads every missing or corrupt file of the model.
    ///
    /// Files already on disk that pass verification are kept. If any file
    /// fails, all files of the model are removed so a later attempt starts clean.
    pub async fn download_model(&self, info: &ModelInfo) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.get_model_dir(&info.name);
        log::info!("Preparing model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        for file in self.files_for(info) {
            if let Err(e) = self.fetch_file(&file).await {
                log::error!("Failed to set up {} file: {}", file.file_type, e);
                let _ = self.remove_download(&info.name);
                return Err(e);
            }
        }

        log::info!("Model '{}' ready to use", info.name);
        Ok(())
    }

    async fn fetch_file(&self, file: &ModelFile<'_>) -> Result<(), ModelError> {
        if file.path.exists() {
            if self.verify_file(&file.path, file.hash)? {
                log::debug!("Existing {} file verified at {:?}", file.file_type, file.path);
                return Ok(());
            }
            log::warn!("{} file verification failed, redownloading", file.file_type);
        }
        self.download_and_verify_file(file).await
    }

    fn verify_file(&self, path: &Path, expected_hash: Option<&str>) -> Result<bool, ModelError> {
        let Some(expected) = expected_hash else {
            return Ok(path.exists());
        };
        if !path.exists() {
            return Ok(false);
        }
        let actual = sha256_hex(&fs::read(path)?);
        log::debug!("Hash of {:?}: {} (expected {})", path, actual, expected);
        Ok(actual.eq_ignore_ascii_case(expected))
    }

    /// Checks that every file of the model exists and matches its digest
    pub fn verify_model(&self, info: &ModelInfo) -> Result<bool, ModelError> {
        for file in self.files_for(info) {
            if !self.verify_file(&file.path, file.hash)? {
                log::info!("{} file at {:?} failed verification", file.file_type, file.path);
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn download_and_verify_file(&self, file: &ModelFile<'_>) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file.file_type, file.url, file.path);
        let response = reqwest::get(file.url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = file.hash {
            let actual = sha256_hex(&bytes);
            if !actual.eq_ignore_ascii_case(expected) {
                log::error!("{} hash mismatch: expected {}, got {}", file.file_type, expected, actual);
                return Err(ModelError::HashMismatch {
                    file_type: file.file_type.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        if let Some(parent) = file.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write next to the target and rename so readers never see a partial file
        let partial = file.path.with_extension("part");
        fs::write(&partial, &bytes)?;
        fs::rename(&partial, &file.path)?;

        if !self.verify_file(&file.path, file.hash)? {
            return Err(ModelError::VerificationFailed(file.file_type.to_string()));
        }

        log::info!("{} file downloaded and verified successfully", file.file_type);
        Ok(())
    }

    pub fn remove_download(&self, name: &str) -> Result<(), ModelError> {
        for path in self.files_for_name(name) {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, info: &ModelInfo) -> Result<(), ModelError> {
        if !self.is_model_downloaded(&info.name) {
            log::info!("Model '{}' not found, downloading...", info.name);
            return self.download_model(info).await;
        }
        if !self.verify_model(info)? {
            log::info!("Model '{}' verification failed, re-downloading...", info.name);
            self.remove_download(&info.name)?;
            self.download_model(info).await?;
        }
        Ok(())
    }

    fn files_for_name(&self, name: &str) -> [PathBuf; 3] {
        [
            self.get_model_path(name),
            self.get_tokenizer_path(name),
            self.get_config_path(name),
        ]
    }

    fn files_for<'a>(&self, info: &'a ModelInfo) -> [ModelFile<'a>; 3] {
        [
            ModelFile {
                file_type: "model",
                url: &info.model_url,
                hash: info.model_hash.as_deref(),
                path: self.get_model_path(&info.name),
            },
            ModelFile {
                file_type: "tokenizer",
                url: &info.tokenizer_url,
                hash: info.tokenizer_hash.as_deref(),
                path: self.get_tokenizer_path(&info.name),
            },
            ModelFile {
                file_type: "config",
                url: &info.config_url,
                hash: info.config_hash.as_deref(),
                path: self.get_config_path(&info.name),
            },
        ]
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
