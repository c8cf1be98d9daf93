//! Lazily loaded text classification sessions with presentation-ready results.
//!
//! A [`ClassifierSession`] owns one model obtained from a [`ModelProvider`].
//! The model is loaded on first use, shared by concurrent callers while the
//! load is in flight, and reused for every later request. Each prediction is
//! mapped by a [`ResultFormatter`] into a label, a display symbol and a whole
//! percentage.
//!
//! # Basic Usage
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use sentiment_session::{ClassifierSession, OnnxProvider};
//!
//! let session = ClassifierSession::new(Arc::new(OnnxProvider::new_default()?));
//!
//! // First call downloads and loads the model; later calls reuse it
//! let result = session.classify("This is a great movie!").await?;
//! println!("{}", result); // e.g. "POSITIVE 😊 100%"
//! # Ok(())
//! # }
//! ```
//!
//! # Custom providers
//!
//! Anything implementing [`ModelProvider`] can back a session:
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use sentiment_session::{ClassifierSession, ModelProvider, RawPrediction, TextClassifier};
//!
//! struct AlwaysHappy;
//!
//! #[async_trait]
//! impl TextClassifier for AlwaysHappy {
//!     async fn classify(&self, _text: &str) -> anyhow::Result<Vec<RawPrediction>> {
//!         Ok(vec![RawPrediction::new("POSITIVE", 0.99)])
//!     }
//! }
//!
//! #[async_trait]
//! impl ModelProvider for AlwaysHappy {
//!     async fn load(&self, _task: &str, _model: &str) -> anyhow::Result<Arc<dyn TextClassifier>> {
//!         Ok(Arc::new(AlwaysHappy))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let session = ClassifierSession::new(Arc::new(AlwaysHappy));
//! let result = session.classify("anything").await.unwrap();
//! assert_eq!(result.to_string(), "POSITIVE 😊 99%");
//! # });
//! ```

pub mod model_manager;
pub mod models;
pub mod onnx;
mod runtime;
pub mod session;

pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use onnx::{OnnxClassifier, OnnxProvider};
pub use runtime::{create_session_builder, OptimizationLevel, RuntimeConfig};
pub use session::{
    ClassifierSession, FormattedResult, ModelProvider, RawPrediction, ResultFormatter,
    SessionBuilder, SessionConfig, SessionError, SessionInfo, SessionState, SymbolTable,
    TextClassifier,
};
pub use tokio_util::sync::CancellationToken;

pub fn init_logger() {
    env_logger::init();
}
