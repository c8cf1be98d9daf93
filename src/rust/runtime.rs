use std::sync::OnceLock;

use anyhow::anyhow;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;

/// Graph optimisation applied when an ONNX session is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationLevel {
    Disable,
    Basic,
    Extended,
    #[default]
    All,
}

impl From<OptimizationLevel> for GraphOptimizationLevel {
    fn from(level: OptimizationLevel) -> Self {
        match level {
            OptimizationLevel::Disable => GraphOptimizationLevel::Disable,
            OptimizationLevel::Basic => GraphOptimizationLevel::Level1,
            OptimizationLevel::Extended => GraphOptimizationLevel::Level2,
            OptimizationLevel::All => GraphOptimizationLevel::Level3,
        }
    }
}

/// Threading and optimisation settings for ONNX Runtime sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// 0 lets ONNX Runtime decide
    pub inter_threads: usize,
    /// 0 lets ONNX Runtime decide
    pub intra_threads: usize,
    pub optimization_level: OptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0,
            intra_threads: 0,
            optimization_level: OptimizationLevel::All,
        }
    }
}

static ENVIRONMENT: OnceLock<Result<(), String>> = OnceLock::new();

/// Initialises the process-wide ONNX Runtime environment once.
///
/// A failed initialisation is remembered and reported to every caller.
pub fn ensure_initialized() -> anyhow::Result<()> {
    ENVIRONMENT
        .get_or_init(|| {
            ort::init()
                .with_name("sentiment-session")
                .commit()
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .clone()
        .map_err(|e| anyhow!("Failed to initialize ONNX Runtime: {}", e))
}

pub fn create_session_builder(config: &RuntimeConfig) -> anyhow::Result<SessionBuilder> {
    ensure_initialized()?;
    let mut builder = Session::builder()?;

    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }

    Ok(builder.with_optimization_level(config.optimization_level.into())?)
}
