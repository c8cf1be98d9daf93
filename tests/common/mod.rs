#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use env_logger::{Builder, Env};
use sentiment_session::{ModelProvider, RawPrediction, TextClassifier};

// Initialize test logger
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// Classifier returning canned predictions, optionally failing or stalling.
pub struct ScriptedClassifier {
    predictions: Vec<RawPrediction>,
    pub fail: AtomicBool,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

#[async_trait]
impl TextClassifier for ScriptedClassifier {
    async fn classify(&self, _text: &str) -> anyhow::Result<Vec<RawPrediction>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("simulated inference failure");
        }
        Ok(self.predictions.clone())
    }
}

/// Provider that counts loads and can be told to fail or stall.
pub struct CountingProvider {
    pub loads: AtomicUsize,
    pub fail_loads: AtomicBool,
    /// Number of upcoming loads that panic instead of returning.
    pub panicking_loads: AtomicUsize,
    pub load_delay: Duration,
    pub requested: Mutex<Vec<(String, String)>>,
    pub classifier: Arc<ScriptedClassifier>,
}

impl CountingProvider {
    pub fn new(predictions: Vec<RawPrediction>) -> Self {
        Self::with_delays(predictions, Duration::ZERO, Duration::ZERO)
    }

    pub fn positive() -> Self {
        Self::new(vec![
            RawPrediction::new("POSITIVE", 0.957),
            RawPrediction::new("NEGATIVE", 0.043),
        ])
    }

    pub fn with_delays(
        predictions: Vec<RawPrediction>,
        load_delay: Duration,
        inference_delay: Duration,
    ) -> Self {
        Self {
            loads: AtomicUsize::new(0),
            fail_loads: AtomicBool::new(false),
            panicking_loads: AtomicUsize::new(0),
            load_delay,
            requested: Mutex::new(Vec::new()),
            classifier: Arc::new(ScriptedClassifier {
                predictions,
                fail: AtomicBool::new(false),
                delay: inference_delay,
                calls: AtomicUsize::new(0),
            }),
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn inference_count(&self) -> usize {
        self.classifier.calls.load(Ordering::SeqCst)
    }

    pub fn set_load_failure(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn panic_on_next_loads(&self, count: usize) {
        self.panicking_loads.store(count, Ordering::SeqCst);
    }

    pub fn set_inference_failure(&self, fail: bool) {
        self.classifier.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ModelProvider for CountingProvider {
    async fn load(&self, task: &str, model: &str) -> anyhow::Result<Arc<dyn TextClassifier>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.requested
            .lock()
            .unwrap()
            .push((task.to_string(), model.to_string()));
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        let should_panic = self
            .panicking_loads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_panic {
            panic!("simulated corrupt model file");
        }
        if self.fail_loads.load(Ordering::SeqCst) {
            anyhow::bail!("simulated network failure");
        }
        Ok(self.classifier.clone())
    }
}
