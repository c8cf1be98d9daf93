use std::fmt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use super::builder::SessionBuilder;
use super::config::SessionConfig;
use super::error::SessionError;
use super::formatter::{FormattedResult, ResultFormatter};
use super::provider::{top_prediction, ModelProvider, TextClassifier};
use super::{SessionInfo, SessionState};

type ModelHandle = Arc<dyn TextClassifier>;
type LoadResult = Result<ModelHandle, SessionError>;
type LoadFuture = Shared<BoxFuture<'static, LoadResult>>;

enum ModelSlot {
    Unloaded,
    Loading { generation: u64, load: LoadFuture },
    Ready(ModelHandle),
}

struct SlotState {
    model: ModelSlot,
    /// Incremented for every load started; stale waiters compare against it.
    generation: u64,
}

/// Owns one lazily loaded model and serves classification requests against it.
///
/// The first request (or [`preload`](Self::preload)) asks the provider for the
/// model. Requests arriving while that load is in flight wait on the same
/// load instead of starting another one. A failed load leaves the session
/// unloaded so the next request retries; a failed inference leaves the loaded
/// model in place.
///
/// # Thread Safety
///
/// `ClassifierSession` is `Send + Sync` and can be shared through `Arc`.
/// The internal lock is never held across an await point.
///
/// ```no_run
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// use std::sync::Arc;
/// use sentiment_session::{ClassifierSession, OnnxProvider};
///
/// let session = ClassifierSession::builder()
///     .with_provider(Arc::new(OnnxProvider::new_default()?))
///     .build()?;
///
/// let result = session.classify("I love this!").await?;
/// println!("{}", result);
/// # Ok(())
/// # }
/// ```
pub struct ClassifierSession {
    config: SessionConfig,
    provider: Arc<dyn ModelProvider>,
    formatter: ResultFormatter,
    slot: Mutex<SlotState>,
    in_flight: AtomicUsize,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ClassifierSession>();
    }
};

impl fmt::Debug for ClassifierSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierSession")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ClassifierSession {
    /// Creates a new SessionBuilder for fluent construction
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Creates a session for the default task and model
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self::from_parts(SessionConfig::default(), provider, ResultFormatter::default())
    }

    pub(crate) fn from_parts(
        config: SessionConfig,
        provider: Arc<dyn ModelProvider>,
        formatter: ResultFormatter,
    ) -> Self {
        Self {
            config,
            provider,
            formatter,
            slot: Mutex::new(SlotState {
                model: ModelSlot::Unloaded,
                generation: 0,
            }),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn formatter(&self) -> &ResultFormatter {
        &self.formatter
    }

    /// Returns the current lifecycle state
    pub fn state(&self) -> SessionState {
        match &self.lock_slot().model {
            ModelSlot::Unloaded => SessionState::Unloaded,
            ModelSlot::Loading { .. } => SessionState::Loading,
            ModelSlot::Ready(_) if self.in_flight.load(Ordering::Acquire) > 0 => SessionState::Busy,
            ModelSlot::Ready(_) => SessionState::Ready,
        }
    }

    /// Returns information about the session's configuration and state
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            task: self.config.task.clone(),
            model: self.config.model.clone(),
            state: self.state(),
        }
    }

    /// Classifies `text` and formats the highest-confidence prediction.
    ///
    /// # Errors
    /// - `InvalidInput` if `text` is empty or whitespace; the provider is not touched
    /// - `ModelLoad` if the model could not be loaded; the next call retries the load
    /// - `Inference` if the loaded model failed; the model stays loaded
    pub async fn classify(&self, text: &str) -> Result<FormattedResult, SessionError> {
        self.run(text, None).await
    }

    /// Like [`classify`](Self::classify), but gives up with `Cancelled` as soon
    /// as `cancel` fires, either while waiting for the model or during inference.
    ///
    /// Cancelling one caller does not abort a load other callers are waiting on.
    pub async fn classify_with_cancel(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<FormattedResult, SessionError> {
        self.run(text, Some(cancel)).await
    }

    /// Loads the model without classifying anything
    pub async fn preload(&self) -> Result<(), SessionError> {
        self.acquire(None).await.map(|_| ())
    }

    pub async fn preload_with_cancel(&self, cancel: &CancellationToken) -> Result<(), SessionError> {
        self.acquire(Some(cancel)).await.map(|_| ())
    }

    async fn run(
        &self,
        text: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<FormattedResult, SessionError> {
        validate_input(text)?;

        let handle = self.acquire(cancel).await?;
        let _busy = BusyGuard::enter(&self.in_flight);

        let predictions = with_cancel(handle.classify(text), cancel)
            .await?
            .map_err(|e| {
                warn!("Inference failed: {:#}", e);
                SessionError::inference(format!("{:#}", e))
            })?;

        let top = top_prediction(predictions)
            .ok_or_else(|| SessionError::Inference("Model returned no predictions".into()))?;
        debug!("Top prediction: {} ({:.4})", top.label, top.score);

        Ok(self.formatter.format(&top))
    }

    /// Returns the loaded model, starting or joining a load as needed.
    async fn acquire(&self, cancel: Option<&CancellationToken>) -> LoadResult {
        let (generation, load) = {
            let mut slot = self.lock_slot();
            let pending = match &slot.model {
                ModelSlot::Ready(handle) => return Ok(Arc::clone(handle)),
                ModelSlot::Loading { generation, load } => Some((*generation, load.clone())),
                ModelSlot::Unloaded => None,
            };

            match pending {
                Some(pending) => {
                    debug!("Joining in-flight load (generation {})", pending.0);
                    pending
                }
                None => {
                    slot.generation += 1;
                    let generation = slot.generation;
                    let load = self.start_load();
                    slot.model = ModelSlot::Loading {
                        generation,
                        load: load.clone(),
                    };
                    debug!("Session state: Unloaded -> Loading (generation {})", generation);
                    (generation, load)
                }
            }
        };

        let outcome = with_cancel(load, cancel).await?;
        self.finish_load(generation, &outcome);
        outcome
    }

    fn start_load(&self) -> LoadFuture {
        let provider = Arc::clone(&self.provider);
        let task = self.config.task.clone();
        let model = self.config.model.clone();

        async move {
            info!("Loading model '{}' for task '{}'", model, task);
            let started = Instant::now();
            // A panic must not poison the shared future; it becomes a failed load
            match AssertUnwindSafe(provider.load(&task, &model))
                .catch_unwind()
                .await
            {
                Ok(Ok(handle)) => {
                    info!("Model '{}' ready (took {:.2?})", model, started.elapsed());
                    Ok(handle)
                }
                Ok(Err(e)) => {
                    warn!("Failed to load model '{}': {:#}", model, e);
                    Err(SessionError::model_load(format!("{:#}", e)))
                }
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    error!("Provider panicked while loading '{}': {}", model, reason);
                    Err(SessionError::model_load(format!(
                        "provider panicked while loading '{}': {}",
                        model, reason
                    )))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Publishes the outcome of load `generation`, unless a newer load replaced it.
    fn finish_load(&self, generation: u64, outcome: &LoadResult) {
        let mut slot = self.lock_slot();
        let is_current = matches!(
            &slot.model,
            ModelSlot::Loading { generation: current, .. } if *current == generation
        );
        if !is_current {
            return;
        }

        slot.model = match outcome {
            Ok(handle) => {
                debug!("Session state: Loading -> Ready (generation {})", generation);
                ModelSlot::Ready(Arc::clone(handle))
            }
            Err(_) => {
                debug!("Session state: Loading -> Unloaded (generation {})", generation);
                ModelSlot::Unloaded
            }
        };
    }

    fn lock_slot(&self) -> MutexGuard<'_, SlotState> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate_input(text: &str) -> Result<(), SessionError> {
    if text.trim().is_empty() {
        return Err(SessionError::InvalidInput("Input text cannot be empty".into()));
    }
    Ok(())
}

/// Awaits `fut`, or returns `Cancelled` first if the token fires.
async fn with_cancel<F: Future>(
    fut: F,
    cancel: Option<&CancellationToken>,
) -> Result<F::Output, SessionError> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => {
                warn!("Session operation cancelled");
                Err(SessionError::Cancelled)
            }
            output = fut => Ok(output),
        },
        None => Ok(fut.await),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Counts an inference as in flight for as long as it lives.
struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::provider::RawPrediction;
    use async_trait::async_trait;

    struct Fixed;

    #[async_trait]
    impl TextClassifier for Fixed {
        async fn classify(&self, _text: &str) -> anyhow::Result<Vec<RawPrediction>> {
            Ok(vec![RawPrediction::new("POSITIVE", 0.9)])
        }
    }

    struct FixedProvider;

    #[async_trait]
    impl ModelProvider for FixedProvider {
        async fn load(&self, _task: &str, _model: &str) -> anyhow::Result<ModelHandle> {
            Ok(Arc::new(Fixed))
        }
    }

    #[test]
    fn test_validate_input() {
        assert!(validate_input("hello").is_ok());
        assert!(matches!(validate_input(""), Err(SessionError::InvalidInput(_))));
        assert!(matches!(validate_input(" \t\n"), Err(SessionError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let session = ClassifierSession::new(Arc::new(FixedProvider));
        assert_eq!(session.state(), SessionState::Unloaded);

        session.preload().await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);

        let result = session.classify("great").await.unwrap();
        assert_eq!(result.percent, 90);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_stale_generation_is_ignored() {
        let session = ClassifierSession::new(Arc::new(FixedProvider));
        session.preload().await.unwrap();

        session.finish_load(0, &Err(SessionError::ModelLoad("stale".into())));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bad weights")), "bad weights");
        assert_eq!(panic_message(&42_u8), "unknown panic");
    }

    #[test]
    fn test_busy_guard_counts() {
        let counter = AtomicUsize::new(0);
        {
            let _a = BusyGuard::enter(&counter);
            let _b = BusyGuard::enter(&counter);
            assert_eq!(counter.load(Ordering::Acquire), 2);
        }
        assert_eq!(counter.load(Ordering::Acquire), 0);
    }
}
