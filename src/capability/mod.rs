//! External capability contracts
//!
//! Everything the assistant depends on but does not implement lives behind
//! the traits in this module: the on-device AI surfaces (language model,
//! translator, summarizer, language detector), speech synthesis and
//! recognition, user notification, and page access. Hosts inject
//! implementations once at startup; the rest of the crate never probes the
//! platform again.

pub mod ai;
pub mod notify;
pub mod page;
pub mod speech;

pub use ai::{
    DetectedLanguage, LanguageDetector, LanguageModel, ProgressFn, PromptOptions, PromptSession,
    SessionConfig, SummarizerConfig, SummarizerProvider, SummarizerSession, SummaryFormat,
    SummaryKind, SummaryLength, TranslatorProvider, TranslatorSession,
};
pub use notify::{Notice, NoticeHandle, NoticeKind, Notifier};
pub use page::PageAccess;
pub use speech::{
    speech_completion, RecognitionEvent, SpeechCompletion, SpeechOutcome, SpeechRecognition,
    SpeechSignal, SpeechSynthesis,
};

use crate::{Result, VoxmateError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Readiness of an on-device model behind a capability
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    /// No model exists for this capability (or language pair)
    Unavailable,
    /// A model exists but must finish downloading first
    AfterDownload,
    /// The model is ready for use
    Available,
}

impl Availability {
    pub fn is_ready(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::Unavailable => write!(f, "unavailable"),
            Availability::AfterDownload => write!(f, "after-download"),
            Availability::Available => write!(f, "available"),
        }
    }
}

/// Bounded availability-polling schedule
///
/// A fixed deadline with a fixed probe interval. Exceeding the deadline is
/// an expected failure path, reported as a typed error rather than a panic
/// or an unsettled future.
#[derive(Clone, Copy, Debug)]
pub struct PollPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            interval: Duration::from_millis(500),
        }
    }
}

impl PollPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Poll a capability until its model is ready or the deadline passes.
///
/// `what` names the capability in errors and logs. On timeout the error
/// distinguishes a model that is still downloading from one that simply
/// never became ready, since user messaging differs.
pub async fn wait_until_ready<F, Fut>(
    mut probe: F,
    policy: &PollPolicy,
    what: &str,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Availability>>,
{
    let deadline = Instant::now() + policy.timeout;
    let mut last = Availability::Unavailable;

    loop {
        last = probe().await?;
        if last.is_ready() {
            return Ok(());
        }
        debug!("{} not ready yet: {}", what, last);

        if Instant::now() + policy.interval > deadline {
            break;
        }
        sleep(policy.interval).await;
    }

    match last {
        Availability::AfterDownload => Err(VoxmateError::ModelDownloading(what.to_string())),
        _ => Err(VoxmateError::ModelNotReady(what.to_string())),
    }
}

/// The resolved set of AI capabilities
///
/// Built exactly once at startup. The language model in particular may be
/// exposed through more than one binding depending on browser generation;
/// resolution picks the first candidate offered and call sites only ever
/// see the one normalized handle (or a definitive unavailable error).
#[derive(Clone, Default)]
pub struct Capabilities {
    language_model: Option<Arc<dyn LanguageModel>>,
    translator: Option<Arc<dyn TranslatorProvider>>,
    summarizer: Option<Arc<dyn SummarizerProvider>>,
    detector: Option<Arc<dyn LanguageDetector>>,
}

impl Capabilities {
    pub fn resolve() -> CapabilitiesBuilder {
        CapabilitiesBuilder::default()
    }

    pub fn language_model(&self) -> Result<Arc<dyn LanguageModel>> {
        self.language_model
            .clone()
            .ok_or_else(|| VoxmateError::CapabilityUnavailable("language model".to_string()))
    }

    pub fn translator(&self) -> Result<Arc<dyn TranslatorProvider>> {
        self.translator
            .clone()
            .ok_or_else(|| VoxmateError::CapabilityUnavailable("translator".to_string()))
    }

    pub fn summarizer(&self) -> Result<Arc<dyn SummarizerProvider>> {
        self.summarizer
            .clone()
            .ok_or_else(|| VoxmateError::CapabilityUnavailable("summarizer".to_string()))
    }

    pub fn detector(&self) -> Result<Arc<dyn LanguageDetector>> {
        self.detector
            .clone()
            .ok_or_else(|| VoxmateError::CapabilityUnavailable("language detector".to_string()))
    }

    pub fn has_language_model(&self) -> bool {
        self.language_model.is_some()
    }
}

/// Startup-time capability resolution
#[derive(Default)]
pub struct CapabilitiesBuilder {
    resolved: Capabilities,
    model_binding: Option<&'static str>,
}

impl CapabilitiesBuilder {
    /// Offer a candidate language-model binding. The first candidate wins;
    /// later ones are ignored (logged for diagnostics).
    pub fn language_model_candidate(
        mut self,
        binding: &'static str,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        match self.model_binding {
            None => {
                info!("language model resolved via {}", binding);
                self.model_binding = Some(binding);
                self.resolved.language_model = Some(model);
            }
            Some(active) => {
                debug!("ignoring language model binding {} ({} already resolved)", binding, active);
            }
        }
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn TranslatorProvider>) -> Self {
        self.resolved.translator = Some(translator);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn SummarizerProvider>) -> Self {
        self.resolved.summarizer = Some(summarizer);
        self
    }

    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.resolved.detector = Some(detector);
        self
    }

    pub fn finish(self) -> Capabilities {
        if self.model_binding.is_none() {
            info!("no language model binding available");
        }
        self.resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubModel;

    #[async_trait]
    impl LanguageModel for StubModel {
        async fn availability(&self) -> Result<Availability> {
            Ok(Availability::Available)
        }

        async fn create_session(&self, _config: SessionConfig) -> Result<Box<dyn PromptSession>> {
            Err(VoxmateError::PromptFailed("stub".into()))
        }
    }

    #[test]
    fn test_availability_readiness() {
        assert!(Availability::Available.is_ready());
        assert!(!Availability::AfterDownload.is_ready());
        assert!(!Availability::Unavailable.is_ready());
    }

    #[test]
    fn test_poll_policy_builder() {
        let policy = PollPolicy::new()
            .with_timeout(Duration::from_secs(3))
            .with_interval(Duration::from_millis(100));
        assert_eq!(policy.timeout, Duration::from_secs(3));
        assert_eq!(policy.interval, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_wait_until_ready_immediate() {
        let result = wait_until_ready(
            || async { Ok(Availability::Available) },
            &PollPolicy::default(),
            "model",
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready_becomes_ready_after_polls() {
        let calls = AtomicUsize::new(0);
        let result = wait_until_ready(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 3 {
                        Ok(Availability::AfterDownload)
                    } else {
                        Ok(Availability::Available)
                    }
                }
            },
            &PollPolicy::default(),
            "model",
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready_times_out_while_downloading() {
        let started = Instant::now();
        let result = wait_until_ready(
            || async { Ok(Availability::AfterDownload) },
            &PollPolicy::default(),
            "model",
        )
        .await;
        assert_eq!(
            result,
            Err(VoxmateError::ModelDownloading("model".to_string()))
        );
        // Settles within the timeout window plus one interval, never hangs.
        assert!(started.elapsed() <= Duration::from_millis(10_500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready_times_out_unavailable() {
        let result = wait_until_ready(
            || async { Ok(Availability::Unavailable) },
            &PollPolicy::default(),
            "model",
        )
        .await;
        assert_eq!(result, Err(VoxmateError::ModelNotReady("model".to_string())));
    }

    #[test]
    fn test_capabilities_first_model_binding_wins() {
        let first: Arc<dyn LanguageModel> = Arc::new(StubModel);
        let second: Arc<dyn LanguageModel> = Arc::new(StubModel);

        let caps = Capabilities::resolve()
            .language_model_candidate("window.ai.languageModel", Arc::clone(&first))
            .language_model_candidate("LanguageModel", second)
            .finish();

        assert!(caps.has_language_model());
        let resolved = caps.language_model().unwrap();
        assert!(Arc::ptr_eq(
            &resolved,
            &first
        ));
    }

    #[test]
    fn test_capabilities_missing_is_typed_unavailable() {
        let caps = Capabilities::resolve().finish();
        assert_eq!(
            caps.language_model().err(),
            Some(VoxmateError::CapabilityUnavailable(
                "language model".to_string()
            ))
        );
        assert_eq!(
            caps.translator().err(),
            Some(VoxmateError::CapabilityUnavailable("translator".to_string()))
        );
    }
}
