//! Speech synthesis and recognition contracts
//!
//! Speech output is monophonic: at most one active utterance, and starting
//! a new one interrupts whatever is playing. Completion is asynchronous and
//! per-utterance; the `speech_completion` primitive folds the platform's
//! end/error callback pair into a single outcome that settles exactly once.

use crate::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

/// Final outcome of one spoken utterance
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// The utterance played to the end
    Completed,
    /// The utterance was cancelled before finishing
    Cancelled,
    /// The platform reported an error
    Error(String),
}

/// Speech synthesis capability
#[async_trait]
pub trait SpeechSynthesis: Send + Sync {
    /// Speak `text` in `lang`, suspending until the utterance settles.
    /// Resolves exactly once: completed, cancelled, or errored.
    async fn speak(&self, text: &str, lang: &str) -> SpeechOutcome;

    /// Best-effort cancellation of the active utterance. Fire-and-forget;
    /// does not wait for confirmation.
    fn cancel(&self);
}

/// Settle-once sender half of a speech completion
///
/// Platform callbacks for one utterance can in principle fire more than
/// once (an error event after cancellation, for instance). Only the first
/// `settle` call wins; later calls are ignored and logged.
pub struct SpeechSignal {
    tx: Mutex<Option<oneshot::Sender<SpeechOutcome>>>,
}

impl SpeechSignal {
    /// Settle the utterance with `outcome`. Returns false if it already
    /// settled.
    pub fn settle(&self, outcome: SpeechOutcome) -> bool {
        match self.tx.lock().take() {
            Some(tx) => tx.send(outcome).is_ok(),
            None => {
                warn!("speech completion settled more than once; ignoring");
                false
            }
        }
    }
}

/// Awaitable receiver half of a speech completion
pub struct SpeechCompletion {
    rx: oneshot::Receiver<SpeechOutcome>,
}

impl SpeechCompletion {
    /// Wait for the utterance to settle. A dropped signal (platform torn
    /// down mid-utterance) counts as an error outcome, never a hang.
    pub async fn wait(self) -> SpeechOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => SpeechOutcome::Error("completion signal dropped".to_string()),
        }
    }
}

/// Create a linked (signal, completion) pair for one utterance.
pub fn speech_completion() -> (SpeechSignal, SpeechCompletion) {
    let (tx, rx) = oneshot::channel();
    (
        SpeechSignal {
            tx: Mutex::new(Some(tx)),
        },
        SpeechCompletion { rx },
    )
}

/// Events delivered by the recognition capability
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// One final transcript
    Transcript(String),
    /// Recognition ended (expected after `stop`, unexpected otherwise)
    Ended,
    /// Recognition error
    Error(String),
}

/// Continuous speech recognition capability
///
/// Delivers final transcripts one at a time on the supplied channel. The
/// capability serializes its own events; ordering on the channel matches
/// recognition order.
pub trait SpeechRecognition: Send + Sync {
    /// Start continuous recognition in `locale`, delivering events to
    /// `events` until stopped or the engine ends on its own.
    fn start(&self, locale: &str, events: mpsc::Sender<RecognitionEvent>) -> Result<()>;

    /// Stop recognition. The capability sends a final `Ended` event.
    fn stop(&self);
}
