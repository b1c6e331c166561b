//! Voice mode controller
//!
//! Owns the speech-recognition lifecycle: starting it in the user's
//! recognition locale, restarting on unexpected end, and feeding final
//! transcripts through the resolver into the dispatcher. Transcripts queue
//! on the event channel and are processed strictly one at a time -- a new
//! utterance never runs until the previous one's commands (including any
//! in-flight model round trips) have completed.

use crate::capability::{Notice, Notifier, RecognitionEvent, SpeechRecognition};
use crate::command::{CommandResolver, Utterance};
use crate::dispatch::CommandDispatcher;
use crate::language;
use crate::settings::SettingsStore;
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Buffer for queued recognition events while an utterance is processed
const EVENT_QUEUE_SIZE: usize = 16;

/// How long the "Heard: ..." notice stays up
const HEARD_NOTICE_MS: u64 = 3_000;

struct VoiceShared {
    recognition: Arc<dyn SpeechRecognition>,
    resolver: Arc<CommandResolver>,
    dispatcher: Arc<CommandDispatcher>,
    notifier: Arc<dyn Notifier>,
    settings: SettingsStore,
    active: AtomicBool,
}

/// Voice-mode singleton for one page context
#[derive(Clone)]
pub struct VoiceController {
    shared: Arc<VoiceShared>,
}

impl VoiceController {
    pub fn new(
        recognition: Arc<dyn SpeechRecognition>,
        resolver: Arc<CommandResolver>,
        dispatcher: Arc<CommandDispatcher>,
        notifier: Arc<dyn Notifier>,
        settings: SettingsStore,
    ) -> Self {
        Self {
            shared: Arc::new(VoiceShared {
                recognition,
                resolver,
                dispatcher,
                notifier,
                settings,
                active: AtomicBool::new(false),
            }),
        }
    }

    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Flip voice mode; returns whether it is enabled afterwards.
    pub async fn toggle(&self) -> Result<bool> {
        if self.is_active() {
            self.stop().await?;
            Ok(false)
        } else {
            self.start().await?;
            Ok(true)
        }
    }

    /// Start continuous recognition in the user's locale.
    pub async fn start(&self) -> Result<()> {
        if self.shared.active.swap(true, Ordering::SeqCst) {
            debug!("voice mode already active");
            return Ok(());
        }

        let lang = self.shared.settings.user_language().await;
        let locale = language::recognition_locale(&lang).to_string();

        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_SIZE);
        if let Err(e) = self.shared.recognition.start(&locale, events_tx.clone()) {
            self.shared.active.store(false, Ordering::SeqCst);
            return Err(e);
        }

        self.shared.settings.set_voice_mode(true).await?;
        info!("voice recognition started (locale: {})", locale);

        let shared = Arc::clone(&self.shared);
        tokio::spawn(listen(shared, events_rx, events_tx, locale));
        Ok(())
    }

    /// Stop recognition and leave voice mode.
    pub async fn stop(&self) -> Result<()> {
        if !self.shared.active.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.shared.recognition.stop();
        self.shared.settings.set_voice_mode(false).await?;
        info!("voice recognition stopped");
        Ok(())
    }
}

/// Recognition event pump for one voice-mode session.
///
/// Transcripts are handled to completion before the next event is taken
/// off the channel, so overlapping utterances queue FIFO instead of racing.
async fn listen(
    shared: Arc<VoiceShared>,
    mut events: mpsc::Receiver<RecognitionEvent>,
    events_tx: mpsc::Sender<RecognitionEvent>,
    locale: String,
) {
    while let Some(event) = events.recv().await {
        match event {
            RecognitionEvent::Transcript(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    continue;
                }
                info!("voice command: {}", text);
                shared.notifier.show(
                    Notice::info("Voice Command", format!("Heard: \"{}\"", text))
                        .with_duration_ms(HEARD_NOTICE_MS),
                );

                let lang = shared.settings.user_language().await;
                let utterance = Utterance::new(text, lang);
                let commands = shared
                    .resolver
                    .resolve(&utterance.text, &utterance.language)
                    .await;
                shared.dispatcher.dispatch_all(&commands, true).await;
            }

            RecognitionEvent::Ended => {
                if !shared.active.load(Ordering::SeqCst) {
                    break;
                }
                // The engine ends on its own from time to time; keep it
                // alive while voice mode is on.
                warn!("recognition ended unexpectedly, restarting");
                if let Err(e) = shared.recognition.start(&locale, events_tx.clone()) {
                    error!("recognition restart failed: {}", e);
                    shared.active.store(false, Ordering::SeqCst);
                    break;
                }
            }

            RecognitionEvent::Error(e) => {
                error!("recognition error: {}", e);
            }
        }
    }
    debug!("voice event pump exited");
}
