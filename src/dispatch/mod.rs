//! Command dispatcher
//!
//! Maps resolved commands onto the reading engine and broker operations.
//! Stateless beyond its collaborators: every outcome is delivered to the
//! user through the notifier, and answers are spoken aloud when the command
//! arrived by voice. Failures never propagate past a single command.

use crate::broker::BrokerHandle;
use crate::capability::{Notice, Notifier, PageAccess, SpeechOutcome, SpeechSynthesis};
use crate::command::{Command, CommandKind};
use crate::language;
use crate::reading::ReadingEngine;
use crate::settings::SettingsStore;
use crate::VoxmateError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Character cap applied to page text sent for translation
pub const TRANSLATE_TEXT_LIMIT: usize = 20_000;

pub struct CommandDispatcher {
    reading: ReadingEngine,
    broker: BrokerHandle,
    page: Arc<dyn PageAccess>,
    speech: Arc<dyn SpeechSynthesis>,
    notifier: Arc<dyn Notifier>,
    settings: SettingsStore,
}

impl CommandDispatcher {
    pub fn new(
        reading: ReadingEngine,
        broker: BrokerHandle,
        page: Arc<dyn PageAccess>,
        speech: Arc<dyn SpeechSynthesis>,
        notifier: Arc<dyn Notifier>,
        settings: SettingsStore,
    ) -> Self {
        Self {
            reading,
            broker,
            page,
            speech,
            notifier,
            settings,
        }
    }

    pub fn reading(&self) -> &ReadingEngine {
        &self.reading
    }

    /// Execute resolved commands in list order, each to completion.
    ///
    /// `spoken` marks commands that arrived by voice; their answers are
    /// also spoken aloud.
    pub async fn dispatch_all(&self, commands: &[Command], spoken: bool) {
        for command in commands {
            self.dispatch(command, spoken).await;
        }
    }

    pub async fn dispatch(&self, command: &Command, spoken: bool) {
        debug!("executing command: {}", command.kind);
        match command.kind {
            CommandKind::Read => {
                if let Err(e) = self.reading.start() {
                    warn!("read failed: {}", e);
                    self.notifier.show(Notice::warning("Reading", e.user_message()));
                }
            }
            CommandKind::Pause => self.reading.pause(),
            CommandKind::Stop => self.reading.stop(),
            CommandKind::Translate => self.translate_page().await,
            CommandKind::ShowCommands => self.show_commands(spoken).await,
            CommandKind::Summarise => self.summarise_page(spoken).await,
            CommandKind::Ask => self.ask(command.question_or_raw(), spoken).await,
            CommandKind::Unknown => {
                debug!("unknown command ignored: {:?}", command.raw);
            }
        }
    }

    async fn translate_page(&self) {
        let loading = self.notifier.show(Notice::loading(
            "Translation",
            "Translating page content...",
        ));

        let text = self.page.page_text(TRANSLATE_TEXT_LIMIT);
        let result = self.broker.translate_page(text).await;
        self.notifier.dismiss(loading);

        match result {
            Ok(translated) => {
                self.page.apply_translation(&translated);
                self.notifier.show(Notice::success(
                    "Translation Complete",
                    "Page translation completed successfully!",
                ));
            }
            Err(e) => {
                warn!("translation failed: {}", e);
                self.notifier
                    .show(Notice::error("Translation Error", e.user_message()));
            }
        }
    }

    async fn ask(&self, question: &str, spoken: bool) {
        info!("user asked: {}", question);
        let loading = self.notifier.show(Notice::loading(
            "Asking",
            "Analyzing page content and finding the best answer...",
        ));

        let result = self.broker.ask(question).await;
        self.notifier.dismiss(loading);

        match result {
            Ok(answer) => {
                let answer = answer.trim();
                let answer = if answer.is_empty() {
                    "No clear answer found in the page content."
                } else {
                    answer
                };
                self.notifier.show(Notice::info(
                    "Answer",
                    format!("Q: {}\nA: {}", question, answer),
                ));
                if spoken {
                    self.speak(answer).await;
                }
            }
            Err(e @ VoxmateError::ChannelError(_)) => {
                warn!("ask failed: {}", e);
                self.notifier
                    .show(Notice::error("Service Unavailable", e.user_message()));
            }
            Err(e) => {
                warn!("ask failed: {}", e);
                self.notifier
                    .show(Notice::warning("Answer Not Found", e.user_message()));
            }
        }
    }

    async fn summarise_page(&self, spoken: bool) {
        let text = self.page.page_text(usize::MAX);
        if text.trim().is_empty() {
            self.notifier.show(Notice::warning(
                "No Content",
                "No readable text found on this page to summarize.",
            ));
            return;
        }

        let loading = self.notifier.show(Notice::loading(
            "Generating Summary",
            "Reading page content and generating concise summary...",
        ));

        let result = self.broker.summarize(text).await;
        self.notifier.dismiss(loading);

        match result {
            Ok(summary) => {
                self.notifier.show(Notice::info("Page Summary", summary.clone()));
                if spoken {
                    self.speak(&summary).await;
                }
            }
            Err(e) => {
                warn!("summarise failed: {}", e);
                self.notifier
                    .show(Notice::error("Summary Failed", e.user_message()));
            }
        }
    }

    async fn show_commands(&self, spoken: bool) {
        let lang = self.settings.user_language().await;
        let text = language::commands_text(&lang);
        self.notifier
            .show(Notice::info(text.title, text.body()));
        if spoken {
            self.speak(&text.spoken()).await;
        }
    }

    /// Speak text on the monophonic output channel, interrupting whatever
    /// is currently playing.
    async fn speak(&self, text: &str) {
        self.speech.cancel();
        let lang = self.settings.user_language().await;
        match self.speech.speak(text, &lang).await {
            SpeechOutcome::Completed => {}
            SpeechOutcome::Cancelled => debug!("spoken answer interrupted"),
            SpeechOutcome::Error(e) => warn!("speaking failed: {}", e),
        }
    }
}
