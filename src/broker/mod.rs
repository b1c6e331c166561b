//! Cross-context request broker
//!
//! Page-side callers talk to the background coordinator through a single
//! round-trip contract: one request in, exactly one typed result out. The
//! coordinator performs whatever multi-step work the operation needs --
//! availability polling, fetching page text, model session creation --
//! behind that one opaque exchange. Transport failures are synthesized into
//! channel-error results; a request is never left unanswered.
//!
//! Operations that need an on-device model poll readiness on the shared
//! bounded schedule and fail with a typed reason (not ready, downloading,
//! unavailable, prompt failed) so callers can word their messaging.

use crate::capability::{
    wait_until_ready, Availability, Capabilities, PageAccess, PollPolicy, ProgressFn,
    PromptOptions, SessionConfig, TranslatorSession,
};
use crate::command::{ClassifyCommand, Command, CommandClassifier};
use crate::language;
use crate::settings::SettingsStore;
use crate::{Result, VoxmateError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Character cap applied to page text fetched for Q&A prompts
pub const ASK_PAGE_TEXT_LIMIT: usize = 8_000;

/// One logical operation crossing the context boundary
#[derive(Clone, Debug)]
pub enum Request {
    /// Translate page text into the target language (user language when
    /// unset), detecting the source language first
    TranslatePage {
        text: String,
        target: Option<String>,
    },
    /// Answer a question from the current page's content
    Ask { question: String },
    /// Summarize the given page text
    Summarize { text: String },
    /// Classify raw input into a command
    Classify { text: String, language: String },
    /// Probe language-model readiness
    CheckModel,
}

impl Request {
    fn name(&self) -> &'static str {
        match self {
            Request::TranslatePage { .. } => "translate_page",
            Request::Ask { .. } => "ask",
            Request::Summarize { .. } => "summarize",
            Request::Classify { .. } => "classify",
            Request::CheckModel => "check_model",
        }
    }
}

/// Successful result of an exchange
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Translated(String),
    Answer(String),
    Summary(String),
    Command(Command),
    ModelStatus(Availability),
}

/// Broker configuration
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    /// Availability-polling schedule for model-backed operations
    pub poll: PollPolicy,
    /// Capacity of the request channel
    pub channel_capacity: usize,
    /// Page-text cap for Q&A prompts
    pub ask_text_limit: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            channel_capacity: 32,
            ask_text_limit: ASK_PAGE_TEXT_LIMIT,
        }
    }
}

impl BrokerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_ask_text_limit(mut self, limit: usize) -> Self {
        self.ask_text_limit = limit;
        self
    }
}

struct Exchange {
    id: Uuid,
    request: Request,
    respond: oneshot::Sender<Result<Reply>>,
}

/// Caller-side handle: one `send` is one settled round trip
#[derive(Clone)]
pub struct BrokerHandle {
    tx: mpsc::Sender<Exchange>,
}

impl BrokerHandle {
    /// Send a request and await its single response.
    ///
    /// A torn-down coordinator resolves to a channel error rather than a
    /// pending-forever future.
    pub async fn send(&self, request: Request) -> Result<Reply> {
        let id = Uuid::new_v4();
        let name = request.name();
        debug!("request {} -> {}", id, name);

        let (respond, response) = oneshot::channel();
        if self
            .tx
            .send(Exchange {
                id,
                request,
                respond,
            })
            .await
            .is_err()
        {
            warn!("request {} failed: no coordinator", id);
            return Err(VoxmateError::ChannelError("no coordinator for request".into()));
        }

        match response.await {
            Ok(result) => result,
            Err(_) => Err(VoxmateError::ChannelError(
                "coordinator dropped the response".into(),
            )),
        }
    }

    pub async fn translate_page(&self, text: impl Into<String>) -> Result<String> {
        match self
            .send(Request::TranslatePage {
                text: text.into(),
                target: None,
            })
            .await?
        {
            Reply::Translated(text) => Ok(text),
            other => Err(unexpected_reply("translate_page", &other)),
        }
    }

    pub async fn ask(&self, question: impl Into<String>) -> Result<String> {
        match self
            .send(Request::Ask {
                question: question.into(),
            })
            .await?
        {
            Reply::Answer(answer) => Ok(answer),
            other => Err(unexpected_reply("ask", &other)),
        }
    }

    pub async fn summarize(&self, text: impl Into<String>) -> Result<String> {
        match self.send(Request::Summarize { text: text.into() }).await? {
            Reply::Summary(summary) => Ok(summary),
            other => Err(unexpected_reply("summarize", &other)),
        }
    }

    pub async fn check_model(&self) -> Result<Availability> {
        match self.send(Request::CheckModel).await? {
            Reply::ModelStatus(status) => Ok(status),
            other => Err(unexpected_reply("check_model", &other)),
        }
    }
}

fn unexpected_reply(operation: &str, reply: &Reply) -> VoxmateError {
    VoxmateError::ChannelError(format!("unexpected reply for {}: {:?}", operation, reply))
}

#[async_trait]
impl ClassifyCommand for BrokerHandle {
    async fn classify(&self, raw: &str, lang: &str) -> Result<Command> {
        match self
            .send(Request::Classify {
                text: raw.to_string(),
                language: lang.to_string(),
            })
            .await?
        {
            Reply::Command(command) => Ok(command),
            other => Err(VoxmateError::ClassificationFailed(format!(
                "unexpected reply: {:?}",
                other
            ))),
        }
    }
}

/// Cached translator, reused only while the language pair matches
struct TranslatorHandle {
    source: String,
    target: String,
    session: Box<dyn TranslatorSession>,
}

/// The background coordinator
pub struct Broker {
    config: BrokerConfig,
    capabilities: Capabilities,
    page: Arc<dyn PageAccess>,
    settings: SettingsStore,
    classifier: Option<CommandClassifier>,
    translator_cache: Option<TranslatorHandle>,
    rx: mpsc::Receiver<Exchange>,
}

impl Broker {
    pub fn new(
        capabilities: Capabilities,
        page: Arc<dyn PageAccess>,
        settings: SettingsStore,
        config: BrokerConfig,
    ) -> (Self, BrokerHandle) {
        let (tx, rx) = mpsc::channel(config.channel_capacity);

        let classifier = capabilities
            .language_model()
            .ok()
            .map(|model| CommandClassifier::new(model, config.poll));

        let broker = Self {
            config,
            capabilities,
            page,
            settings,
            classifier,
            translator_cache: None,
            rx,
        };

        (broker, BrokerHandle { tx })
    }

    /// Run the coordinator until every handle is dropped.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        info!("request broker running");
        while let Some(exchange) = self.rx.recv().await {
            let name = exchange.request.name();
            let result = self.handle(exchange.request).await;
            match &result {
                Ok(_) => debug!("request {} ({}) completed", exchange.id, name),
                Err(e) => debug!("request {} ({}) failed: {}", exchange.id, name, e),
            }
            // A dropped caller is fine; the exchange is still settled.
            let _ = exchange.respond.send(result);
        }
        info!("request broker stopped");
    }

    async fn handle(&mut self, request: Request) -> Result<Reply> {
        match request {
            Request::TranslatePage { text, target } => {
                let target = match target {
                    Some(code) => code,
                    None => self.settings.user_language().await,
                };
                self.translate(&text, &target).await.map(Reply::Translated)
            }
            Request::Ask { question } => self.ask(&question).await.map(Reply::Answer),
            Request::Summarize { text } => self.summarize(&text).await.map(Reply::Summary),
            Request::Classify { text, language } => {
                let classifier = self.classifier.as_ref().ok_or_else(|| {
                    VoxmateError::CapabilityUnavailable("language model".to_string())
                })?;
                classifier.classify(&text, &language).await.map(Reply::Command)
            }
            Request::CheckModel => {
                let model = self.capabilities.language_model()?;
                model.availability().await.map(Reply::ModelStatus)
            }
        }
    }

    async fn translate(&mut self, text: &str, target: &str) -> Result<String> {
        let detector = self.capabilities.detector()?;
        let detections = detector.detect(text).await?;
        let source = detections
            .first()
            .map(|d| d.language.clone())
            .unwrap_or_else(|| "en".to_string());

        // Same language: hand back the input untouched; no translator is
        // created and the cache is not consulted.
        if source == target {
            debug!("source language {} equals target, skipping translation", source);
            return Ok(text.to_string());
        }

        info!("translating {} -> {}", source, target);
        let translator = self.capabilities.translator()?;

        let cached = self
            .translator_cache
            .as_ref()
            .map(|h| h.source == source && h.target == target)
            .unwrap_or(false);

        if !cached {
            let availability = translator.availability(&source, target).await?;
            if availability == Availability::Unavailable {
                return Err(VoxmateError::TranslationUnavailable {
                    source,
                    target: target.to_string(),
                });
            }

            let progress: ProgressFn = Arc::new(|loaded: f64| {
                debug!("translator model download: {:.1}%", loaded * 100.0);
            });
            let session = translator
                .create_translator(&source, target, Some(progress))
                .await?;
            self.translator_cache = Some(TranslatorHandle {
                source: source.clone(),
                target: target.to_string(),
                session,
            });
        } else {
            debug!("reusing cached translator {} -> {}", source, target);
        }

        let handle = self.translator_cache.as_ref().ok_or_else(|| {
            VoxmateError::TranslationUnavailable {
                source: source.clone(),
                target: target.to_string(),
            }
        })?;
        handle.session.translate(text).await
    }

    async fn ask(&self, question: &str) -> Result<String> {
        let model = self.capabilities.language_model()?;

        let probe = Arc::clone(&model);
        wait_until_ready(
            move || {
                let model = Arc::clone(&probe);
                async move { model.availability().await }
            },
            &self.config.poll,
            "language model",
        )
        .await?;

        // Second hop: fetch the page excerpt from the page executor. The
        // caller sees only the one round trip.
        let page_text = self.page.page_text(self.config.ask_text_limit);
        let code = self.settings.user_language().await;
        let full_name = language::full_name(&code);

        let session = model
            .create_session(
                SessionConfig::new()
                    .with_input_languages(["en"])
                    .with_output_language("en"),
            )
            .await
            .map_err(|e| VoxmateError::PromptFailed(e.to_string()))?;

        let prompt = format!(
            "You are an assistant that answers questions about the current webpage content.\n\
             Use only the information available in the provided text.\n\
             If the answer is not found, respond with: \"I couldn't find that in this page.\"\n\
             Always answer in {}-{}.\n\n\
             Webpage content:\n\"\"\"{}\"\"\"\n\n\
             User question: \"{}\"\n\n\
             Respond clearly and concisely.",
            code, full_name, page_text, question
        );

        session
            .prompt(&prompt, PromptOptions::new().with_output_language("en"))
            .await
            .map_err(|e| VoxmateError::PromptFailed(e.to_string()))
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        // Whitespace-normalize before the length check and the model call.
        let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if cleaned.is_empty() {
            return Err(VoxmateError::NoReadableContent);
        }

        let provider = self.capabilities.summarizer()?;
        let availability = provider.availability().await?;
        if availability == Availability::Unavailable {
            return Err(VoxmateError::CapabilityUnavailable("summarizer".to_string()));
        }

        let lang = self.settings.user_language().await;
        let config = crate::capability::SummarizerConfig::new()
            .with_input_languages([lang.as_str(), "en"])
            .with_output_language(lang.as_str());

        let progress: ProgressFn = Arc::new(|loaded: f64| {
            debug!("summarizer model download: {:.0}%", loaded * 100.0);
        });
        let summarizer = provider
            .create_summarizer(config, Some(progress))
            .await
            .map_err(|e| VoxmateError::PromptFailed(e.to_string()))?;

        summarizer
            .summarize(
                &cleaned,
                "Summarizing page content for the user in a concise format.",
            )
            .await
            .map_err(|e| VoxmateError::PromptFailed(e.to_string()))
    }
}
