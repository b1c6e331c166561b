//! On-device AI capability traits
//!
//! These mirror the browser surfaces the assistant consumes: a prompt-able
//! language model with schema-constrained output, a pairwise translator, a
//! summarizer, and a language detector. Model downloads report progress
//! through an optional callback.

use super::Availability;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Download-progress callback (0.0 ..= 1.0)
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// Configuration for a language-model session
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    /// System instruction constraining the session's behavior
    pub system_instruction: Option<String>,
    /// Languages the session should expect as input
    pub expected_input_languages: Vec<String>,
    /// Languages the session may produce
    pub expected_output_languages: Vec<String>,
    /// Preferred output language
    pub output_language: Option<String>,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_input_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_input_languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        self.expected_output_languages = vec![language.clone()];
        self.output_language = Some(language);
        self
    }
}

/// Per-prompt options
#[derive(Clone, Debug, Default)]
pub struct PromptOptions {
    /// JSON schema constraining the response shape
    pub response_schema: Option<serde_json::Value>,
    /// Output language override for this prompt
    pub output_language: Option<String>,
}

impl PromptOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_output_language(mut self, language: impl Into<String>) -> Self {
        self.output_language = Some(language.into());
        self
    }
}

/// Prompt-able on-device language model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Current readiness of the underlying model.
    async fn availability(&self) -> Result<Availability>;

    /// Create a session. The capability may cache sessions internally;
    /// callers treat each returned session as independent.
    async fn create_session(&self, config: SessionConfig) -> Result<Box<dyn PromptSession>>;
}

/// A live language-model session
#[async_trait]
pub trait PromptSession: Send + Sync {
    /// Send one prompt and await the full response text.
    async fn prompt(&self, text: &str, options: PromptOptions) -> Result<String>;
}

/// Pairwise text translator
#[async_trait]
pub trait TranslatorProvider: Send + Sync {
    /// Readiness of the model for this language pair.
    async fn availability(&self, source: &str, target: &str) -> Result<Availability>;

    /// Create a translator for the pair. May trigger a model download;
    /// progress is reported through `progress` when supplied.
    async fn create_translator(
        &self,
        source: &str,
        target: &str,
        progress: Option<ProgressFn>,
    ) -> Result<Box<dyn TranslatorSession>>;
}

/// A live translator for one language pair
#[async_trait]
pub trait TranslatorSession: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String>;
}

/// Summary shape requested from the summarizer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryKind {
    #[default]
    KeyPoints,
    Tldr,
    Teaser,
    Headline,
}

impl SummaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryKind::KeyPoints => "key-points",
            SummaryKind::Tldr => "tldr",
            SummaryKind::Teaser => "teaser",
            SummaryKind::Headline => "headline",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryFormat {
    #[default]
    Markdown,
    PlainText,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

/// Configuration for a summarizer session
#[derive(Clone, Debug, Default)]
pub struct SummarizerConfig {
    pub kind: SummaryKind,
    pub format: SummaryFormat,
    pub length: SummaryLength,
    pub expected_input_languages: Vec<String>,
    pub output_language: Option<String>,
}

impl SummarizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_input_languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_language(mut self, language: impl Into<String>) -> Self {
        self.output_language = Some(language.into());
        self
    }
}

/// Page summarizer
#[async_trait]
pub trait SummarizerProvider: Send + Sync {
    async fn availability(&self) -> Result<Availability>;

    async fn create_summarizer(
        &self,
        config: SummarizerConfig,
        progress: Option<ProgressFn>,
    ) -> Result<Box<dyn SummarizerSession>>;
}

/// A live summarizer session
#[async_trait]
pub trait SummarizerSession: Send + Sync {
    /// Summarize `text`, with `context` describing what the summary is for.
    async fn summarize(&self, text: &str, context: &str) -> Result<String>;
}

/// One detection result, best match first in the returned list
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedLanguage {
    pub language: String,
    pub confidence: f64,
}

/// Text language detector
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// Detect the language of `text`, ordered by confidence.
    async fn detect(&self, text: &str) -> Result<Vec<DetectedLanguage>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_builder() {
        let config = SessionConfig::new()
            .with_system_instruction("be terse")
            .with_input_languages(["en", "es"])
            .with_output_language("en");

        assert_eq!(config.system_instruction.as_deref(), Some("be terse"));
        assert_eq!(config.expected_input_languages, vec!["en", "es"]);
        assert_eq!(config.expected_output_languages, vec!["en"]);
        assert_eq!(config.output_language.as_deref(), Some("en"));
    }

    #[test]
    fn test_prompt_options_builder() {
        let schema = serde_json::json!({"type": "object"});
        let options = PromptOptions::new()
            .with_response_schema(schema.clone())
            .with_output_language("en");

        assert_eq!(options.response_schema, Some(schema));
        assert_eq!(options.output_language.as_deref(), Some("en"));
    }

    #[test]
    fn test_summary_kind_wire_names() {
        assert_eq!(SummaryKind::KeyPoints.as_str(), "key-points");
        assert_eq!(SummaryKind::Tldr.as_str(), "tldr");
    }

    #[test]
    fn test_summarizer_config_defaults() {
        let config = SummarizerConfig::new();
        assert_eq!(config.kind, SummaryKind::KeyPoints);
        assert_eq!(config.format, SummaryFormat::Markdown);
        assert_eq!(config.length, SummaryLength::Medium);
    }
}
