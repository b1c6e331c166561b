//! VoxMate - voice-controlled page reader with on-device AI assistance
//!
//! This crate implements the core of a page-reading assistant: spoken or
//! typed input is resolved into a small closed set of commands, which drive
//! a segment-by-segment reading engine and a background broker for
//! translation, page Q&A and summarisation. All platform capabilities
//! (speech synthesis/recognition, the on-device language model, translator,
//! summarizer, storage, notifications) are consumed through traits and
//! injected by the host.

pub mod broker;
pub mod capability;
pub mod command;
pub mod dispatch;
pub mod language;
pub mod logging;
pub mod reading;
pub mod settings;
pub mod voice;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoxmateError {
    /// A required platform capability is missing entirely
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// The capability exists but its model never became ready in time
    #[error("Model not ready: {0}")]
    ModelNotReady(String),

    /// The capability exists and its model is still downloading
    #[error("Model downloading: {0}")]
    ModelDownloading(String),

    /// A prompt/translate/summarize call to a ready model failed
    #[error("Prompt failed: {0}")]
    PromptFailed(String),

    /// The command classifier could not produce a verdict
    #[error("Classification failed: {0}")]
    ClassificationFailed(String),

    /// The page has no text eligible for reading
    #[error("No readable content on this page")]
    NoReadableContent,

    /// Cross-context message delivery failed
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// No translation model exists for a language pair
    #[error("No translation model for {source} -> {target}")]
    TranslationUnavailable { source: String, target: String },

    /// Speech synthesis or recognition error
    #[error("Speech error: {0}")]
    SpeechError(String),

    /// Preference storage error
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl VoxmateError {
    /// Check if this error is recoverable
    ///
    /// Recoverable errors allow the current operation to be retried by the
    /// user; non-recoverable ones need a different page or browser setup.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Missing capabilities need a different browser/flags
            VoxmateError::CapabilityUnavailable(_) => false,
            // Model may finish downloading; retry later
            VoxmateError::ModelNotReady(_) => true,
            VoxmateError::ModelDownloading(_) => true,
            // Model calls are typically transient failures
            VoxmateError::PromptFailed(_) => true,
            VoxmateError::ClassificationFailed(_) => true,
            // Needs a different page
            VoxmateError::NoReadableContent => false,
            // Channel errors indicate a torn-down context
            VoxmateError::ChannelError(_) => false,
            // Needs a different language pair
            VoxmateError::TranslationUnavailable { .. } => false,
            // Speech errors are typically transient
            VoxmateError::SpeechError(_) => true,
            VoxmateError::StorageError(_) => false,
        }
    }

    /// Get a user-friendly description of the error
    ///
    /// Returns a message suitable for display in a notification.
    pub fn user_message(&self) -> String {
        match self {
            VoxmateError::CapabilityUnavailable(_) => {
                "This browser does not provide the on-device AI features VoxMate needs."
                    .to_string()
            }
            VoxmateError::ModelNotReady(_) => {
                "The AI model is not ready yet. Please try again shortly.".to_string()
            }
            VoxmateError::ModelDownloading(_) => {
                "The AI model is still downloading. Please try again once it finishes."
                    .to_string()
            }
            VoxmateError::PromptFailed(_) => {
                "The AI request failed. Please try again.".to_string()
            }
            VoxmateError::ClassificationFailed(_) => {
                "Could not interpret that command. Please try again.".to_string()
            }
            VoxmateError::NoReadableContent => {
                "No readable text found on this page.".to_string()
            }
            VoxmateError::ChannelError(_) => {
                "Internal communication error. Please reload the page.".to_string()
            }
            VoxmateError::TranslationUnavailable { source, target } => {
                format!("Translation is not available for {} to {}.", source, target)
            }
            VoxmateError::SpeechError(_) => {
                "Speech output failed. Please try again.".to_string()
            }
            VoxmateError::StorageError(_) => {
                "Could not access saved preferences.".to_string()
            }
        }
    }
}

/// Result type alias for VoxMate operations
pub type Result<T> = std::result::Result<T, VoxmateError>;

// Re-export the types most hosts need
pub use broker::{Broker, BrokerConfig, BrokerHandle, Reply, Request};
pub use capability::{Availability, Capabilities, Notice, NoticeKind, PollPolicy};
pub use command::{Command, CommandKind, CommandResolver, Utterance};
pub use dispatch::CommandDispatcher;
pub use reading::{ReadingEngine, ReadingState, Segment};
pub use settings::{MemoryStorage, SettingsStore, Storage};
pub use voice::VoiceController;
