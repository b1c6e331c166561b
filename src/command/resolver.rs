//! Command resolver
//!
//! Ties the two tiers together: phrase matcher first, classifier fallback
//! only for a lone `Unknown`. Fallback failures are silent apart from a
//! diagnostic log -- the caller always receives a command list.

use super::{matcher, Command, CommandClassifier, CommandKind};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Classification backend used for the fallback tier
///
/// Implemented by the in-context classifier and by the request broker
/// handle (which routes classification through the background coordinator).
#[async_trait]
pub trait ClassifyCommand: Send + Sync {
    async fn classify(&self, raw: &str, language: &str) -> Result<Command>;
}

#[async_trait]
impl ClassifyCommand for CommandClassifier {
    async fn classify(&self, raw: &str, language: &str) -> Result<Command> {
        CommandClassifier::classify(self, raw, language).await
    }
}

/// Two-tier command resolution
pub struct CommandResolver {
    classifier: Option<Arc<dyn ClassifyCommand>>,
}

impl CommandResolver {
    pub fn new(classifier: Arc<dyn ClassifyCommand>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    /// Resolver with no fallback tier; unmatched input stays `Unknown`.
    pub fn without_classifier() -> Self {
        Self { classifier: None }
    }

    /// Resolve raw input into an ordered command list.
    ///
    /// Almost always a single command, but the contract supports multiple;
    /// execution order is list order.
    pub async fn resolve(&self, raw: &str, language: &str) -> Vec<Command> {
        let commands = matcher::match_command(raw, language);

        let lone_unknown = commands.len() == 1 && commands[0].kind == CommandKind::Unknown;
        if !lone_unknown {
            debug!("matched locally: {:?} -> {}", raw, commands[0].kind);
            return commands;
        }

        let classifier = match &self.classifier {
            Some(c) => c,
            None => return commands,
        };

        debug!("no local match for {:?}, falling back to classifier", raw);
        match classifier.classify(raw, language).await {
            Ok(verdict) if !verdict.is_unknown() => {
                debug!("classifier resolved {:?} -> {}", raw, verdict.kind);
                vec![Command {
                    kind: verdict.kind,
                    question: verdict.question,
                    raw: raw.trim().to_string(),
                }]
            }
            Ok(_) => commands,
            Err(e) => {
                warn!("classifier fallback failed for {:?}: {}", raw, e);
                commands
            }
        }
    }
}
