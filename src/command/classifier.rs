//! Model-backed command classifier
//!
//! Second tier of command resolution, consulted only when the phrase
//! matcher yields `Unknown`. Prompts the on-device language model with a
//! schema-constrained request and parses the JSON verdict. Parse failures
//! degrade to `Unknown`; transport and session failures surface as
//! `ClassificationFailed` for the resolver to swallow.

use super::{Command, CommandKind};
use crate::capability::{
    wait_until_ready, LanguageModel, PollPolicy, PromptOptions, SessionConfig,
};
use crate::{Result, VoxmateError};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Commands the model is allowed to answer with
pub const COMMAND_VOCABULARY: &[&str] = &[
    "read",
    "pause",
    "stop",
    "translate",
    "show commands",
    "ask",
    "summarise",
];

const SYSTEM_INSTRUCTION: &str = "\
You are an AI assistant that interprets spoken or written user commands into \
one of the following English commands: read, pause, stop, translate, \
show commands, ask, summarise.

Rules:
- Always choose only ONE command that best represents the user's intent.
- If the user chains commands (like \"read and pause\"), select the one that \
sounds like the main or first intent.
- Output must always follow this schema: { \"command\": \"<command>\", \"question\": \"<optional>\" }
- Only include \"question\" if the command is \"ask\".
- No explanations, text, or formatting outside valid JSON.";

/// JSON schema constraining the model's response
fn response_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "command": {
                "type": "string",
                "enum": COMMAND_VOCABULARY,
            },
            "question": { "type": "string" },
        },
        "required": ["command"],
        "additionalProperties": false,
    })
}

/// Shape of the model's verdict
#[derive(Debug, Deserialize)]
struct Verdict {
    command: String,
    #[serde(default)]
    question: Option<String>,
}

/// Classifier over a resolved language-model handle
pub struct CommandClassifier {
    model: Arc<dyn LanguageModel>,
    poll: PollPolicy,
}

impl CommandClassifier {
    pub fn new(model: Arc<dyn LanguageModel>, poll: PollPolicy) -> Self {
        Self { model, poll }
    }

    /// Classify raw input into a single command.
    ///
    /// Waits for model readiness on the bounded polling schedule, then
    /// sends one schema-constrained prompt. An unparseable reply yields
    /// `Unknown` rather than an error.
    pub async fn classify(&self, raw: &str, language: &str) -> Result<Command> {
        let model = Arc::clone(&self.model);
        wait_until_ready(
            move || {
                let model = Arc::clone(&model);
                async move { model.availability().await }
            },
            &self.poll,
            "language model",
        )
        .await?;

        let mut input_languages = vec!["en".to_string()];
        if language != "en" {
            input_languages.push(language.to_string());
        }

        let config = SessionConfig::new()
            .with_system_instruction(SYSTEM_INSTRUCTION)
            .with_input_languages(input_languages)
            .with_output_language("en");

        let session = self
            .model
            .create_session(config)
            .await
            .map_err(|e| VoxmateError::ClassificationFailed(e.to_string()))?;

        let prompt = format!(
            "User said (in {}): \"{}\"\n\
             Determine which one command applies, and respond strictly following the JSON schema.",
            language, raw
        );
        let options = PromptOptions::new()
            .with_response_schema(response_schema())
            .with_output_language("en");

        let reply = session
            .prompt(&prompt, options)
            .await
            .map_err(|e| VoxmateError::ClassificationFailed(e.to_string()))?;

        debug!("classifier verdict for {:?}: {}", raw, reply);
        Ok(parse_verdict(&reply, raw))
    }
}

/// Parse the model's JSON verdict into a command.
///
/// Classification failures are never fatal: anything unparseable, and any
/// command word outside the vocabulary, degrades to `Unknown`.
fn parse_verdict(reply: &str, raw: &str) -> Command {
    let verdict: Verdict = match serde_json::from_str(reply.trim()) {
        Ok(v) => v,
        Err(e) => {
            warn!("invalid classifier JSON ({}): {}", e, reply);
            return Command::unknown(raw);
        }
    };

    let kind = CommandKind::parse(&verdict.command);
    match kind {
        CommandKind::Ask => Command {
            kind,
            question: verdict.question.filter(|q| !q.trim().is_empty()),
            raw: raw.to_string(),
        },
        _ => Command::new(kind, raw),
    }
}
