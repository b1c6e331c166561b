//! Command interpretation pipeline
//!
//! Raw spoken or typed input becomes a normalized command in two tiers:
//! a fast local phrase matcher, then an on-device model classifier for
//! anything the tables don't recognize. The resolver orchestrates the
//! fallback and always degrades to `Unknown` rather than failing.

pub mod classifier;
pub mod matcher;
pub mod resolver;

pub use classifier::CommandClassifier;
pub use resolver::{ClassifyCommand, CommandResolver};

/// One recognized or typed input submitted for interpretation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub language: String,
}

impl Utterance {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
        }
    }
}

/// The closed command vocabulary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Read,
    Pause,
    Stop,
    Translate,
    ShowCommands,
    Summarise,
    Ask,
    Unknown,
}

impl CommandKind {
    /// Wire keyword as used by the classifier vocabulary.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Read => "read",
            CommandKind::Pause => "pause",
            CommandKind::Stop => "stop",
            CommandKind::Translate => "translate",
            CommandKind::ShowCommands => "show commands",
            CommandKind::Summarise => "summarise",
            CommandKind::Ask => "ask",
            CommandKind::Unknown => "unknown",
        }
    }

    /// Parse a wire keyword, tolerating the spellings the model produces.
    pub fn parse(keyword: &str) -> Self {
        match keyword.trim().to_lowercase().as_str() {
            "read" => CommandKind::Read,
            "pause" => CommandKind::Pause,
            "stop" => CommandKind::Stop,
            "translate" => CommandKind::Translate,
            "show commands" | "show_commands" => CommandKind::ShowCommands,
            "summarise" | "summarize" => CommandKind::Summarise,
            "ask" => CommandKind::Ask,
            _ => CommandKind::Unknown,
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One resolved command, carrying the raw input for diagnostics
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    /// Present only for `Ask`
    pub question: Option<String>,
    pub raw: String,
}

impl Command {
    pub fn new(kind: CommandKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            question: None,
            raw: raw.into(),
        }
    }

    pub fn ask(question: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::Ask,
            question: Some(question.into()),
            raw: raw.into(),
        }
    }

    pub fn unknown(raw: impl Into<String>) -> Self {
        Self::new(CommandKind::Unknown, raw)
    }

    pub fn is_unknown(&self) -> bool {
        self.kind == CommandKind::Unknown
    }

    /// The question to ask, falling back to the raw input.
    pub fn question_or_raw(&self) -> &str {
        self.question
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            CommandKind::Read,
            CommandKind::Pause,
            CommandKind::Stop,
            CommandKind::Translate,
            CommandKind::ShowCommands,
            CommandKind::Summarise,
            CommandKind::Ask,
        ] {
            assert_eq!(CommandKind::parse(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_kind_parse_tolerates_variants() {
        assert_eq!(CommandKind::parse("Summarize"), CommandKind::Summarise);
        assert_eq!(CommandKind::parse("show_commands"), CommandKind::ShowCommands);
        assert_eq!(CommandKind::parse("  STOP  "), CommandKind::Stop);
        assert_eq!(CommandKind::parse("dance"), CommandKind::Unknown);
    }

    #[test]
    fn test_question_or_raw_fallback() {
        let with_question = Command::ask("what is this?", "ask what is this?");
        assert_eq!(with_question.question_or_raw(), "what is this?");

        let blank_question = Command {
            kind: CommandKind::Ask,
            question: Some("   ".to_string()),
            raw: "tell me".to_string(),
        };
        assert_eq!(blank_question.question_or_raw(), "tell me");

        let no_question = Command::new(CommandKind::Ask, "explain this");
        assert_eq!(no_question.question_or_raw(), "explain this");
    }
}
