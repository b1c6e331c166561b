//! Local phrase matcher
//!
//! Pure, synchronous first tier of command resolution: static per-language
//! phrase tables, checked in the user's language first and then always in
//! English. Matching is substring containment with word-boundary
//! heuristics, not strict tokenization -- transcripts are noisy and often
//! embed the trigger phrase mid-sentence.

use super::{Command, CommandKind};

type Entries = &'static [(CommandKind, &'static [&'static str])];

struct PhraseTable {
    language: &'static str,
    entries: Entries,
}

// Stop precedes Read: "stop reading" and "end reading" would otherwise hit
// the Read entry through the containment heuristic.
const EN: Entries = &[
    (CommandKind::Stop, &["stop", "cancel", "end reading", "stop reading"]),
    (CommandKind::Read, &["read", "start reading", "read page", "read this"]),
    (CommandKind::Pause, &["pause", "hold on", "wait"]),
    (CommandKind::Translate, &["translate", "translate page", "translate this"]),
    (
        CommandKind::ShowCommands,
        &["show commands", "commands", "help", "what can you say", "what can i say"],
    ),
    (
        CommandKind::Summarise,
        &["summarise", "summarize", "summary", "summarize this", "summarise this"],
    ),
];

const ZH: Entries = &[
    (CommandKind::Read, &["读", "朗读"]),
    (CommandKind::Pause, &["暂停"]),
    (CommandKind::Stop, &["停止"]),
    (CommandKind::Translate, &["翻译"]),
    (CommandKind::ShowCommands, &["显示命令", "命令", "帮助"]),
    (CommandKind::Summarise, &["总结"]),
];

const HI: Entries = &[
    (CommandKind::Read, &["पढ़ो"]),
    (CommandKind::Pause, &["रुको", "ठहरो"]),
    (CommandKind::Stop, &["बंद करो", "रोक दो"]),
    (CommandKind::Translate, &["अनुवाद", "अनुवाद करो", "अनुवाद करो पेज"]),
    (CommandKind::ShowCommands, &["कमांड दिखाओ", "कमांड", "सहायता", "help"]),
    (CommandKind::Summarise, &["सारांश", "सारांश बनाओ"]),
];

const ES: Entries = &[
    (CommandKind::Read, &["leer"]),
    (CommandKind::Pause, &["pausa"]),
    (CommandKind::Stop, &["detener"]),
    (CommandKind::Translate, &["traducir"]),
    (CommandKind::ShowCommands, &["comandos", "mostrar comandos", "ayuda"]),
    (CommandKind::Summarise, &["resumir"]),
];

const FR: Entries = &[
    (CommandKind::Read, &["lire"]),
    (CommandKind::Pause, &["pause"]),
    (CommandKind::Stop, &["arrêter", "stop"]),
    (CommandKind::Translate, &["traduire"]),
    (CommandKind::ShowCommands, &["commandes", "afficher les commandes", "aide"]),
    (CommandKind::Summarise, &["résumer"]),
];

static TABLES: &[PhraseTable] = &[
    PhraseTable { language: "en", entries: EN },
    PhraseTable { language: "zh", entries: ZH },
    PhraseTable { language: "hi", entries: HI },
    PhraseTable { language: "es", entries: ES },
    PhraseTable { language: "fr", entries: FR },
];

/// Question words that mark an interrogative utterance
const QUESTION_WORDS: &[&str] = &[
    "what", "who", "how", "when", "why", "where", "which", "is", "are",
];

/// Markers that signal ask intent anywhere in the utterance
const ASK_MARKERS: &[&str] = &[
    "ask", "tell me", "explain", "define", "बताओ", "बताइए", "请问", "请告诉我", "पुछो",
];

/// Markers stripped from the start of the utterance to extract the question
const STRIPPABLE_MARKERS: &[&str] = &["ask", "tell me", "explain", "define"];

/// Map raw input to commands using the static phrase tables.
///
/// Deterministic and free of I/O. Checks the user-language table first,
/// then the English table (English phrases are always recognized). Falls
/// through to the interrogative and ask-marker heuristics, and finally to
/// `Unknown`.
pub fn match_command(raw: &str, language: &str) -> Vec<Command> {
    let raw = raw.trim();
    let normalized = raw.to_lowercase();

    let primary = TABLES.iter().find(|t| t.language == language);
    if let Some(table) = primary {
        if let Some(kind) = lookup(table.entries, &normalized) {
            return vec![Command::new(kind, raw)];
        }
    }

    // English phrases are recognized regardless of the user language.
    if primary.map(|t| t.language) != Some("en") {
        if let Some(kind) = lookup(EN, &normalized) {
            return vec![Command::new(kind, raw)];
        }
    }

    if is_interrogative(&normalized) {
        return vec![Command::ask(raw, raw)];
    }

    if has_ask_marker(&normalized) {
        let question = strip_ask_marker(raw);
        return vec![Command::ask(question, raw)];
    }

    vec![Command::unknown(raw)]
}

fn lookup(entries: Entries, normalized: &str) -> Option<CommandKind> {
    for (kind, phrases) in entries {
        if phrases.iter().any(|p| phrase_matches(normalized, p)) {
            return Some(*kind);
        }
    }
    None
}

/// Whole-token-ish containment: exact, prefix, suffix, or bounded by a
/// space on either side.
fn phrase_matches(normalized: &str, phrase: &str) -> bool {
    let p = phrase.to_lowercase();
    normalized == p
        || normalized.starts_with(&p)
        || normalized.ends_with(&p)
        || normalized.contains(&format!(" {}", p))
        || normalized.contains(&format!("{} ", p))
}

fn is_interrogative(normalized: &str) -> bool {
    if normalized.ends_with('?') {
        return true;
    }
    let first = match normalized.split_whitespace().next() {
        Some(token) => token,
        None => return false,
    };
    QUESTION_WORDS.iter().any(|w| {
        first == *w
            || (first.starts_with(w)
                && first[w.len()..]
                    .chars()
                    .next()
                    .map(|c| !c.is_alphanumeric())
                    .unwrap_or(false))
    })
}

fn has_ask_marker(normalized: &str) -> bool {
    ASK_MARKERS.iter().any(|m| normalized.contains(m))
}

/// Strip a leading ask marker to extract the probable question. Falls back
/// to the whole utterance when nothing useful remains.
fn strip_ask_marker(raw: &str) -> &str {
    let lower = raw.to_lowercase();
    for marker in STRIPPABLE_MARKERS {
        if lower.starts_with(marker) {
            let rest = raw[marker.len()..].trim_start();
            if !rest.is_empty() {
                return rest;
            }
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(raw: &str, lang: &str) -> Command {
        let commands = match_command(raw, lang);
        assert_eq!(commands.len(), 1, "expected one command for {:?}", raw);
        commands.into_iter().next().unwrap()
    }

    #[test]
    fn test_every_table_phrase_maps_to_its_command() {
        for table in TABLES {
            for (kind, phrases) in table.entries {
                for phrase in *phrases {
                    let command = single(phrase, table.language);
                    assert_eq!(
                        command.kind, *kind,
                        "phrase {:?} in {} mapped to {:?}",
                        phrase, table.language, command.kind
                    );
                    assert_eq!(command.raw, *phrase);
                }
            }
        }
    }

    #[test]
    fn test_english_fallback_for_unsupported_language() {
        let command = single("stop", "xx");
        assert_eq!(command.kind, CommandKind::Stop);
        assert_eq!(command.raw, "stop");
    }

    #[test]
    fn test_english_fallback_for_supported_language() {
        // User speaks Spanish but uses the English phrase.
        let command = single("translate", "es");
        assert_eq!(command.kind, CommandKind::Translate);
    }

    #[test]
    fn test_user_language_checked_before_english() {
        let command = single("traducir", "es");
        assert_eq!(command.kind, CommandKind::Translate);
        assert_eq!(command.raw, "traducir");
    }

    #[test]
    fn test_phrase_embedded_mid_sentence() {
        let command = single("please pause for a moment", "en");
        assert_eq!(command.kind, CommandKind::Pause);
    }

    #[test]
    fn test_phrase_as_prefix_and_suffix() {
        assert_eq!(single("stop right there", "en").kind, CommandKind::Stop);
        assert_eq!(single("now please stop", "en").kind, CommandKind::Stop);
    }

    #[test]
    fn test_normalization_trims_and_lowercases() {
        let command = single("  Start Reading  ", "en");
        assert_eq!(command.kind, CommandKind::Read);
        assert_eq!(command.raw, "Start Reading");
    }

    #[test]
    fn test_interrogative_becomes_ask() {
        let command = single("what is this page about?", "en");
        assert_eq!(command.kind, CommandKind::Ask);
        assert_eq!(command.question.as_deref(), Some("what is this page about?"));
        assert_eq!(command.raw, "what is this page about?");
    }

    #[test]
    fn test_trailing_question_mark_becomes_ask() {
        let command = single("the capital of France?", "en");
        assert_eq!(command.kind, CommandKind::Ask);
    }

    #[test]
    fn test_contracted_question_word() {
        let command = single("what's the main topic here", "en");
        assert_eq!(command.kind, CommandKind::Ask);
    }

    #[test]
    fn test_ask_marker_strips_prefix() {
        let command = single("tell me about the author", "en");
        assert_eq!(command.kind, CommandKind::Ask);
        assert_eq!(command.question.as_deref(), Some("about the author"));
        assert_eq!(command.raw, "tell me about the author");
    }

    #[test]
    fn test_ask_marker_alone_keeps_raw_as_question() {
        let command = single("explain", "en");
        assert_eq!(command.kind, CommandKind::Ask);
        assert_eq!(command.question.as_deref(), Some("explain"));
    }

    #[test]
    fn test_translated_ask_marker() {
        let command = single("这个页面请告诉我讲了什么", "zh");
        assert_eq!(command.kind, CommandKind::Ask);
    }

    #[test]
    fn test_gibberish_is_unknown() {
        let command = single("asdkjasd", "en");
        assert_eq!(command.kind, CommandKind::Unknown);
        assert_eq!(command.raw, "asdkjasd");
        assert_eq!(command.question, None);
    }

    #[test]
    fn test_table_order_first_match_wins() {
        // Carries both a read and a stop phrase; the stop entry comes
        // first in table order.
        let command = single("read and then stop", "en");
        assert_eq!(command.kind, CommandKind::Stop);
    }
}
