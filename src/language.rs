//! Language metadata: display names, recognition locales, help text
//!
//! Small static tables keyed by ISO-639-1-ish codes. Unknown codes fall
//! back to English everywhere.

/// Full display name for a language code, used when prompting the model to
/// answer in the user's language.
pub fn full_name(code: &str) -> &'static str {
    match code {
        "en" => "English",
        "zh" => "Simplified Chinese",
        "es" => "Spanish",
        "fr" => "French",
        "hi" => "Hindi",
        "ur" => "Urdu",
        "de" => "German",
        "ar" => "Arabic",
        "ja" => "Japanese",
        "ko" => "Korean",
        "ru" => "Russian",
        "it" => "Italian",
        "pt" => "Portuguese",
        _ => "English",
    }
}

/// Speech-recognition locale for a language code.
pub fn recognition_locale(code: &str) -> &'static str {
    match code {
        "en" => "en-US",
        "zh" => "zh-CN",
        "hi" => "hi-IN",
        "es" => "es-ES",
        "fr" => "fr-FR",
        _ => "en-US",
    }
}

/// Reduce a system language tag like "en-US" to its bare code.
pub fn base_code(tag: &str) -> &str {
    tag.split('-').next().filter(|s| !s.is_empty()).unwrap_or("en")
}

/// Localized voice-command help text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandsText {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

impl CommandsText {
    /// Single string suitable for speech output: title, then the list.
    pub fn spoken(&self) -> String {
        format!("{}. {}", self.title, self.commands.join(". "))
    }

    /// Multi-line body for a notification.
    pub fn body(&self) -> String {
        self.commands.join("\n")
    }
}

/// Help text for the voice commands, per language, English fallback.
pub fn commands_text(code: &str) -> CommandsText {
    match code {
        "zh" => CommandsText {
            title: "语音命令",
            commands: &["说“读”", "说“暂停”", "说“停止”", "说“翻译”", "说“显示命令”"],
        },
        "hi" => CommandsText {
            title: "वॉयस कमांड्स",
            commands: &[
                "'पढ़ो' कहें",
                "'रुको' कहें",
                "'बंद करो' कहें",
                "'अनुवाद करो' कहें",
                "'कमांड दिखाओ' कहें",
            ],
        },
        "es" => CommandsText {
            title: "Comandos de voz",
            commands: &[
                "Di 'leer'",
                "Di 'pausa'",
                "Di 'detener'",
                "Di 'traducir'",
                "Di 'mostrar comandos'",
            ],
        },
        "fr" => CommandsText {
            title: "Commandes vocales",
            commands: &[
                "Dites 'lire'",
                "Dites 'pause'",
                "Dites 'arrêter'",
                "Dites 'traduire'",
                "Dites 'afficher les commandes'",
            ],
        },
        _ => CommandsText {
            title: "Voice Commands",
            commands: &[
                "Say 'read'",
                "Say 'pause'",
                "Say 'stop'",
                "Say 'translate'",
                "Say 'show commands'",
            ],
        },
    }
}
