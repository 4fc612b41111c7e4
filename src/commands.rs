//! Inbound message classification.
//!
//! Every message becomes exactly one [`Command`] variant. Matching is
//! prefix-based, first match wins, in the same fixed priority order the bot
//! has always used. Parsing is separated from execution so the dispatcher
//! can match exhaustively and handlers stay independently testable.

/// One recognized chat command, with its arguments already split out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/translate <text>`: detect the language, translate to English.
    Translate { text: String },
    /// `/translate_to <code> <text>`: translate from English to `<code>`.
    TranslateTo { lang: String, text: String },
    /// `/help`
    Help,
    /// `/stats`
    Stats,
    /// `/languages`
    Languages,
    /// `/feedback <message>`
    Feedback { message: String },
    /// `/top_languages`
    TopLanguages,
    /// Anything that matched no prefix.
    Unknown,
}

impl Command {
    /// Classify a raw message text. Prefix semantics are deliberate:
    /// `/translate` needs its trailing space to bind an argument (so a bare
    /// `/translate` is Unknown), while the argument-less commands match on
    /// prefix alone.
    pub fn parse(text: &str) -> Command {
        if let Some(rest) = text.strip_prefix("/translate ") {
            Command::Translate {
                text: rest.to_string(),
            }
        } else if let Some(rest) = text.strip_prefix("/translate_to ") {
            let mut parts = rest.split_whitespace();
            let lang = parts.next().unwrap_or_default().to_string();
            let text = parts.collect::<Vec<_>>().join(" ");
            Command::TranslateTo { lang, text }
        } else if text.starts_with("/help") {
            Command::Help
        } else if text.starts_with("/stats") {
            Command::Stats
        } else if text.starts_with("/languages") {
            Command::Languages
        } else if let Some(rest) = text.strip_prefix("/feedback ") {
            // Feedback must carry a message; a bare "/feedback " is noise.
            if rest.trim().is_empty() {
                Command::Unknown
            } else {
                Command::Feedback {
                    message: rest.to_string(),
                }
            }
        } else if text.starts_with("/top_languages") {
            Command::TopLanguages
        } else {
            Command::Unknown
        }
    }
}
