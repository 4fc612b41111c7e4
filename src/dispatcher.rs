//! Command handlers: one per [`Command`] variant.
//!
//! The dispatcher owns its collaborators by injection (no module-level
//! state) so tests can assemble one against mock servers and a throwaway
//! database. Provider failures are recovered with a generic retry message;
//! persistence failures are logged and never crash a handler; nothing the
//! provider says is ever forwarded to the chat.

use crate::catalog::LanguageCatalog;
use crate::commands::Command;
use crate::db::{Database, Stats};
use crate::system::SystemStats;
use crate::telegram::BotClient;
use crate::translator::TranslatorClient;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// The code everything is translated to (or from, for `/translate_to`).
const CANONICAL_LANG: &str = "en";

const RETRY_MESSAGE: &str = "Error processing your request. Please try again later.";
const INVALID_CODE_MESSAGE: &str = "Invalid language code. Please use a valid language code.";
const UNKNOWN_COMMAND_MESSAGE: &str =
    "Invalid command. Use /help to see the list of available commands.";
const NO_DATA_MESSAGE: &str = "No translation data available.";
const FEEDBACK_THANKS_MESSAGE: &str = "Thank you for your feedback!";

const HELP_MESSAGE: &str = "*Translation Bot Help*:\n\
    - Use `/translate <text>` to detect the language and translate to English.\n\
    - Use `/translate_to <lang_code> <text>` to translate from English to the specified language.\n\
    - Example: `/translate_to es Hello, how are you?`\n\
    - Use `/stats` to see usage statistics.\n\
    - Use `/languages` to see the list of supported languages.\n\
    - Use `/feedback <message>` to send feedback.\n\
    - Use `/top_languages` to see the top translated languages.";

pub struct Dispatcher {
    catalog: LanguageCatalog,
    translator: TranslatorClient,
    db: Database,
    bot: Arc<BotClient>,
}

impl Dispatcher {
    pub fn new(
        catalog: LanguageCatalog,
        translator: TranslatorClient,
        db: Database,
        bot: Arc<BotClient>,
    ) -> Self {
        Self {
            catalog,
            translator,
            db,
            bot,
        }
    }

    /// Classify one inbound message and run its handler. Returns an error
    /// only when the reply itself could not be sent.
    pub async fn handle_message(
        &self,
        chat_id: i64,
        username: Option<&str>,
        text: &str,
    ) -> Result<()> {
        info!("Received message from {}: {}", chat_id, text);

        match Command::parse(text) {
            Command::Translate { text } => self.handle_translate(chat_id, &text).await,
            Command::TranslateTo { lang, text } => {
                self.handle_translate_to(chat_id, &lang, &text).await
            }
            Command::Help => self.bot.send_message(chat_id, HELP_MESSAGE, true).await,
            Command::Stats => self.handle_stats(chat_id).await,
            Command::Languages => self.handle_languages(chat_id).await,
            Command::Feedback { message } => self.handle_feedback(chat_id, username, &message).await,
            Command::TopLanguages => self.handle_top_languages(chat_id).await,
            Command::Unknown => {
                self.bot
                    .send_message(chat_id, UNKNOWN_COMMAND_MESSAGE, false)
                    .await
            }
        }
    }

    /// `/translate`: detect the source language, translate to English.
    async fn handle_translate(&self, chat_id: i64, text: &str) -> Result<()> {
        let result = async {
            let detected = self.translator.detect_language(text).await?;
            let translated = self
                .translator
                .translate(text, CANONICAL_LANG, Some(&detected))
                .await?;
            Ok::<_, crate::translator::ProviderError>((detected, translated))
        }
        .await;

        match result {
            Ok((detected, translated)) => {
                self.send_translation(chat_id, text, &translated, &detected, CANONICAL_LANG)
                    .await?;
                self.record_translation(&detected, CANONICAL_LANG);
                Ok(())
            }
            Err(e) => {
                warn!("Translation failed for chat {}: {}", chat_id, e);
                self.bot.send_message(chat_id, RETRY_MESSAGE, false).await
            }
        }
    }

    /// `/translate_to`: validate the target code, translate from English.
    async fn handle_translate_to(&self, chat_id: i64, lang: &str, text: &str) -> Result<()> {
        if !self.catalog.is_supported(lang) {
            return self
                .bot
                .send_message(chat_id, INVALID_CODE_MESSAGE, false)
                .await;
        }

        match self
            .translator
            .translate(text, lang, Some(CANONICAL_LANG))
            .await
        {
            Ok(translated) => {
                self.send_translation(chat_id, text, &translated, CANONICAL_LANG, lang)
                    .await?;
                self.record_translation(CANONICAL_LANG, lang);
                Ok(())
            }
            Err(e) => {
                warn!("Translation to {} failed for chat {}: {}", lang, chat_id, e);
                self.bot.send_message(chat_id, RETRY_MESSAGE, false).await
            }
        }
    }

    /// The fixed-template translation reply. User text goes into the
    /// template unsanitized; a user can break the Markdown of their own
    /// reply, which we accept.
    async fn send_translation(
        &self,
        chat_id: i64,
        original: &str,
        translated: &str,
        from: &str,
        to: &str,
    ) -> Result<()> {
        let message = format!(
            "*Translation Result*:\n\
             *From:* `{}`\n\
             *To:* `{}`\n\
             *Language:* `{}` -> `{}`",
            original, translated, from, to
        );
        self.bot.send_message(chat_id, &message, true).await
    }

    /// Stats writes happen after the user already has their translation, so
    /// a store failure is logged and swallowed rather than surfaced.
    fn record_translation(&self, from: &str, to: &str) {
        if let Err(e) = self.db.record_translation(from, to) {
            warn!("Failed to record translation stats ({} -> {}): {:#}", from, to, e);
        }
    }

    /// `/stats`: usage aggregate plus a process resource snapshot.
    async fn handle_stats(&self, chat_id: i64) -> Result<()> {
        let stats = match self.db.load_stats() {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Failed to load stats: {:#}", e);
                return self.bot.send_message(chat_id, RETRY_MESSAGE, false).await;
            }
        };

        let message = format_stats_report(stats.as_ref(), &SystemStats::sample());
        self.bot.send_message(chat_id, &message, true).await
    }

    /// `/languages`: every catalog code, one per line, file order.
    async fn handle_languages(&self, chat_id: i64) -> Result<()> {
        let mut message = String::from("*Supported Languages*:\n");
        for code in self.catalog.codes() {
            message.push('`');
            message.push_str(code);
            message.push_str("`\n");
        }
        self.bot.send_message(chat_id, &message, true).await
    }

    /// `/feedback`: append-only write keyed by the sender's username.
    async fn handle_feedback(
        &self,
        chat_id: i64,
        username: Option<&str>,
        message: &str,
    ) -> Result<()> {
        if let Err(e) = self.db.record_feedback(username, message) {
            warn!("Failed to record feedback from {:?}: {:#}", username, e);
            return self.bot.send_message(chat_id, RETRY_MESSAGE, false).await;
        }
        self.bot
            .send_message(chat_id, FEEDBACK_THANKS_MESSAGE, false)
            .await
    }

    /// `/top_languages`: top 5 codes by count, descending. Ties land in
    /// whatever order the counter map iterates, which is not deterministic.
    async fn handle_top_languages(&self, chat_id: i64) -> Result<()> {
        let stats = match self.db.load_stats() {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Failed to load stats: {:#}", e);
                return self.bot.send_message(chat_id, RETRY_MESSAGE, false).await;
            }
        };

        let stats = match stats {
            Some(stats) => stats,
            None => {
                return self.bot.send_message(chat_id, NO_DATA_MESSAGE, false).await;
            }
        };

        let message = format_top_languages(&stats);
        self.bot.send_message(chat_id, &message, true).await
    }
}

/// Build the combined `/stats` report. Absent stats read as zero totals.
fn format_stats_report(stats: Option<&Stats>, system: &SystemStats) -> String {
    let total = stats.map(|s| s.total_translations).unwrap_or(0);
    let mut message = format!("*Usage Statistics*:\nTotal Translations: {}\n", total);

    if let Some(stats) = stats {
        for (lang, count) in &stats.language_counts {
            message.push_str(&format!("`{}`: {} translations\n", lang, count));
        }
    }

    message.push('\n');
    message.push_str(&system.format_report());
    message
}

/// Build the `/top_languages` reply from a present stats aggregate.
fn format_top_languages(stats: &Stats) -> String {
    let mut sorted: Vec<(&String, &i64)> = stats.language_counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1));

    let mut message = String::from("*Top Translated Languages*:\n");
    for (lang, count) in sorted.into_iter().take(5) {
        message.push_str(&format!("`{}`: {} translations\n", lang, count));
    }
    message
}
