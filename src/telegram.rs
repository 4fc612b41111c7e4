//! Telegram transport: update types, the sending client, and the long-poll
//! loop that feeds the dispatcher.

use crate::dispatcher::Dispatcher;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

// Telegram update types (the subset this bot reads)
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

/// Client for the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct BotClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl BotClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Send a text message to a chat. `markdown` enables Telegram's legacy
    /// Markdown parse mode for the bold/monospace templates.
    pub async fn send_message(&self, chat_id: i64, text: &str, markdown: bool) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: markdown.then_some("Markdown"),
        };

        let response = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await
            .context("Failed to send Telegram message")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("Telegram API error ({}): {}", status, body);
        }

        Ok(())
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let response = self
            .http
            .get(self.method_url("getUpdates"))
            .query(&[("offset", offset.to_string()), ("timeout", timeout_secs.to_string())])
            // The HTTP timeout must outlive the server-side long-poll hold.
            .timeout(Duration::from_secs(timeout_secs + 10))
            .send()
            .await
            .context("Failed to poll Telegram updates")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("Telegram getUpdates error ({}): {}", status, body);
        }

        let updates: UpdatesResponse = response
            .json()
            .await
            .context("Failed to parse Telegram updates")?;

        if !updates.ok {
            anyhow::bail!("Telegram getUpdates responded with ok=false");
        }

        Ok(updates.result)
    }
}

/// Poll for updates forever, handing each text message to the dispatcher.
///
/// Handlers run in their own tasks so a slow translation call never blocks
/// the poll loop; this is also why two messages from the same chat can
/// complete out of order. Handler and transport errors are logged, never
/// fatal.
pub async fn run_polling(
    bot: Arc<BotClient>,
    dispatcher: Arc<Dispatcher>,
    poll_timeout_secs: u64,
) -> Result<()> {
    let mut offset: i64 = 0;

    info!("Starting long polling (timeout {}s)", poll_timeout_secs);

    loop {
        let updates = match bot.get_updates(offset, poll_timeout_secs).await {
            Ok(updates) => updates,
            Err(e) => {
                error!("Polling failed: {:#}", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let message = match update.message {
                Some(msg) => msg,
                None => continue,
            };
            let text = match message.text {
                Some(t) => t,
                None => continue,
            };

            let chat_id = message.chat.id;
            let username = message.from.and_then(|u| u.username);

            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                if let Err(e) = dispatcher.handle_message(chat_id, username.as_deref(), &text).await
                {
                    error!("Handler failed for chat {}: {:#}", chat_id, e);
                }
            });
        }
    }
}
