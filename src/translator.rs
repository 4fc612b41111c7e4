//! Client for the remote translation provider.
//!
//! Two operations, both a single POST with a one-element body array:
//! `detect_language` and `translate`. No retries, no caching; every failure
//! class collapses into [`ProviderError`] so handlers can recover with a
//! generic user-facing message without inspecting provider internals.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const API_VERSION: &str = "3.0";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Errors from the translation provider. The display text is for logs only
/// and is never forwarded to the chat.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request to translation provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("translation provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("translation provider returned an empty or malformed response")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct TextItem<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct DetectResult {
    language: String,
}

#[derive(Debug, Deserialize)]
struct TranslateResult {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

/// Thin wrapper over the provider's `detect` and `translate` endpoints.
#[derive(Debug, Clone)]
pub struct TranslatorClient {
    http: reqwest::Client,
    endpoint: String,
    key: String,
}

impl TranslatorClient {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            key: key.into(),
        }
    }

    /// Detect the language of `text`, returning the provider's language code.
    pub async fn detect_language(&self, text: &str) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(format!("{}/detect", self.endpoint))
            .query(&[("api-version", API_VERSION)])
            .header(SUBSCRIPTION_KEY_HEADER, &self.key)
            .json(&[TextItem { text }])
            .send()
            .await?;

        let response = check_status(response).await?;
        let results: Vec<DetectResult> = response.json().await?;

        results
            .into_iter()
            .next()
            .map(|r| r.language)
            .ok_or(ProviderError::EmptyResponse)
    }

    /// Translate `text` into `to`. When `from` is `None` the provider
    /// auto-detects the source language.
    pub async fn translate(
        &self,
        text: &str,
        to: &str,
        from: Option<&str>,
    ) -> Result<String, ProviderError> {
        let mut query = vec![("api-version", API_VERSION), ("to", to)];
        if let Some(from) = from {
            query.push(("from", from));
        }

        let response = self
            .http
            .post(format!("{}/translate", self.endpoint))
            .query(&query)
            .header(SUBSCRIPTION_KEY_HEADER, &self.key)
            .json(&[TextItem { text }])
            .send()
            .await?;

        let response = check_status(response).await?;
        let results: Vec<TranslateResult> = response.json().await?;

        results
            .into_iter()
            .next()
            .and_then(|r| r.translations.into_iter().next())
            .map(|t| t.text)
            .ok_or(ProviderError::EmptyResponse)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
    Err(ProviderError::Status { status, body })
}
