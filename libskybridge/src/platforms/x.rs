//! X (Twitter) sink publisher implementation
//!
//! Publishes through the v2 `POST /2/tweets` endpoint with OAuth 1.0a
//! user-context signing. Credentials are verified once at startup via
//! `GET /2/users/me`; a failure there leaves the daemon without a sink
//! until restart.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{PlatformError, Result};
use crate::platforms::oauth1::{self, OAuthCredentials};
use crate::platforms::SinkPublisher;

/// Fixed contract of the sink's maximum message length.
pub const X_CHARACTER_LIMIT: usize = 280;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_API_BASE: &str = "https://api.x.com";

pub struct XSink {
    http: reqwest::Client,
    creds: OAuthCredentials,
    api_base: String,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    data: CreatedTweet,
}

#[derive(Deserialize)]
struct CreatedTweet {
    id: String,
}

/// Map a transport-level reqwest failure to PlatformError.
fn map_transport_error(error: reqwest::Error, context: &str) -> PlatformError {
    if error.is_timeout() || error.is_connect() {
        PlatformError::Network(format!("Network error during {}: {}", context, error))
    } else {
        PlatformError::Posting(format!("X request failed during {}: {}", context, error))
    }
}

/// Map a non-2xx response to PlatformError by status class.
fn map_status_error(status: StatusCode, body: &str, context: &str) -> PlatformError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PlatformError::Authentication(format!(
            "X rejected credentials during {} ({}): {}",
            context, status, body
        )),
        StatusCode::TOO_MANY_REQUESTS => PlatformError::RateLimit(format!(
            "X rate limit exceeded during {}: {}",
            context, body
        )),
        s if s.is_server_error() => PlatformError::Network(format!(
            "X server error during {} ({}): {}",
            context, status, body
        )),
        _ => PlatformError::Posting(format!(
            "X rejected the request during {} ({}): {}",
            context, status, body
        )),
    }
}

impl XSink {
    /// Create a new sink client. Does not touch the network; call
    /// `verify_credentials` to check the tokens.
    pub fn new(creds: OAuthCredentials) -> Result<Self> {
        Self::with_api_base(creds, DEFAULT_API_BASE.to_string())
    }

    /// Create a sink client against a non-default API base URL.
    pub fn with_api_base(creds: OAuthCredentials, api_base: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                PlatformError::Network(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            creds,
            api_base,
        })
    }

    fn auth_header(&self, method: &str, url: &str) -> String {
        oauth1::authorization_header(
            &self.creds,
            method,
            url,
            &[],
            &oauth1::nonce(),
            &chrono::Utc::now().timestamp().to_string(),
        )
    }

    /// Check the four-part credentials against `GET /2/users/me`.
    pub async fn verify_credentials(&self) -> Result<()> {
        let url = format!("{}/2/users/me", self.api_base);

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, self.auth_header("GET", &url))
            .send()
            .await
            .map_err(|e| map_transport_error(e, "verify credentials"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &body, "verify credentials").into());
        }

        tracing::debug!("X credentials verified");
        Ok(())
    }
}

#[async_trait]
impl SinkPublisher for XSink {
    async fn publish(&self, text: &str) -> Result<String> {
        let url = format!("{}/2/tweets", self.api_base);

        tracing::debug!("Publishing to X: {} characters", text.chars().count());

        // JSON bodies take no part in the OAuth signature.
        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.auth_header("POST", &url))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| map_transport_error(e, "create post"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &body, "create post").into());
        }

        let parsed: CreateTweetResponse = response.json().await.map_err(|e| {
            PlatformError::Posting(format!("Failed to parse X create response: {}", e))
        })?;

        tracing::debug!("Published to X: {}", parsed.data.id);
        Ok(parsed.data.id)
    }

    fn name(&self) -> &str {
        "x"
    }

    fn character_limit(&self) -> usize {
        X_CHARACTER_LIMIT
    }
}
