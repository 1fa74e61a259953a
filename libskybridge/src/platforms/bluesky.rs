//! Bluesky source feed implementation
//!
//! Reads the single newest post of the watched account through the AT
//! Protocol `getAuthorFeed` endpoint. The session is established once at
//! construction; a failed login leaves the daemon without a source until
//! restart (the caller decides to degrade rather than crash).

use async_trait::async_trait;
use bsky_sdk::api::types::string::AtIdentifier;
use bsky_sdk::BskyAgent;
use serde_json::Value;
use std::time::Duration;

use crate::error::{PlatformError, Result};
use crate::platforms::SourceFeed;
use crate::types::MirrorCandidate;

/// Bound on one feed fetch so a hung upstream cannot stall the tick.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Record fields tried in order when extracting post text. The payload
/// shape varies by post type (plain, quote, reply, media-only), so the
/// first non-empty match wins and a miss degrades to an empty string.
const TEXT_FIELDS: &[&str] = &["text", "message", "description"];

/// Map AT Protocol / XRPC errors to PlatformError
///
/// Works over the error's Display and Debug output because bsky-sdk
/// surfaces several error types; XRPC status codes and AT Protocol error
/// codes are matched as substrings.
fn map_bluesky_error<E: std::fmt::Display + std::fmt::Debug>(
    error: E,
    context: &str,
) -> PlatformError {
    let error_msg = format!("{}", error);
    let debug_msg = format!("{:?}", error);

    if error_msg.contains("401")
        || error_msg.contains("403")
        || error_msg.contains("AuthenticationRequired")
        || error_msg.contains("InvalidToken")
        || error_msg.contains("ExpiredToken")
        || debug_msg.contains("Unauthorized")
        || debug_msg.contains("Forbidden")
    {
        return PlatformError::Authentication(format!(
            "Bluesky authentication failed during {}: {}",
            context, error_msg
        ));
    }

    if error_msg.contains("InvalidCredentials")
        || error_msg.contains("AccountNotFound")
        || (context == "login" && error_msg.contains("invalid"))
    {
        return PlatformError::Authentication(format!(
            "Invalid Bluesky credentials: {}. Check the handle and app password.",
            error_msg
        ));
    }

    if error_msg.contains("429")
        || error_msg.contains("RateLimitExceeded")
        || debug_msg.contains("RateLimit")
    {
        return PlatformError::RateLimit(format!(
            "Bluesky rate limit exceeded during {}: {}",
            context, error_msg
        ));
    }

    if error_msg.contains("connection")
        || error_msg.contains("network")
        || error_msg.contains("timeout")
        || error_msg.contains("dns")
        || debug_msg.contains("Connect")
        || debug_msg.contains("Timeout")
    {
        return PlatformError::Network(format!(
            "Network error talking to the Bluesky PDS during {}: {}",
            context, error_msg
        ));
    }

    PlatformError::Posting(format!(
        "Bluesky operation failed during {}: {}",
        context, error_msg
    ))
}

/// Extract post text from a feed record, trying `TEXT_FIELDS` in order.
///
/// The record arrives as loosely-typed data; anything that is not a
/// non-empty string degrades to `""` rather than an error.
fn extract_text(record: &Value) -> String {
    for field in TEXT_FIELDS {
        if let Some(text) = record.get(field).and_then(Value::as_str) {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    String::new()
}

pub struct BlueskyFeed {
    agent: BskyAgent,
    actor: AtIdentifier,
}

impl BlueskyFeed {
    /// Create the agent, log in, and resolve the watched account.
    ///
    /// # Arguments
    ///
    /// * `handle` - the account the bridge logs in as (e.g. "bot.bsky.social")
    /// * `app_password` - app password for that account
    /// * `target_account` - handle or DID of the account being mirrored
    pub async fn login(handle: &str, app_password: &str, target_account: &str) -> Result<Self> {
        let actor: AtIdentifier = target_account.parse().map_err(|e| {
            PlatformError::Validation(format!(
                "'{}' is not a valid Bluesky handle or DID: {}",
                target_account, e
            ))
        })?;

        let agent = BskyAgent::builder()
            .build()
            .await
            .map_err(|e| map_bluesky_error(e, "create agent"))?;

        tracing::debug!("Creating Bluesky session for handle: {}", handle);

        agent
            .login(handle, app_password)
            .await
            .map_err(|e| map_bluesky_error(e, "login"))?;

        tracing::debug!("Bluesky session created, watching {}", target_account);

        Ok(Self { agent, actor })
    }
}

#[async_trait]
impl SourceFeed for BlueskyFeed {
    async fn fetch_latest(&self) -> Result<Option<MirrorCandidate>> {
        use bsky_sdk::api::app::bsky::feed::get_author_feed::ParametersData;

        let params = ParametersData {
            actor: self.actor.clone(),
            cursor: None,
            filter: None,
            include_pins: None,
            limit: 1u8.try_into().ok(),
        };

        let request = self.agent.api.app.bsky.feed.get_author_feed(params.into());

        let output = tokio::time::timeout(FETCH_TIMEOUT, request)
            .await
            .map_err(|_| {
                PlatformError::Network(format!(
                    "Bluesky feed fetch timed out after {}s",
                    FETCH_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| map_bluesky_error(e, "fetch author feed"))?;

        let Some(item) = output.feed.first() else {
            return Ok(None);
        };

        let source_id = item.post.uri.clone();

        // The record is loosely typed; go through JSON and extract
        // defensively instead of trusting one field name.
        let record = serde_json::to_value(&item.post.record).unwrap_or(Value::Null);
        let raw_text = extract_text(&record);

        Ok(Some(MirrorCandidate::new(source_id, raw_text)))
    }

    fn name(&self) -> &str {
        "bluesky"
    }
}
