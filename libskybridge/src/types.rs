//! Core types for Skybridge

use serde::{Deserialize, Serialize};

/// The newest post fetched from the source feed on one tick.
///
/// Ephemeral: created fresh per tick, consumed once by the decision
/// engine and discarded. `raw_text` may be empty when the upstream
/// payload carried no recognizable text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorCandidate {
    pub source_id: String,
    pub raw_text: String,
}

impl MirrorCandidate {
    pub fn new(source_id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            raw_text: raw_text.into(),
        }
    }
}

/// One row of the persisted seen-set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeenRecord {
    pub source_id: String,
    pub published_text: Option<String>,
    pub recorded_at: i64,
}

/// Outcome of one run of the decision pipeline, evaluated in fixed order
/// with the first matching state winning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// The source feed reader never authenticated; nothing was attempted.
    SourceUnavailable,
    /// The sink publisher never authenticated; the candidate stays
    /// unrecorded so a restart can pick it up.
    SinkUnavailable,
    /// Reading the feed failed; retried on the next tick.
    FetchFailed,
    /// The account has no posts.
    NoPost,
    /// The post carried no stable identifier, so it cannot be deduplicated.
    MissingId,
    /// The identifier is already in the seen-set.
    AlreadySeen,
    /// Unseen post with empty text: recorded so it is never retried,
    /// but nothing was published.
    RecordedEmptyText,
    /// Dry run reached the publish step; the sink was not called.
    WouldPublish,
    /// Published to the sink and recorded.
    Published,
    /// The sink rejected the post; nothing was recorded, retried next tick.
    PublishFailed,
    /// A seen-set read or write failed mid-tick.
    StoreFailed,
}

impl TickOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TickOutcome::SourceUnavailable => "source_unavailable",
            TickOutcome::SinkUnavailable => "sink_unavailable",
            TickOutcome::FetchFailed => "fetch_failed",
            TickOutcome::NoPost => "no_post",
            TickOutcome::MissingId => "missing_id",
            TickOutcome::AlreadySeen => "already_seen",
            TickOutcome::RecordedEmptyText => "recorded_empty_text",
            TickOutcome::WouldPublish => "would_publish",
            TickOutcome::Published => "published",
            TickOutcome::PublishFailed => "publish_failed",
            TickOutcome::StoreFailed => "store_failed",
        }
    }
}

impl std::fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// JSON-serializable report of one tick, returned by the manual trigger
/// endpoint and logged by the poll loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    pub timestamp: i64,
    pub status: TickOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TickReport {
    pub fn new(status: TickOutcome) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp(),
            status,
            source_id: None,
            sink_id: None,
            error: None,
        }
    }

    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    pub fn with_sink_id(mut self, sink_id: impl Into<String>) -> Self {
        self.sink_id = Some(sink_id.into());
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}
