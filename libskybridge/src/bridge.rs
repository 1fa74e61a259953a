//! The publish decision engine
//!
//! One `run_tick` evaluates a fixed-order state machine over the newest
//! source post and performs the bookkeeping that makes mirroring
//! idempotent: an identifier is only recorded after the sink accepted
//! the post, and it is checked before every publish attempt. Ticks are
//! serialized through an internal mutex so the poll loop and a manual
//! HTTP trigger can never double-publish the same post.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::SeenStore;
use crate::platforms::{SinkPublisher, SourceFeed};
use crate::types::{MirrorCandidate, TickOutcome, TickReport};

/// Marker appended when a post is cut down to the sink's length limit.
pub const ELLIPSIS: &str = "...";

/// Fit `text` into `limit` characters.
///
/// Texts at or under the limit pass through unmodified. Longer texts are
/// cut to `limit - 3` characters and suffixed with `"..."`, yielding
/// exactly `limit` characters. Deterministic for a given input.
pub fn truncate_to_limit(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let keep = limit.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Application context shared by the poll loop and the HTTP surface.
///
/// Either side may be absent when its startup authentication failed; the
/// bridge then reports unavailability on every tick instead of crashing.
pub struct Bridge {
    store: SeenStore,
    source: Option<Arc<dyn SourceFeed>>,
    sink: Option<Arc<dyn SinkPublisher>>,
    tick_lock: tokio::sync::Mutex<()>,
}

impl Bridge {
    pub fn new(
        store: SeenStore,
        source: Option<Arc<dyn SourceFeed>>,
        sink: Option<Arc<dyn SinkPublisher>>,
    ) -> Self {
        Self {
            store,
            source,
            sink,
            tick_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &SeenStore {
        &self.store
    }

    /// Run one full tick: fetch, decide, publish, record.
    pub async fn run_tick(&self) -> TickReport {
        self.run(false).await
    }

    /// Run one dry tick: the full pipeline except the sink call. The
    /// empty-text state still records, matching the real pipeline.
    pub async fn run_dry(&self) -> TickReport {
        self.run(true).await
    }

    async fn run(&self, dry_run: bool) -> TickReport {
        let _guard = self.tick_lock.lock().await;
        let report = self.evaluate(dry_run).await;
        self.log(&report);
        report
    }

    /// The state machine, evaluated in fixed order, first match wins.
    async fn evaluate(&self, dry_run: bool) -> TickReport {
        // 1. no reader
        let Some(source) = &self.source else {
            return TickReport::new(TickOutcome::SourceUnavailable)
                .with_error("source feed is unavailable (startup authentication failed)");
        };

        let candidate = match source.fetch_latest().await {
            Ok(Some(candidate)) => candidate,
            // 2. no post
            Ok(None) => return TickReport::new(TickOutcome::NoPost),
            Err(e) => return TickReport::new(TickOutcome::FetchFailed).with_error(e),
        };

        let MirrorCandidate {
            source_id,
            raw_text,
        } = candidate;

        // 3. no stable identifier, cannot dedup
        if source_id.trim().is_empty() {
            return TickReport::new(TickOutcome::MissingId)
                .with_error("post carries no stable identifier");
        }

        // 4. already posted
        match self.store.contains(&source_id).await {
            Ok(true) => {
                return TickReport::new(TickOutcome::AlreadySeen).with_source_id(source_id)
            }
            Ok(false) => {}
            Err(e) => {
                return TickReport::new(TickOutcome::StoreFailed)
                    .with_source_id(source_id)
                    .with_error(e)
            }
        }

        // 5. unseen but nothing to publish: record so it is never retried
        if raw_text.is_empty() {
            if let Err(e) = self.store.record(&source_id, None).await {
                return TickReport::new(TickOutcome::StoreFailed)
                    .with_source_id(source_id)
                    .with_error(e);
            }
            return TickReport::new(TickOutcome::RecordedEmptyText).with_source_id(source_id);
        }

        // 6. unseen with text: publish, record only on sink success
        let Some(sink) = &self.sink else {
            return TickReport::new(TickOutcome::SinkUnavailable)
                .with_source_id(source_id)
                .with_error("sink publisher is unavailable (startup authentication failed)");
        };

        let text = truncate_to_limit(&raw_text, sink.character_limit());

        if dry_run {
            return TickReport::new(TickOutcome::WouldPublish).with_source_id(source_id);
        }

        match sink.publish(&text).await {
            Ok(sink_id) => {
                if let Err(e) = self.store.record(&source_id, Some(&text)).await {
                    // Published but not recorded: the next tick may
                    // publish again. Surface this loudly.
                    warn!(
                        source_id = %source_id,
                        sink_id = %sink_id,
                        "published but failed to record, duplicate possible on next tick: {}",
                        e
                    );
                    return TickReport::new(TickOutcome::StoreFailed)
                        .with_source_id(source_id)
                        .with_sink_id(sink_id)
                        .with_error(e);
                }
                TickReport::new(TickOutcome::Published)
                    .with_source_id(source_id)
                    .with_sink_id(sink_id)
            }
            Err(e) => TickReport::new(TickOutcome::PublishFailed)
                .with_source_id(source_id)
                .with_error(e),
        }
    }

    fn log(&self, report: &TickReport) {
        match report.status {
            TickOutcome::Published => info!(
                source_id = report.source_id.as_deref().unwrap_or(""),
                sink_id = report.sink_id.as_deref().unwrap_or(""),
                "mirrored new post"
            ),
            TickOutcome::RecordedEmptyText => info!(
                source_id = report.source_id.as_deref().unwrap_or(""),
                "recorded post without text, nothing published"
            ),
            TickOutcome::NoPost | TickOutcome::AlreadySeen | TickOutcome::WouldPublish => {
                debug!(status = %report.status, "tick finished")
            }
            _ => warn!(
                status = %report.status,
                error = report.error.as_deref().unwrap_or(""),
                "tick failed"
            ),
        }
    }
}
