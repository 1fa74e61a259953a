//! Mock source and sink implementations for testing
//!
//! Both sides record call counts and captured content so tests can
//! verify the decision engine's publish/skip behavior without
//! credentials or network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, Result};
use crate::platforms::{SinkPublisher, SourceFeed};
use crate::types::MirrorCandidate;

/// Mock source feed returning a configurable candidate.
#[derive(Clone)]
pub struct MockFeed {
    candidate: Arc<Mutex<Option<MirrorCandidate>>>,
    error: Option<String>,
    fetch_calls: Arc<Mutex<usize>>,
}

impl MockFeed {
    /// A feed that yields the given candidate on every fetch.
    pub fn returning(candidate: MirrorCandidate) -> Self {
        Self {
            candidate: Arc::new(Mutex::new(Some(candidate))),
            error: None,
            fetch_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// A feed for an account with no posts.
    pub fn empty() -> Self {
        Self {
            candidate: Arc::new(Mutex::new(None)),
            error: None,
            fetch_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// A feed whose fetch always fails with a network error.
    pub fn failing(error: &str) -> Self {
        Self {
            candidate: Arc::new(Mutex::new(None)),
            error: Some(error.to_string()),
            fetch_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Replace the candidate returned by subsequent fetches.
    pub fn set_candidate(&self, candidate: Option<MirrorCandidate>) {
        *self.candidate.lock().unwrap() = candidate;
    }

    pub fn fetch_call_count(&self) -> usize {
        *self.fetch_calls.lock().unwrap()
    }
}

#[async_trait]
impl SourceFeed for MockFeed {
    async fn fetch_latest(&self) -> Result<Option<MirrorCandidate>> {
        *self.fetch_calls.lock().unwrap() += 1;

        if let Some(error) = &self.error {
            return Err(PlatformError::Network(error.clone()).into());
        }

        Ok(self.candidate.lock().unwrap().clone())
    }

    fn name(&self) -> &str {
        "mock-feed"
    }
}

/// Mock sink publisher with configurable success and character limit.
#[derive(Clone)]
pub struct MockSink {
    succeeds: bool,
    error: Option<String>,
    character_limit: usize,
    published: Arc<Mutex<Vec<String>>>,
    publish_calls: Arc<Mutex<usize>>,
}

impl MockSink {
    /// A sink that accepts everything, with the X character limit.
    pub fn success() -> Self {
        Self {
            succeeds: true,
            error: None,
            character_limit: 280,
            published: Arc::new(Mutex::new(Vec::new())),
            publish_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// A sink that rejects every publish with a posting error.
    pub fn failure(error: &str) -> Self {
        Self {
            succeeds: false,
            error: Some(error.to_string()),
            character_limit: 280,
            published: Arc::new(Mutex::new(Vec::new())),
            publish_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Override the advertised character limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.character_limit = limit;
        self
    }

    pub fn publish_call_count(&self) -> usize {
        *self.publish_calls.lock().unwrap()
    }

    /// Everything successfully published, in order.
    pub fn published(&self) -> Vec<String> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl SinkPublisher for MockSink {
    async fn publish(&self, text: &str) -> Result<String> {
        *self.publish_calls.lock().unwrap() += 1;

        if self.succeeds {
            self.published.lock().unwrap().push(text.to_string());
            let id = format!("mock-{}", uuid::Uuid::new_v4());
            Ok(id)
        } else {
            let error = self
                .error
                .clone()
                .unwrap_or_else(|| "Mock publish failed".to_string());
            Err(PlatformError::Posting(error).into())
        }
    }

    fn name(&self) -> &str {
        "mock-sink"
    }

    fn character_limit(&self) -> usize {
        self.character_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_feed_returning() {
        let feed = MockFeed::returning(MirrorCandidate::new("at://a/1", "hello"));

        let candidate = feed.fetch_latest().await.unwrap().unwrap();
        assert_eq!(candidate.source_id, "at://a/1");
        assert_eq!(candidate.raw_text, "hello");
        assert_eq!(feed.fetch_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_feed_empty_and_failing() {
        let feed = MockFeed::empty();
        assert!(feed.fetch_latest().await.unwrap().is_none());

        let feed = MockFeed::failing("connection reset");
        let err = feed.fetch_latest().await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_mock_sink_success_captures_content() {
        let sink = MockSink::success();
        let id = sink.publish("mirrored text").await.unwrap();
        assert!(id.starts_with("mock-"));
        assert_eq!(sink.publish_call_count(), 1);
        assert_eq!(sink.published(), vec!["mirrored text".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_sink_failure_captures_nothing() {
        let sink = MockSink::failure("rejected");
        assert!(sink.publish("text").await.is_err());
        assert_eq!(sink.publish_call_count(), 1);
        assert!(sink.published().is_empty());
    }
}
