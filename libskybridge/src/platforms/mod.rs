//! Platform abstractions and implementations
//!
//! The bridge touches two external services and nothing else: a read-only
//! source feed and a write-only sink. Each side gets its own trait so the
//! decision engine can be exercised against mocks without credentials or
//! network access.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::MirrorCandidate;

pub mod bluesky;
pub mod oauth1;
pub mod x;

// Mock platforms are available for all builds (not just tests) to support
// integration tests in dependent crates.
pub mod mock;

/// Read side of the bridge.
///
/// Implementations authenticate once at construction; `fetch_latest` does
/// not re-authenticate. Upstream payloads are not fully trusted: a post
/// without a recognizable text field yields an empty `raw_text`, never an
/// error.
#[async_trait]
pub trait SourceFeed: Send + Sync {
    /// Fetch the single newest post of the watched account.
    ///
    /// Returns `Ok(None)` when the account has no posts.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Network` on connection trouble or timeout,
    /// `PlatformError::Authentication` when the session has become invalid.
    async fn fetch_latest(&self) -> Result<Option<MirrorCandidate>>;

    /// Lowercase platform identifier (e.g. "bluesky")
    fn name(&self) -> &str;
}

/// Write side of the bridge.
#[async_trait]
pub trait SinkPublisher: Send + Sync {
    /// Publish `text` and return the platform-assigned post id.
    ///
    /// Callers guarantee the text fits within `character_limit()`.
    ///
    /// # Errors
    ///
    /// Auth failures, rate limiting and network failures surface as the
    /// corresponding `PlatformError`; the caller decides whether to retry
    /// on a later tick. Implementations never retry internally.
    async fn publish(&self, text: &str) -> Result<String>;

    /// Lowercase platform identifier (e.g. "x")
    fn name(&self) -> &str;

    /// Maximum message length in characters.
    fn character_limit(&self) -> usize;
}
