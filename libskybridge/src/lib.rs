//! Skybridge - mirror the newest post of a Bluesky account to X
//!
//! This library provides the core functionality for the skybridge daemon:
//! a persisted seen-set of already-mirrored post identifiers, platform
//! clients for the Bluesky read side and the X write side, the publish
//! decision engine that ties them together, and a small HTTP status
//! surface.

pub mod bridge;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod logging;
pub mod platforms;
pub mod types;

// Re-export commonly used types
pub use bridge::Bridge;
pub use config::Config;
pub use db::SeenStore;
pub use error::{BridgeError, Result};
pub use types::{MirrorCandidate, SeenRecord, TickOutcome, TickReport};
