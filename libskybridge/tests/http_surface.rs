//! Integration tests for the HTTP status surface.
//!
//! The router is exercised in-process with `tower::ServiceExt::oneshot`,
//! backed by an in-memory seen-set and mock platform clients.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use libskybridge::http::router;
use libskybridge::platforms::mock::{MockFeed, MockSink};
use libskybridge::types::{MirrorCandidate, TickOutcome, TickReport};
use libskybridge::{Bridge, SeenStore};

async fn test_bridge(feed: MockFeed, sink: MockSink) -> Arc<Bridge> {
    let store = SeenStore::in_memory().await.unwrap();
    Arc::new(Bridge::new(store, Some(Arc::new(feed)), Some(Arc::new(sink))))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_returns_ok_json() {
    let bridge = test_bridge(MockFeed::empty(), MockSink::success()).await;
    let app = router(bridge);

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["mirrored"], 0);
}

#[tokio::test]
async fn post_run_now_publishes_and_reports() {
    let sink = MockSink::success();
    let feed = MockFeed::returning(MirrorCandidate::new("at://a/1", "hello world"));
    let bridge = test_bridge(feed, sink.clone()).await;
    let app = router(bridge.clone());

    let response = app
        .oneshot(Request::post("/run-now").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report: TickReport = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(report.status, TickOutcome::Published);
    assert_eq!(report.source_id.as_deref(), Some("at://a/1"));
    assert_eq!(sink.published(), vec!["hello world".to_string()]);
    assert!(bridge.store().contains("at://a/1").await.unwrap());
}

#[tokio::test]
async fn get_run_now_is_a_dry_run() {
    let sink = MockSink::success();
    let feed = MockFeed::returning(MirrorCandidate::new("at://a/2", "not published"));
    let bridge = test_bridge(feed, sink.clone()).await;
    let app = router(bridge.clone());

    let response = app
        .oneshot(Request::get("/run-now").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report: TickReport = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(report.status, TickOutcome::WouldPublish);
    assert_eq!(sink.publish_call_count(), 0);
    assert_eq!(bridge.store().count().await.unwrap(), 0);
}

#[tokio::test]
async fn run_now_reports_failures_in_the_body() {
    let bridge = test_bridge(MockFeed::failing("connection reset"), MockSink::success()).await;
    let app = router(bridge);

    let response = app
        .oneshot(Request::post("/run-now").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report: TickReport = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(report.status, TickOutcome::FetchFailed);
    assert!(report.error.unwrap().contains("connection reset"));
}

#[tokio::test]
async fn run_now_twice_publishes_once() {
    let sink = MockSink::success();
    let feed = MockFeed::returning(MirrorCandidate::new("at://a/3", "only once"));
    let bridge = test_bridge(feed, sink.clone()).await;
    let app = router(bridge);

    let first = app
        .clone()
        .oneshot(Request::post("/run-now").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let second = app
        .oneshot(Request::post("/run-now").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let first: TickReport = serde_json::from_str(&body_string(first).await).unwrap();
    let second: TickReport = serde_json::from_str(&body_string(second).await).unwrap();
    assert_eq!(first.status, TickOutcome::Published);
    assert_eq!(second.status, TickOutcome::AlreadySeen);
    assert_eq!(sink.publish_call_count(), 1);
}

#[tokio::test]
async fn dashboard_empty_store() {
    let bridge = test_bridge(MockFeed::empty(), MockSink::success()).await;
    let app = router(bridge);

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("skybridge"));
    assert!(body.contains("0 posts mirrored"));
    assert!(body.contains("Nothing mirrored yet."));
}

#[tokio::test]
async fn dashboard_lists_mirrored_posts_escaped() {
    let bridge = test_bridge(MockFeed::empty(), MockSink::success()).await;
    bridge
        .store()
        .record("at://a/4", Some("tags <b>are</b> & stay text"))
        .await
        .unwrap();
    bridge.store().record("at://a/5", None).await.unwrap();
    let app = router(bridge);

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("2 posts mirrored"));
    assert!(body.contains("at://a/4"));
    assert!(body.contains("tags &lt;b&gt;are&lt;/b&gt; &amp; stay text"));
    assert!(!body.contains("<b>are</b>"));
    assert!(body.contains("(no text, skipped)"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let bridge = test_bridge(MockFeed::empty(), MockSink::success()).await;
    let app = router(bridge);

    let response = app
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
