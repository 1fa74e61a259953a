//! HTTP status surface
//!
//! A small axum router sharing the `Bridge` with the poll loop:
//!
//! * `GET /` - HTML dashboard with the most recently mirrored posts
//! * `GET /health` - liveness probe, `{"status":"ok"}`
//! * `GET /run-now` - dry tick, reports what a tick would do
//! * `POST /run-now` - full tick, outside the regular poll schedule
//!
//! Tick serialization lives in the bridge itself, so a manual trigger
//! racing the poll loop can never publish the same post twice.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

use crate::bridge::Bridge;
use crate::types::TickReport;

/// Rows shown on the dashboard.
const DASHBOARD_LIMIT: usize = 10;

pub fn router(bridge: Arc<Bridge>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health))
        .route("/run-now", get(run_dry).post(run_now))
        .with_state(bridge)
}

async fn health(State(bridge): State<Arc<Bridge>>) -> Json<serde_json::Value> {
    let mirrored = bridge.store().count().await.unwrap_or(-1);
    Json(serde_json::json!({ "status": "ok", "mirrored": mirrored }))
}

/// Tick reports always come back as 200; the outcome, including
/// failures, lives in the `status` field of the body.
async fn run_dry(State(bridge): State<Arc<Bridge>>) -> Json<TickReport> {
    Json(bridge.run_dry().await)
}

async fn run_now(State(bridge): State<Arc<Bridge>>) -> Json<TickReport> {
    Json(bridge.run_tick().await)
}

async fn dashboard(State(bridge): State<Arc<Bridge>>) -> Result<Html<String>, StatusCode> {
    let rows = bridge
        .store()
        .recent(DASHBOARD_LIMIT)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let total = bridge
        .store()
        .count()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut body = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>skybridge</title>\n\
         <style>\n\
         body { font-family: sans-serif; margin: 2em; }\n\
         table { border-collapse: collapse; }\n\
         th, td { border: 1px solid #ccc; padding: 0.4em 0.8em; text-align: left; }\n\
         .muted { color: #888; }\n\
         </style>\n</head>\n<body>\n",
    );

    body.push_str("<h1>skybridge</h1>\n");
    body.push_str(&format!("<p>{} posts mirrored in total.</p>\n", total));

    if rows.is_empty() {
        body.push_str("<p class=\"muted\">Nothing mirrored yet.</p>\n");
    } else {
        body.push_str(
            "<table>\n<tr><th>Recorded (UTC)</th><th>Source post</th><th>Published text</th></tr>\n",
        );
        for row in &rows {
            let recorded = chrono::DateTime::from_timestamp(row.recorded_at, 0)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| row.recorded_at.to_string());
            let text = match &row.published_text {
                Some(text) => html_escape::encode_text(text).into_owned(),
                None => "<span class=\"muted\">(no text, skipped)</span>".to_string(),
            };
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                html_escape::encode_text(&recorded),
                html_escape::encode_text(&row.source_id),
                text
            ));
        }
        body.push_str("</table>\n");
    }

    body.push_str("</body>\n</html>\n");
    Ok(Html(body))
}
