// tests/api_http.rs
//
// HTTP-level tests for the local bridge Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET/POST /settings (defaults, validated generic setter)
// - POST /fetch-data then GET /cache
// - POST /index-type, /language, /launch-at-login
// - GET /tray before the first fetch
// - POST /update-events
// - GET /events (SSE framing)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use futures_util::StreamExt as _;
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use fear_greed_menubar::cache::LocalCache;
use fear_greed_menubar::config::AppConfig;
use fear_greed_menubar::settings::SettingsStore;
use fear_greed_menubar::{api, AppContext, AssetClass, FetchError, PushEvent, Reading, SentimentSnapshot, SnapshotSource};

const BODY_LIMIT: usize = 1024 * 1024;

struct Fixed(f64, &'static str);

#[async_trait]
impl SnapshotSource for Fixed {
    async fn fetch(&self, _asset: AssetClass) -> Result<SentimentSnapshot, FetchError> {
        Ok(SentimentSnapshot {
            current: Reading::new(self.0, self.1, chrono::Utc::now())?,
            historical: Default::default(),
        })
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

fn test_ctx() -> Arc<AppContext> {
    Arc::new(AppContext::new(
        AppConfig::default(),
        Arc::new(Fixed(72.0, "Greed")),
        SettingsStore::in_memory(),
        LocalCache::in_memory(),
    ))
}

async fn call(app: &Router, method: &str, uri: &str, payload: Option<Json>) -> (StatusCode, Json) {
    let body = match payload {
        Some(p) => Body::from(serde_json::to_vec(&p).expect("serialize payload")),
        None => Body::empty(),
    };
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .expect("build request");

    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, json)
}

#[tokio::test]
async fn health_returns_ok() {
    let app = api::router(test_ctx());
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");
    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.expect("read body");
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn settings_defaults_and_validated_setter() {
    let app = api::router(test_ctx());

    let (status, s) = call(&app, "GET", "/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(s, json!({"launchAtLogin": false, "indexType": "stock", "language": "en"}));

    let (_, r) = call(&app, "POST", "/settings", Some(json!({"key": "indexType", "value": "bogus"}))).await;
    assert_eq!(r, json!({"success": false, "error": "Invalid value for indexType"}));

    let (_, r) = call(&app, "POST", "/settings", Some(json!({"key": "theme", "value": "dark"}))).await;
    assert_eq!(r, json!({"success": false, "error": "Invalid setting key"}));

    let (_, r) = call(&app, "POST", "/settings", Some(json!({"key": "language", "value": "ko"}))).await;
    assert_eq!(r, json!({"success": true}));

    let (_, r) = call(&app, "POST", "/settings", Some(json!({"key": "launchAtLogin", "value": "yes"}))).await;
    assert_eq!(r, json!({"success": false, "error": "Invalid value for launchAtLogin"}));

    let (_, r) = call(&app, "POST", "/settings", Some(json!({"key": "launchAtLogin", "value": true}))).await;
    assert_eq!(r, json!({"success": true}));

    let (_, s) = call(&app, "GET", "/settings", None).await;
    assert_eq!(s["language"], "ko");
    assert_eq!(s["indexType"], "stock");
    assert_eq!(s["launchAtLogin"], true);
}

#[tokio::test]
async fn fetch_data_fills_cache() {
    let app = api::router(test_ctx());

    let (_, c) = call(&app, "GET", "/cache", None).await;
    assert_eq!(c, json!({"stale": false}));

    let (status, r) = call(&app, "POST", "/fetch-data", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(r["success"], true);
    assert_eq!(r["data"]["current"]["value"], 72.0);
    assert_eq!(r["data"]["current"]["status"], "Greed");

    let (_, c) = call(&app, "GET", "/cache", None).await;
    assert_eq!(c["snapshot"]["current"]["value"], 72.0);
    assert_eq!(c["indexType"], "stock");
    assert_eq!(c["stale"], false);
    assert!(c["capturedAtMs"].as_i64().is_some());
}

#[tokio::test]
async fn index_type_language_and_login_routes() {
    let ctx = test_ctx();
    let app = api::router(ctx.clone());

    let (_, r) = call(&app, "POST", "/index-type", Some(json!({"indexType": "forex"}))).await;
    assert_eq!(r["success"], false);
    assert_eq!(ctx.get_settings().index_type, AssetClass::Stock);

    let (_, r) = call(&app, "POST", "/index-type", Some(json!({"indexType": "crypto"}))).await;
    assert_eq!(r["success"], true);
    assert_eq!(r["data"]["current"]["value"], 72.0);
    assert_eq!(ctx.get_settings().index_type, AssetClass::Crypto);
    assert_eq!(ctx.cache().load().map(|c| c.asset_class), Some(AssetClass::Crypto));

    let (_, r) = call(&app, "POST", "/language", Some(json!({"language": "fr"}))).await;
    assert_eq!(r, json!({"success": false, "error": "Invalid value for language"}));

    let (_, r) = call(&app, "POST", "/launch-at-login", Some(json!({"enabled": true}))).await;
    assert_eq!(r, json!({"success": true}));
    assert!(ctx.get_settings().launch_at_login);
}

#[tokio::test]
async fn tray_starts_loading() {
    let app = api::router(test_ctx());
    let (_, t) = call(&app, "GET", "/tray", None).await;
    assert_eq!(t["title"], "Loading...");
    assert_eq!(t["tooltip"], "Fear & Greed Index");
    assert_eq!(t["band"], Json::Null);
}

#[tokio::test]
async fn update_events_are_forwarded() {
    let ctx = test_ctx();
    let app = api::router(ctx.clone());
    let mut sub = ctx.channel().subscribe();

    let payload = json!({"version": "1.2.0", "releaseDate": "2025-06-01"});
    let (_, r) = call(
        &app,
        "POST",
        "/update-events",
        Some(json!({"kind": "update-available", "payload": payload})),
    )
    .await;
    assert_eq!(r, json!({"success": true}));
    assert_eq!(sub.try_recv(), Some(PushEvent::UpdateAvailable(payload)));

    let (_, r) = call(&app, "POST", "/update-events", Some(json!({"kind": "restart", "payload": {}}))).await;
    assert_eq!(r["success"], false);
}

#[tokio::test]
async fn events_stream_frames_push_events() {
    let ctx = test_ctx();
    let app = api::router(ctx.clone());

    let req = Request::builder()
        .uri("/events")
        .body(Body::empty())
        .expect("build GET /events");
    let resp = app.oneshot(req).await.expect("oneshot /events");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.channel().subscriber_count(), 1);

    ctx.forward_update_event(PushEvent::UpdateDownloadProgress(json!({"percent": 42})));

    let mut stream = resp.into_body().into_data_stream();
    let chunk = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("event within 2s")
        .expect("stream open")
        .expect("chunk");
    let text = String::from_utf8(chunk.to_vec()).expect("utf8");
    assert!(text.contains("event: update-download-progress"), "{text}");
    assert!(text.contains(r#"data: {"percent":42}"#), "{text}");
}
