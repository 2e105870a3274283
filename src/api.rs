//! Local bridge API the display surface talks to.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::context::{AppContext, RefreshOutcome, BUSY_MESSAGE};
use crate::error::SettingsError;
use crate::model::{AssetClass, Language, SentimentSnapshot, Settings};
use crate::publish::PushEvent;
use crate::settings::{KEY_INDEX_TYPE, KEY_LANGUAGE};
use crate::tray::TrayView;

pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/fetch-data", post(fetch_data))
        .route("/settings", get(get_settings).post(set_setting))
        .route("/index-type", post(set_index_type))
        .route("/language", post(set_language))
        .route("/launch-at-login", post(set_launch_at_login))
        .route("/cache", get(get_cache))
        .route("/tray", get(get_tray))
        .route("/events", get(events))
        .route("/update-events", post(update_event))
        .layer(CorsLayer::very_permissive())
        .with_state(ctx)
}

#[derive(Debug, Default, Serialize)]
pub struct BridgeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SentimentSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResponse {
    fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

impl From<RefreshOutcome> for BridgeResponse {
    fn from(o: RefreshOutcome) -> Self {
        match o {
            RefreshOutcome::Updated(s) => Self {
                success: true,
                data: Some(s),
                error: None,
            },
            RefreshOutcome::Failed(e) => Self::err(e),
            RefreshOutcome::Busy => Self::err(BUSY_MESSAGE),
        }
    }
}

async fn fetch_data(State(ctx): State<Arc<AppContext>>) -> Json<BridgeResponse> {
    Json(ctx.refresh().await.into())
}

async fn get_settings(State(ctx): State<Arc<AppContext>>) -> Json<Settings> {
    Json(ctx.get_settings())
}

#[derive(Deserialize)]
struct SetSettingReq {
    key: String,
    value: Value,
}

async fn set_setting(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<SetSettingReq>,
) -> Json<BridgeResponse> {
    match ctx.set_setting(&req.key, req.value).await {
        Ok(()) => Json(BridgeResponse::ok()),
        Err(e) => Json(BridgeResponse::err(format!("{e:#}"))),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexTypeReq {
    index_type: String,
}

/// The preference is stored even if the follow-up fetch fails; `success`
/// then stays true and `error` carries the fetch failure.
async fn set_index_type(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<IndexTypeReq>,
) -> Json<BridgeResponse> {
    let Some(asset) = AssetClass::parse(&req.index_type) else {
        return Json(BridgeResponse::err(
            SettingsError::InvalidValue(KEY_INDEX_TYPE.into()).to_string(),
        ));
    };
    let resp = match ctx.set_index_type(asset).await {
        RefreshOutcome::Updated(s) => BridgeResponse {
            success: true,
            data: Some(s),
            error: None,
        },
        RefreshOutcome::Failed(e) => BridgeResponse {
            success: true,
            data: None,
            error: Some(e),
        },
        RefreshOutcome::Busy => BridgeResponse::ok(),
    };
    Json(resp)
}

#[derive(Deserialize)]
struct LanguageReq {
    language: String,
}

async fn set_language(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<LanguageReq>,
) -> Json<BridgeResponse> {
    match Language::parse(&req.language) {
        Some(lang) => {
            ctx.set_language(lang).await;
            Json(BridgeResponse::ok())
        }
        None => Json(BridgeResponse::err(
            SettingsError::InvalidValue(KEY_LANGUAGE.into()).to_string(),
        )),
    }
}

#[derive(Deserialize)]
struct LaunchReq {
    enabled: bool,
}

async fn set_launch_at_login(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<LaunchReq>,
) -> Json<BridgeResponse> {
    match ctx.set_launch_at_login(req.enabled).await {
        Ok(()) => Json(BridgeResponse::ok()),
        Err(e) => Json(BridgeResponse::err(format!("{e:#}"))),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<SentimentSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index_type: Option<AssetClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    captured_at_ms: Option<i64>,
    stale: bool,
}

async fn get_cache(State(ctx): State<Arc<AppContext>>) -> Json<CacheOut> {
    let out = match ctx.cache().load() {
        Some(c) => CacheOut {
            stale: c.is_stale(Utc::now(), ctx.config().stale_after()),
            snapshot: Some(c.snapshot),
            index_type: Some(c.asset_class),
            captured_at_ms: Some(c.captured_at_ms),
        },
        None => CacheOut {
            snapshot: None,
            index_type: None,
            captured_at_ms: None,
            stale: false,
        },
    };
    Json(out)
}

async fn get_tray(State(ctx): State<Arc<AppContext>>) -> Json<TrayView> {
    Json(ctx.tray_view())
}

/// GET /events: push events as SSE, one `event:` per push event name.
async fn events(
    State(ctx): State<Arc<AppContext>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut sub = ctx.channel().subscribe();
    tracing::debug!(subscriber = sub.id(), "sse client attached");

    let stream = async_stream::stream! {
        while let Some(ev) = sub.recv().await {
            yield Ok(Event::default().event(ev.name()).data(ev.payload_json().to_string()));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Deserialize)]
struct UpdateEventReq {
    kind: String,
    #[serde(default)]
    payload: Value,
}

async fn update_event(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<UpdateEventReq>,
) -> Json<BridgeResponse> {
    let event = match req.kind.as_str() {
        "update-available" => PushEvent::UpdateAvailable(req.payload),
        "update-download-progress" => PushEvent::UpdateDownloadProgress(req.payload),
        other => return Json(BridgeResponse::err(format!("unknown update event: {other}"))),
    };
    ctx.forward_update_event(event);
    Json(BridgeResponse::ok())
}
