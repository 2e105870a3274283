//! Fear & Greed menubar: binary entrypoint.
//! Loads config, wires the app context, starts the tray task and the refresh
//! timer, then serves the local bridge until Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use fear_greed_menubar::config::AppConfig;
use fear_greed_menubar::context::AppContext;
use fear_greed_menubar::metrics::Metrics;
use fear_greed_menubar::tray::{LogTray, TrayPresenter};
use fear_greed_menubar::{api, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default()?;
    logging::init(config.log_format);
    tracing::info!(
        base_url = %config.base_url,
        data_dir = %config.data_dir.display(),
        refresh_secs = config.refresh_interval_secs,
        "starting"
    );

    let metrics = if config.metrics_enabled {
        Some(Metrics::init()?)
    } else {
        None
    };

    let addr = config.bridge_addr;
    let ctx = Arc::new(AppContext::from_config(config)?);

    ctx.spawn_tray(TrayPresenter::default(), Box::new(LogTray));
    ctx.start_scheduler();

    // Initial fetch; the timer skips its first tick for this reason.
    let initial = Arc::clone(&ctx);
    tokio::spawn(async move {
        let _ = initial.refresh_selected().await;
    });

    let mut app = api::router(Arc::clone(&ctx));
    if let Some(m) = &metrics {
        app = app.merge(m.router());
    }

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind bridge on {addr}"))?;
    tracing::info!(%addr, "bridge listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("bridge server")?;

    ctx.shutdown();
    Ok(())
}
