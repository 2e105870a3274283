//! Process-scoped application state and the fetch-publish cycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::{counter, gauge};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::cache::LocalCache;
use crate::client::{SentimentClient, SnapshotSource};
use crate::config::AppConfig;
use crate::error::{FetchError, SettingsError};
use crate::model::{AssetClass, Language, SentimentSnapshot, Settings};
use crate::publish::{PublishChannel, PushEvent};
use crate::scheduler::RefreshScheduler;
use crate::settings::{SettingsStore, KEY_LAUNCH_AT_LOGIN};
use crate::tray::{TrayPresenter, TraySurface, TrayView};

pub const BUSY_MESSAGE: &str = "refresh already in progress";

/// OS login-item backend. The native shell provides the real one.
pub trait LoginItem: Send + Sync {
    fn set_enabled(&self, enabled: bool) -> Result<()>;
}

/// Used when no backend is wired in; only logs.
#[derive(Debug, Default)]
pub struct LogLoginItem;

impl LoginItem for LogLoginItem {
    fn set_enabled(&self, enabled: bool) -> Result<()> {
        tracing::info!(enabled, "launch-at-login requested (no login-item backend)");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Updated(SentimentSnapshot),
    Failed(String),
    /// A cycle was already running; nothing was done.
    Busy,
}

impl From<Result<SentimentSnapshot, FetchError>> for RefreshOutcome {
    fn from(r: Result<SentimentSnapshot, FetchError>) -> Self {
        match r {
            Ok(s) => RefreshOutcome::Updated(s),
            Err(e) => RefreshOutcome::Failed(e.to_string()),
        }
    }
}

pub struct AppContext {
    config: AppConfig,
    source: Arc<dyn SnapshotSource>,
    settings: SettingsStore,
    cache: LocalCache,
    channel: PublishChannel,
    tray: Arc<RwLock<TrayView>>,
    login_item: Box<dyn LoginItem>,
    /// Cycles currently between fetch start and publish.
    active_cycles: AtomicUsize,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        source: Arc<dyn SnapshotSource>,
        settings: SettingsStore,
        cache: LocalCache,
    ) -> Self {
        Self {
            config,
            source,
            settings,
            cache,
            channel: PublishChannel::new(),
            tray: Arc::new(RwLock::new(TrayView::loading())),
            login_item: Box::new(LogLoginItem),
            active_cycles: AtomicUsize::new(0),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Production wiring: HTTP client plus stores under `config.data_dir`.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("create data dir {}", config.data_dir.display()))?;
        let client = SentimentClient::from_config(&config).context("build upstream client")?;
        let settings = SettingsStore::in_dir(&config.data_dir);
        let cache = LocalCache::in_dir(&config.data_dir);
        Ok(Self::new(config, Arc::new(client), settings, cache))
    }

    pub fn with_login_item(mut self, login_item: Box<dyn LoginItem>) -> Self {
        self.login_item = login_item;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn channel(&self) -> &PublishChannel {
        &self.channel
    }

    pub fn tray_view(&self) -> TrayView {
        self.tray.read().clone()
    }

    /// fetch → validate → cache write → publish, strictly in that order.
    /// Failure after all retries publishes one `ErrorOccurred` and leaves the
    /// cache untouched.
    pub async fn run_cycle(&self, asset: AssetClass) -> Result<SentimentSnapshot, FetchError> {
        self.active_cycles.fetch_add(1, Ordering::AcqRel);
        let _active = ActiveCycle(&self.active_cycles);
        self.cycle(asset).await
    }

    pub fn is_cycle_active(&self) -> bool {
        self.active_cycles.load(Ordering::Acquire) > 0
    }

    async fn cycle(&self, asset: AssetClass) -> Result<SentimentSnapshot, FetchError> {
        counter!("refresh_cycles_total", "index_type" => asset.as_str()).increment(1);
        tracing::info!(target: "refresh", index_type = %asset, source = self.source.name(), "refresh started");

        match self.source.fetch_with_retry(asset, self.config.max_retries).await {
            Ok(snapshot) => {
                if let Err(e) = self.cache.store(&snapshot, asset, Utc::now()).await {
                    tracing::warn!(target: "refresh", error = %e, "cache write failed");
                }
                gauge!("sentiment_last_value", "index_type" => asset.as_str())
                    .set(snapshot.current.value());
                let delivered = self.channel.publish(PushEvent::DataUpdated {
                    snapshot: snapshot.clone(),
                    asset_class: asset,
                });
                tracing::info!(
                    target: "refresh",
                    index_type = %asset,
                    value = snapshot.current.value(),
                    status = snapshot.current.status(),
                    delivered,
                    "refresh published"
                );
                Ok(snapshot)
            }
            Err(e) => {
                counter!("refresh_errors_total", "kind" => e.kind()).increment(1);
                tracing::error!(target: "refresh", index_type = %asset, error = %e, "refresh failed after retries");
                self.channel.publish(PushEvent::ErrorOccurred {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Cycle for the currently selected asset class. Unguarded; the timer uses this.
    pub async fn refresh_selected(&self) -> Result<SentimentSnapshot, FetchError> {
        self.run_cycle(self.settings.index_type()).await
    }

    /// Manual refresh. Dropped when any cycle is running, whatever started it.
    pub async fn refresh(&self) -> RefreshOutcome {
        if self
            .active_cycles
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(target: "refresh", "manual refresh dropped, cycle in flight");
            return RefreshOutcome::Busy;
        }
        let _active = ActiveCycle(&self.active_cycles);
        self.cycle(self.settings.index_type()).await.into()
    }

    /// Persist the new class and run one cycle for it right away. The timer
    /// phase is left alone.
    pub async fn set_index_type(&self, asset: AssetClass) -> RefreshOutcome {
        self.settings.set_index_type(asset).await;
        self.run_cycle(asset).await.into()
    }

    pub async fn set_language(&self, lang: Language) {
        self.settings.set_language(lang).await;
    }

    /// The OS hook runs first; the preference is only stored if it succeeds.
    pub async fn set_launch_at_login(&self, enabled: bool) -> Result<()> {
        self.login_item
            .set_enabled(enabled)
            .context("login item backend")?;
        self.settings.set_launch_at_login(enabled).await;
        Ok(())
    }

    /// Generic setter. `launchAtLogin` still goes through the login-item hook.
    pub async fn set_setting(&self, key: &str, value: Value) -> Result<()> {
        if key == KEY_LAUNCH_AT_LOGIN {
            let enabled = value
                .as_bool()
                .ok_or_else(|| SettingsError::InvalidValue(key.to_string()))?;
            return self.set_launch_at_login(enabled).await;
        }
        self.settings.set_setting(key, value).await?;
        Ok(())
    }

    pub fn get_settings(&self) -> Settings {
        self.settings.get_settings()
    }

    /// Opaque update-channel payloads go straight to subscribers.
    pub fn forward_update_event(&self, event: PushEvent) -> usize {
        self.channel.publish(event)
    }

    /// Subscribe a tray task. The surface gets the current view immediately.
    pub fn spawn_tray(&self, presenter: TrayPresenter, mut surface: Box<dyn TraySurface>) {
        let mut sub = self.channel.subscribe();
        let tray = Arc::clone(&self.tray);
        surface.apply(&tray.read());

        let handle = tokio::spawn(async move {
            while let Some(event) = sub.recv().await {
                if let Some(view) = presenter.handle_event(&event) {
                    surface.apply(&view);
                    *tray.write() = view;
                }
            }
        });
        self.tasks.lock().push(handle);
    }

    /// Start the repeating refresh timer.
    pub fn start_scheduler(self: &Arc<Self>) {
        let period = self.config.refresh_interval();
        let handle = RefreshScheduler::spawn(Arc::downgrade(self), period);
        self.tasks.lock().push(handle);
    }

    /// Abort the timer and tray tasks. In-flight retry delays die with them.
    pub fn shutdown(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for t in &tasks {
            t.abort();
        }
        tracing::info!(tasks = tasks.len(), "background tasks stopped");
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        for t in self.tasks.get_mut().drain(..) {
            t.abort();
        }
    }
}

struct ActiveCycle<'a>(&'a AtomicUsize);

impl Drop for ActiveCycle<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
