//! Display surface: the dropdown panel's model.
//!
//! A surface catches up from [`LocalCache`] when it attaches, then follows the
//! [`PublishChannel`]. Events published before attach are never replayed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::band::Band;
use crate::cache::LocalCache;
use crate::gauge::{GaugeFrame, GaugePresenter};
use crate::i18n::{t, translate_status};
use crate::model::{AssetClass, Language, Reading, SentimentSnapshot, HISTORICAL_PERIODS};
use crate::publish::{PublishChannel, PushEvent, Subscription};

pub const MISSING: &str = "--";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRow {
    pub period: &'static str,
    pub label: String,
    pub text: String,
    pub band: Option<Band>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceView {
    pub heading: String,
    pub index_type: AssetClass,
    pub value_label: String,
    pub status: String,
    pub band: Option<Band>,
    pub gauge: Option<GaugeFrame>,
    pub historical_heading: String,
    pub historical: Vec<HistoricalRow>,
    pub last_updated: Option<String>,
    pub stale: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct DisplaySurface {
    language: Language,
    asset_class: AssetClass,
    snapshot: Option<SentimentSnapshot>,
    gauge: GaugePresenter,
    stale: bool,
    error: Option<String>,
    subscription: Subscription,
}

impl DisplaySurface {
    /// Subscribe first, then read the cache, so an update landing in between
    /// is still delivered.
    pub fn attach(
        channel: &PublishChannel,
        cache: &LocalCache,
        language: Language,
        stale_after: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let subscription = channel.subscribe();
        let mut surface = Self {
            language,
            asset_class: AssetClass::default(),
            snapshot: None,
            gauge: GaugePresenter::new(),
            stale: false,
            error: None,
            subscription,
        };
        if let Some(cached) = cache.load() {
            surface.stale = cached.is_stale(now, stale_after);
            surface.asset_class = cached.asset_class;
            surface.gauge.snap_to(cached.snapshot.current.value());
            surface.gauge.set_status(cached.snapshot.current.status());
            surface.snapshot = Some(cached.snapshot);
            tracing::debug!(stale = surface.stale, "surface restored from cache");
        }
        surface
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn gauge(&self) -> &GaugePresenter {
        &self.gauge
    }

    pub fn gauge_mut(&mut self) -> &mut GaugePresenter {
        &mut self.gauge
    }

    pub fn handle(&mut self, event: &PushEvent, now: Instant) {
        match event {
            PushEvent::DataUpdated {
                snapshot,
                asset_class,
            } => {
                self.gauge.set_reading(&snapshot.current, now);
                self.snapshot = Some(snapshot.clone());
                self.asset_class = *asset_class;
                self.stale = false;
                self.error = None;
            }
            PushEvent::ErrorOccurred { message } => {
                self.error = Some(message.clone());
            }
            PushEvent::UpdateAvailable(_) | PushEvent::UpdateDownloadProgress(_) => {}
        }
    }

    /// Apply everything queued so far without waiting. Returns the count.
    pub fn pump(&mut self, now: Instant) -> usize {
        let mut n = 0;
        while let Some(ev) = self.subscription.try_recv() {
            self.handle(&ev, now);
            n += 1;
        }
        n
    }

    /// Wait for the next event and apply it. `None` once the channel is gone.
    pub async fn next(&mut self) -> Option<PushEvent> {
        let ev = self.subscription.recv().await?;
        self.handle(&ev, Instant::now());
        Some(ev)
    }

    pub fn view(&self, now: Instant) -> SurfaceView {
        let lang = self.language;
        let current = self.snapshot.as_ref().map(|s| &s.current);

        let status = match current {
            Some(r) => {
                let s = translate_status(r.status(), lang);
                if self.stale {
                    format!("{s} ({})", t(lang, "cached"))
                } else {
                    s.to_string()
                }
            }
            None => t(lang, "loading").to_string(),
        };

        let historical = HISTORICAL_PERIODS
            .iter()
            .map(|&(period, key)| {
                let entry = self.snapshot.as_ref().and_then(|s| s.historical.get(period));
                HistoricalRow {
                    period,
                    label: t(lang, key).to_string(),
                    text: entry.map_or_else(|| MISSING.to_string(), |r| reading_text(r, lang)),
                    band: entry.map(|r| Band::classify(r.value())),
                }
            })
            .collect();

        SurfaceView {
            heading: t(lang, "currentIndex").to_string(),
            index_type: self.asset_class,
            value_label: current.map_or_else(|| MISSING.to_string(), |r| r.rounded().to_string()),
            status,
            band: current.map(|r| Band::classify(r.value())),
            gauge: self.gauge.frame(now),
            historical_heading: t(lang, "historicalData").to_string(),
            historical,
            last_updated: current
                .map(|r| format!("{}: {}", t(lang, "lastUpdated"), format_timestamp(r.timestamp()))),
            stale: self.stale,
            error: self.error.clone(),
        }
    }

    pub fn detach(self) {
        self.subscription.unsubscribe();
    }
}

fn reading_text(r: &Reading, lang: Language) -> String {
    format!("{} ({})", r.rounded(), translate_status(r.status(), lang))
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}
