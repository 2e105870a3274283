//! Upstream client: one GET per asset class, fixed timeout, bounded retry.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use reqwest::Client;

use crate::config::AppConfig;
use crate::error::FetchError;
use crate::metrics::ensure_metrics_described;
use crate::model::{AssetClass, SentimentSnapshot};
use crate::validate::parse_snapshot;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
const BASE_DELAY_MS: u64 = 1_000;
const MAX_DELAY_MS: u64 = 30_000;

/// Anything that can produce a validated snapshot for an asset class.
/// The HTTP client is the production impl; tests plug in fakes.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self, asset: AssetClass) -> Result<SentimentSnapshot, FetchError>;

    /// `fetch` with exponential backoff; `max_retries + 1` attempts in total.
    async fn fetch_with_retry(
        &self,
        asset: AssetClass,
        max_retries: u32,
    ) -> Result<SentimentSnapshot, FetchError> {
        retry_with_backoff(max_retries, |_| self.fetch(asset)).await
    }

    fn name(&self) -> &'static str;
}

/// Delay slept after failed attempt `attempt` (0-indexed): 1s, 2s, 4s, ... capped at 30s.
pub fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u64 << attempt.min(16);
    Duration::from_millis(BASE_DELAY_MS.saturating_mul(factor).min(MAX_DELAY_MS))
}

/// Run `op` until it succeeds or `max_retries` retries have failed.
/// The error of the last attempt is returned.
pub async fn retry_with_backoff<T, F, Fut>(max_retries: u32, mut op: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut + Send,
    Fut: Future<Output = Result<T, FetchError>> + Send,
{
    let mut attempt: u32 = 0;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_retries => {
                let delay = backoff_delay(attempt);
                tracing::warn!(
                    target: "fetch",
                    attempt = attempt + 1,
                    max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[derive(Clone)]
pub struct SentimentClient {
    http: Client,
    base_url: String,
}

impl SentimentClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(concat!("fear-greed-menubar/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout.min(Duration::from_secs(4)))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("building http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, FetchError> {
        Self::new(cfg.base_url.clone(), cfg.timeout())
    }

    /// Two fixed logical resources, one per asset class.
    pub fn endpoint(&self, asset: AssetClass) -> String {
        format!("{}/api/v1/fear-greed/{}", self.base_url, asset.as_str())
    }
}

#[async_trait]
impl SnapshotSource for SentimentClient {
    async fn fetch(&self, asset: AssetClass) -> Result<SentimentSnapshot, FetchError> {
        ensure_metrics_described();
        counter!("fetch_attempts_total", "asset" => asset.as_str()).increment(1);

        let url = self.endpoint(asset);
        tracing::debug!(target: "fetch", %url, "requesting snapshot");

        let result = async {
            let resp = self
                .http
                .get(&url)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Http {
                    status: status.as_u16(),
                });
            }

            let body = resp.text().await?;
            parse_snapshot(&body, Utc::now())
        }
        .await;

        if let Err(e) = &result {
            counter!("fetch_failures_total", "asset" => asset.as_str(), "kind" => e.kind())
                .increment(1);
        }
        result
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
