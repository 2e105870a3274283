// tests/retry_timing.rs
//
// Backoff schedule with the tokio clock paused: delays are exact.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use fear_greed_menubar::client::{SnapshotSource, DEFAULT_MAX_RETRIES};
use fear_greed_menubar::{AssetClass, FetchError, Reading, SentimentSnapshot};

/// Fails `fail_first` times (with status 500 + attempt index), then succeeds.
struct Flaky {
    fail_first: usize,
    attempts: Mutex<Vec<Instant>>,
}

impl Flaky {
    fn new(fail_first: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_first,
            attempts: Mutex::new(Vec::new()),
        })
    }

    fn gaps(&self) -> Vec<Duration> {
        let a = self.attempts.lock();
        a.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

#[async_trait]
impl SnapshotSource for Flaky {
    async fn fetch(&self, _asset: AssetClass) -> Result<SentimentSnapshot, FetchError> {
        let n = {
            let mut a = self.attempts.lock();
            a.push(Instant::now());
            a.len() - 1
        };
        if n < self.fail_first {
            return Err(FetchError::Http {
                status: 500 + n as u16,
            });
        }
        Ok(SentimentSnapshot {
            current: Reading::new(55.0, "Neutral", chrono::Utc::now())?,
            historical: Default::default(),
        })
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_make_four_attempts_with_doubling_delays() {
    let src = Flaky::new(usize::MAX);
    let err = src
        .fetch_with_retry(AssetClass::Stock, DEFAULT_MAX_RETRIES)
        .await
        .unwrap_err();

    assert_eq!(src.attempts.lock().len(), 4);
    // last attempt's error is the one returned
    assert_eq!(err, FetchError::Http { status: 503 });
    assert_eq!(
        src.gaps(),
        vec![
            Duration::from_millis(1000),
            Duration::from_millis(2000),
            Duration::from_millis(4000),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn success_on_third_attempt_stops_retrying() {
    let src = Flaky::new(2);
    let started = Instant::now();
    let s = src
        .fetch_with_retry(AssetClass::Crypto, DEFAULT_MAX_RETRIES)
        .await
        .expect("third attempt succeeds");

    assert_eq!(s.current.rounded(), 55);
    assert_eq!(src.attempts.lock().len(), 3);
    assert_eq!(started.elapsed(), Duration::from_millis(3000));
}
