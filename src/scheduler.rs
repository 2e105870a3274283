//! Repeating refresh timer.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::context::AppContext;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

pub struct RefreshScheduler;

impl RefreshScheduler {
    /// Tick every `period`, running one cycle for the selected asset class.
    /// The immediate first tick is consumed without fetching because startup
    /// does its own initial fetch. Exits once the context is gone.
    pub fn spawn(ctx: Weak<AppContext>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(ctx) = ctx.upgrade() else {
                    tracing::debug!(target: "refresh", "context dropped, timer exiting");
                    break;
                };
                tracing::debug!(target: "refresh", period_secs = period.as_secs(), "timer fired");
                // errors are already published and logged by the cycle
                let _ = ctx.refresh_selected().await;
            }
        })
    }
}
