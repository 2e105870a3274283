//! Demo: fetch one snapshot and print the gauge animating towards it.
//! Without a reachable upstream, pass a target value as the first argument.

use std::time::{Duration, Instant};

use fear_greed_menubar::client::SnapshotSource;
use fear_greed_menubar::config::AppConfig;
use fear_greed_menubar::gauge::GaugePresenter;
use fear_greed_menubar::{AssetClass, SentimentClient};

const START_VALUE: f64 = 50.0;
const BAR_WIDTH: usize = 40;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let cfg = AppConfig::load_default()?;

    let mut gauge = GaugePresenter::new();
    gauge.snap_to(START_VALUE);

    let now = Instant::now();
    match std::env::args().nth(1).and_then(|a| a.parse::<f64>().ok()) {
        Some(v) => gauge.set_target(v.clamp(0.0, 100.0), now),
        None => {
            let client = SentimentClient::from_config(&cfg)?;
            let snapshot = client.fetch(AssetClass::Stock).await?;
            println!(
                "{} {} ({})",
                AssetClass::Stock.display_name(),
                snapshot.current.rounded(),
                snapshot.current.status()
            );
            gauge.set_reading(&snapshot.current, now);
        }
    }

    loop {
        let now = Instant::now();
        gauge.tick(now);
        if let Some(frame) = gauge.frame(now) {
            println!("{}  {:>5.1}°", frame.render_text(BAR_WIDTH), frame.needle_angle_deg);
        }
        if !gauge.is_animating() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    println!("gauge-demo done");
    Ok(())
}
