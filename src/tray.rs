//! Tray presentation: reading → title, tooltip and a color-coded badge icon.
//!
//! Icon painting may fail on hosts without a usable canvas; the presenter then
//! returns a text-only view. Rendering problems are never propagated.

use serde::Serialize;
use thiserror::Error;

use crate::band::Band;
use crate::model::{AssetClass, Reading};
use crate::publish::PushEvent;

pub const TRAY_ICON_SIZE: u32 = 22;
pub const LOADING_TITLE: &str = "Loading...";
pub const DEFAULT_TOOLTIP: &str = "Fear & Greed Index";

/// Straight RGBA8 bitmap, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayIcon {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TrayIcon {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]]
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("icon canvas unavailable: {0}")]
    Unavailable(String),
}

pub trait IconPainter: Send + Sync {
    fn paint(&self, rounded: i64, band: Band) -> Result<TrayIcon, RenderError>;
}

/// Filled circle in the band color with a 1px white ring. The number itself is
/// carried by the tray title.
#[derive(Debug, Clone, Copy)]
pub struct BadgePainter {
    pub size: u32,
}

impl Default for BadgePainter {
    fn default() -> Self {
        Self {
            size: TRAY_ICON_SIZE,
        }
    }
}

impl IconPainter for BadgePainter {
    fn paint(&self, _rounded: i64, band: Band) -> Result<TrayIcon, RenderError> {
        if self.size < 4 {
            return Err(RenderError::Unavailable(format!("size {} too small", self.size)));
        }
        let size = self.size;
        let center = size as f64 / 2.0;
        let radius = center - 1.0;
        let (r, g, b) = band.rgb();
        let mut rgba = vec![0u8; (size * size * 4) as usize];

        for y in 0..size {
            for x in 0..size {
                let dx = x as f64 + 0.5 - center;
                let dy = y as f64 + 0.5 - center;
                let d = (dx * dx + dy * dy).sqrt();
                let px = if d <= radius - 1.0 {
                    [r, g, b, 0xFF]
                } else if d <= radius {
                    [0xFF, 0xFF, 0xFF, 0xFF]
                } else {
                    continue;
                };
                let i = ((y * size + x) * 4) as usize;
                rgba[i..i + 4].copy_from_slice(&px);
            }
        }

        Ok(TrayIcon {
            width: size,
            height: size,
            rgba,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrayView {
    pub title: String,
    pub tooltip: String,
    pub band: Option<Band>,
    pub color: Option<&'static str>,
    #[serde(skip)]
    pub icon: Option<TrayIcon>,
}

impl TrayView {
    pub fn loading() -> Self {
        Self {
            title: LOADING_TITLE.to_string(),
            tooltip: DEFAULT_TOOLTIP.to_string(),
            band: None,
            color: None,
            icon: None,
        }
    }

    pub fn is_text_only(&self) -> bool {
        self.icon.is_none()
    }
}

/// Host-side tray handle. The native shell implements this.
pub trait TraySurface: Send {
    fn apply(&mut self, view: &TrayView);
}

/// Tray stand-in that only logs; used when no native tray is attached.
#[derive(Debug, Default)]
pub struct LogTray;

impl TraySurface for LogTray {
    fn apply(&mut self, view: &TrayView) {
        tracing::info!(
            target: "tray",
            title = %view.title,
            tooltip = %view.tooltip,
            icon = !view.is_text_only(),
            "tray updated"
        );
    }
}

pub struct TrayPresenter {
    painter: Box<dyn IconPainter>,
}

impl Default for TrayPresenter {
    fn default() -> Self {
        Self::new(Box::new(BadgePainter::default()))
    }
}

impl TrayPresenter {
    pub fn new(painter: Box<dyn IconPainter>) -> Self {
        Self { painter }
    }

    pub fn present(&self, reading: &Reading, asset: AssetClass) -> TrayView {
        let rounded = reading.rounded();
        let band = Band::classify(reading.value());
        let icon = match self.painter.paint(rounded, band) {
            Ok(icon) => Some(icon),
            Err(e) => {
                tracing::warn!(target: "tray", error = %e, "icon rendering failed, text-only tray");
                None
            }
        };
        TrayView {
            title: rounded.to_string(),
            tooltip: format!(
                "{} Fear & Greed Index: {} ({})",
                asset.display_name(),
                rounded,
                reading.status()
            ),
            band: Some(band),
            color: Some(band.color_hex()),
            icon,
        }
    }

    /// Only `DataUpdated` changes the tray; errors leave the last view in place.
    pub fn handle_event(&self, event: &PushEvent) -> Option<TrayView> {
        match event {
            PushEvent::DataUpdated {
                snapshot,
                asset_class,
            } => Some(self.present(&snapshot.current, *asset_class)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct BrokenCanvas;

    impl IconPainter for BrokenCanvas {
        fn paint(&self, _: i64, _: Band) -> Result<TrayIcon, RenderError> {
            Err(RenderError::Unavailable("no font".into()))
        }
    }

    fn reading(v: f64, status: &str) -> Reading {
        Reading::new(v, status, Utc::now()).unwrap()
    }

    #[test]
    fn title_and_tooltip_use_rounded_value() {
        let view = TrayPresenter::default().present(&reading(72.4, "Greed"), AssetClass::Stock);
        assert_eq!(view.title, "72");
        assert_eq!(view.tooltip, "Stock Market Fear & Greed Index: 72 (Greed)");
        assert_eq!(view.band, Some(Band::Greed));
        assert_eq!(view.color, Some("#10B981"));
        assert!(!view.is_text_only());

        let view = TrayPresenter::default().present(&reading(17.6, "Extreme Fear"), AssetClass::Crypto);
        assert_eq!(view.title, "18");
        assert_eq!(view.tooltip, "Crypto Fear & Greed Index: 18 (Extreme Fear)");
    }

    #[test]
    fn painter_failure_degrades_to_text() {
        let p = TrayPresenter::new(Box::new(BrokenCanvas));
        let view = p.present(&reading(50.0, "Neutral"), AssetClass::Stock);
        assert!(view.is_text_only());
        assert_eq!(view.title, "50");
        assert_eq!(view.band, Some(Band::Neutral));
    }

    #[test]
    fn badge_has_band_color_at_center_and_clear_corners() {
        let icon = BadgePainter::default().paint(90, Band::ExtremeGreed).unwrap();
        assert_eq!((icon.width, icon.height), (22, 22));
        assert_eq!(icon.rgba.len(), 22 * 22 * 4);
        assert_eq!(icon.pixel(11, 11), [0x05, 0x96, 0x69, 0xFF]);
        assert_eq!(icon.pixel(0, 0)[3], 0);
        assert_eq!(icon.pixel(21, 21)[3], 0);
        // ring on the horizontal edge of the circle
        assert_eq!(icon.pixel(1, 11), [0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn tiny_canvas_is_a_render_error() {
        assert!(BadgePainter { size: 2 }.paint(1, Band::Fear).is_err());
    }

    #[test]
    fn errors_do_not_change_tray() {
        let p = TrayPresenter::default();
        let ev = PushEvent::ErrorOccurred {
            message: "Request timeout".into(),
        };
        assert!(p.handle_event(&ev).is_none());
        assert_eq!(TrayView::loading().title, "Loading...");
    }
}
