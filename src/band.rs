//! Five discrete bands partitioning the 0–100 range.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

/// RGB triple.
pub type Rgb = (u8, u8, u8);

impl Band {
    pub const ALL: [Band; 5] = [
        Band::ExtremeFear,
        Band::Fear,
        Band::Neutral,
        Band::Greed,
        Band::ExtremeGreed,
    ];

    /// Upper bounds are inclusive: 25 is still ExtremeFear, 25.01 is Fear.
    pub fn classify(value: f64) -> Band {
        if value <= 25.0 {
            Band::ExtremeFear
        } else if value <= 45.0 {
            Band::Fear
        } else if value <= 55.0 {
            Band::Neutral
        } else if value <= 75.0 {
            Band::Greed
        } else {
            Band::ExtremeGreed
        }
    }

    /// Canonical upstream label.
    pub fn label(self) -> &'static str {
        match self {
            Band::ExtremeFear => "Extreme Fear",
            Band::Fear => "Fear",
            Band::Neutral => "Neutral",
            Band::Greed => "Greed",
            Band::ExtremeGreed => "Extreme Greed",
        }
    }

    pub fn from_label(label: &str) -> Option<Band> {
        Band::ALL.into_iter().find(|b| b.label() == label)
    }

    /// i18n key for the label.
    pub fn i18n_key(self) -> &'static str {
        match self {
            Band::ExtremeFear => "extremeFear",
            Band::Fear => "fear",
            Band::Neutral => "neutral",
            Band::Greed => "greed",
            Band::ExtremeGreed => "extremeGreed",
        }
    }

    /// Tray icon color.
    pub fn color_hex(self) -> &'static str {
        match self {
            Band::ExtremeFear => "#DC2626",
            Band::Fear => "#F97316",
            Band::Neutral => "#6B7280",
            Band::Greed => "#10B981",
            Band::ExtremeGreed => "#059669",
        }
    }

    pub fn rgb(self) -> Rgb {
        match self {
            Band::ExtremeFear => (0xDC, 0x26, 0x26),
            Band::Fear => (0xF9, 0x73, 0x16),
            Band::Neutral => (0x6B, 0x72, 0x80),
            Band::Greed => (0x10, 0xB9, 0x81),
            Band::ExtremeGreed => (0x05, 0x96, 0x69),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_belong_to_the_lower_band() {
        assert_eq!(Band::classify(0.0), Band::ExtremeFear);
        assert_eq!(Band::classify(25.0), Band::ExtremeFear);
        assert_eq!(Band::classify(25.5), Band::Fear);
        assert_eq!(Band::classify(45.0), Band::Fear);
        assert_eq!(Band::classify(46.0), Band::Neutral);
        assert_eq!(Band::classify(55.0), Band::Neutral);
        assert_eq!(Band::classify(56.0), Band::Greed);
        assert_eq!(Band::classify(75.0), Band::Greed);
        assert_eq!(Band::classify(75.1), Band::ExtremeGreed);
        assert_eq!(Band::classify(100.0), Band::ExtremeGreed);
    }

    #[test]
    fn bands_partition_the_range_in_order() {
        // every step lands in exactly one band and bands never go backwards
        let mut prev = Band::ExtremeFear;
        let mut seen = Vec::new();
        for i in 0..=1000 {
            let b = Band::classify(i as f64 / 10.0);
            let idx = Band::ALL.iter().position(|x| *x == b).unwrap();
            let prev_idx = Band::ALL.iter().position(|x| *x == prev).unwrap();
            assert!(idx == prev_idx || idx == prev_idx + 1, "jump at {i}");
            if !seen.contains(&b) {
                seen.push(b);
            }
            prev = b;
        }
        assert_eq!(seen, Band::ALL.to_vec());
    }

    #[test]
    fn hex_and_rgb_agree() {
        for b in Band::ALL {
            let (r, g, bl) = b.rgb();
            assert_eq!(format!("#{r:02X}{g:02X}{bl:02X}"), b.color_hex());
            assert_eq!(Band::from_label(b.label()), Some(b));
        }
        assert_eq!(Band::from_label("Panic"), None);
    }
}
