//! Semicircular gauge: animation state machine plus frame geometry.
//!
//! Time is injected. Nothing here reads the clock, so every transition is
//! driven by `set_target(.., now)` / `tick(now)` and is reproducible in tests.

use serde::Serialize;
use std::time::{Duration, Instant};

use crate::band::Band;
use crate::model::Reading;

pub const ANIMATION_DURATION: Duration = Duration::from_millis(1000);

/// `1 - (1 - p)^3`, with `p` clamped to `[0, 1]`.
pub fn ease_out_cubic(p: f64) -> f64 {
    let p = p.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub start_value: f64,
    pub target_value: f64,
    pub start_time: Instant,
    pub duration: Duration,
}

impl AnimationState {
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start_time);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn value_at(&self, now: Instant) -> f64 {
        let p = self.progress(now);
        if p >= 1.0 {
            return self.target_value;
        }
        self.start_value + (self.target_value - self.start_value) * ease_out_cubic(p)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GaugeState {
    Empty,
    Idle(f64),
    Animating(AnimationState),
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeFrame {
    pub value: f64,
    pub label: i64,
    pub band: Band,
    pub status: String,
    /// Degrees from the left end of the semicircle; 0 at value 0, 180 at 100.
    pub needle_angle_deg: f64,
    pub fill_percent: f64,
}

impl GaugeFrame {
    fn at(value: f64, status: Option<&str>) -> Self {
        let v = value.clamp(0.0, 100.0);
        let band = Band::classify(v);
        Self {
            value: v,
            label: v.round() as i64,
            band,
            status: status.map_or_else(|| band.label().to_string(), str::to_string),
            needle_angle_deg: 180.0 * v / 100.0,
            fill_percent: v,
        }
    }

    /// One-line bar, e.g. `[##############------]  72  Greed`.
    pub fn render_text(&self, width: usize) -> String {
        let filled = ((self.fill_percent / 100.0) * width as f64).round() as usize;
        let filled = filled.min(width);
        format!(
            "[{}{}] {:>3}  {}",
            "#".repeat(filled),
            "-".repeat(width - filled),
            self.label,
            self.status
        )
    }
}

#[derive(Debug, Clone)]
pub struct GaugePresenter {
    state: GaugeState,
    duration: Duration,
    status: Option<String>,
}

impl Default for GaugePresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl GaugePresenter {
    pub fn new() -> Self {
        Self::with_duration(ANIMATION_DURATION)
    }

    pub fn with_duration(duration: Duration) -> Self {
        Self {
            state: GaugeState::Empty,
            duration,
            status: None,
        }
    }

    pub fn state(&self) -> GaugeState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, GaugeState::Animating(_))
    }

    /// Jump straight to `value` without animating.
    pub fn snap_to(&mut self, value: f64) {
        self.state = GaugeState::Idle(value);
    }

    /// New target. The first value ever seen snaps; afterwards a fresh
    /// animation starts from wherever the needle currently is.
    pub fn set_target(&mut self, target: f64, now: Instant) {
        self.state = match self.state {
            GaugeState::Empty => GaugeState::Idle(target),
            GaugeState::Idle(v) => GaugeState::Animating(AnimationState {
                start_value: v,
                target_value: target,
                start_time: now,
                duration: self.duration,
            }),
            GaugeState::Animating(anim) => GaugeState::Animating(AnimationState {
                start_value: anim.value_at(now),
                target_value: target,
                start_time: now,
                duration: self.duration,
            }),
        };
    }

    pub fn set_reading(&mut self, reading: &Reading, now: Instant) {
        self.status = Some(reading.status().to_string());
        self.set_target(reading.value(), now);
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn current_value(&self, now: Instant) -> Option<f64> {
        match self.state {
            GaugeState::Empty => None,
            GaugeState::Idle(v) => Some(v),
            GaugeState::Animating(anim) => Some(anim.value_at(now)),
        }
    }

    /// Advance to `now`; settles into `Idle(target)` once the animation is over.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        if let GaugeState::Animating(anim) = self.state {
            if anim.is_finished(now) {
                self.state = GaugeState::Idle(anim.target_value);
            }
        }
        self.current_value(now)
    }

    pub fn frame(&self, now: Instant) -> Option<GaugeFrame> {
        self.current_value(now)
            .map(|v| GaugeFrame::at(v, self.status.as_deref()))
    }
}
