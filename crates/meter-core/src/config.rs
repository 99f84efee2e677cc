//! Tunable thresholds and weights for attention detection.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signal::Signal;

/// Invalid attention configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A signal weight was negative or not a number.
    #[error("weight for {signal} must be a non-negative number, got {value}")]
    InvalidWeight { signal: Signal, value: f64 },

    /// A duration that must be positive was zero or negative.
    #[error("{field} must be positive, got {value}")]
    NonPositiveDuration { field: &'static str, value: i64 },

    /// A duration exceeded the longest supported value.
    #[error("{field} must be at most {max} ms, got {value}")]
    DurationTooLong {
        field: &'static str,
        value: i64,
        max: i64,
    },

    /// The activity threshold was outside the score range.
    #[error("activity threshold must be between 0 and 100, got {value}")]
    ThresholdOutOfRange { value: f64 },

    /// The rapid switch count was zero.
    #[error("rapid switch count must be at least 1")]
    ZeroRapidSwitchCount,
}

/// Per-channel weights used when scoring activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub mouse: f64,
    /// Typing is a strong presence signal.
    pub keyboard: f64,
    /// Lower than mouse since scrolling can be accidental.
    pub scroll: f64,
    /// Baseline weight, raised during bursts of rapid switching.
    pub tab_switch: f64,
    /// Watching is the strongest presence signal.
    pub video: f64,
    pub audio: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            mouse: 1.0,
            keyboard: 1.5,
            scroll: 0.8,
            tab_switch: 1.0,
            video: 2.0,
            audio: 1.5,
        }
    }
}

impl SignalWeights {
    pub const fn get(&self, signal: Signal) -> f64 {
        match signal {
            Signal::Mouse => self.mouse,
            Signal::Keyboard => self.keyboard,
            Signal::Scroll => self.scroll,
            Signal::TabSwitch => self.tab_switch,
            Signal::Video => self.video,
            Signal::Audio => self.audio,
        }
    }
}

/// Configuration for the attention engine.
///
/// Durations are stored in milliseconds so the struct maps directly onto
/// the `[attention]` table of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    /// Delay between becoming an idle candidate and confirmed away.
    /// Default: 10000 (10 seconds).
    pub grace_period_ms: i64,

    /// Activity score (0-100) below which the user may be away.
    /// Default: 20.
    pub activity_threshold: f64,

    /// Default: 90000 (1.5 minutes).
    pub mouse_idle_ms: i64,

    /// Default: 120000 (2 minutes).
    pub keyboard_idle_ms: i64,

    /// Default: 60000 (1 minute).
    pub scroll_idle_ms: i64,

    /// Switches closer together than this count toward a burst. Also the
    /// idle threshold of the tab-switch signal.
    /// Default: 5000 (5 seconds).
    pub rapid_switch_window_ms: i64,

    /// Switches in one window needed to count as a burst.
    /// Default: 3.
    pub rapid_switch_count: u32,

    /// Tab-switch weight applied during a burst.
    /// Default: 2.0.
    pub rapid_switch_weight: f64,

    /// Focus losses shorter than this are treated as multitasking.
    /// Default: 30000 (30 seconds).
    pub short_focus_switch_ms: i64,

    /// Cadence of the rolling flush.
    /// Default: 10000 (10 seconds).
    pub flush_interval_ms: i64,

    /// Minimum accrued whole seconds before a rolling flush writes.
    /// Default: 10.
    pub min_flush_secs: u64,

    pub weights: SignalWeights,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 10_000,
            activity_threshold: 20.0,
            mouse_idle_ms: 90_000,
            keyboard_idle_ms: 120_000,
            scroll_idle_ms: 60_000,
            rapid_switch_window_ms: 5_000,
            rapid_switch_count: 3,
            rapid_switch_weight: 2.0,
            short_focus_switch_ms: 30_000,
            flush_interval_ms: 10_000,
            min_flush_secs: 10,
            weights: SignalWeights::default(),
        }
    }
}

impl AttentionConfig {
    /// Idle threshold for a recency-kind signal, `None` for level-kind.
    pub fn idle_threshold(&self, signal: Signal) -> Option<Duration> {
        let ms = match signal {
            Signal::Mouse => self.mouse_idle_ms,
            Signal::Keyboard => self.keyboard_idle_ms,
            Signal::Scroll => self.scroll_idle_ms,
            Signal::TabSwitch => self.rapid_switch_window_ms,
            Signal::Video | Signal::Audio => return None,
        };
        Some(Duration::milliseconds(ms))
    }

    pub fn grace_period(&self) -> Duration {
        Duration::milliseconds(self.grace_period_ms)
    }

    pub fn rapid_switch_window(&self) -> Duration {
        Duration::milliseconds(self.rapid_switch_window_ms)
    }

    pub fn short_focus_switch(&self) -> Duration {
        Duration::milliseconds(self.short_focus_switch_ms)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::milliseconds(self.flush_interval_ms)
    }

    /// Checks every invariant the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for signal in Signal::ALL {
            check_weight(signal, self.weights.get(signal))?;
        }
        check_weight(Signal::TabSwitch, self.rapid_switch_weight)?;

        for (field, value) in [
            ("grace_period_ms", self.grace_period_ms),
            ("mouse_idle_ms", self.mouse_idle_ms),
            ("keyboard_idle_ms", self.keyboard_idle_ms),
            ("scroll_idle_ms", self.scroll_idle_ms),
            ("rapid_switch_window_ms", self.rapid_switch_window_ms),
            ("short_focus_switch_ms", self.short_focus_switch_ms),
            ("flush_interval_ms", self.flush_interval_ms),
        ] {
            if value <= 0 {
                return Err(ConfigError::NonPositiveDuration { field, value });
            }
            if value > MAX_DURATION_MS {
                return Err(ConfigError::DurationTooLong {
                    field,
                    value,
                    max: MAX_DURATION_MS,
                });
            }
        }

        if !(0.0..=100.0).contains(&self.activity_threshold) {
            return Err(ConfigError::ThresholdOutOfRange {
                value: self.activity_threshold,
            });
        }
        if self.rapid_switch_count == 0 {
            return Err(ConfigError::ZeroRapidSwitchCount);
        }
        Ok(())
    }
}

/// One day. Longer timers are never useful and keep deadline arithmetic in range.
const MAX_DURATION_MS: i64 = 24 * 60 * 60 * 1000;

fn check_weight(signal: Signal, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight { signal, value })
    }
}
