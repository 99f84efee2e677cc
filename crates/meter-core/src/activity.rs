//! Weighted activity scoring over the six presence signals.
//!
//! Each recency-kind channel contributes `(1 - idle_ratio) * weight`, where
//! `idle_ratio = min(1, elapsed / idle_threshold)`, so its influence decays
//! linearly and reaches zero exactly at its own threshold. Level-kind
//! channels contribute their full weight while on. The score is the sum of
//! contributions as a percentage of the total weight.

use chrono::{DateTime, Duration, Utc};

use crate::config::AttentionConfig;
use crate::signal::{Signal, SignalKind};

#[derive(Debug, Clone, PartialEq)]
enum Channel {
    Recency {
        /// `None` until the signal is first observed; contributes nothing.
        last_observed_at: Option<DateTime<Utc>>,
        idle_threshold: Duration,
        weight: f64,
    },
    Level {
        is_active: bool,
        weight: f64,
    },
}

impl Channel {
    const fn weight(&self) -> f64 {
        match self {
            Self::Recency { weight, .. } | Self::Level { weight, .. } => *weight,
        }
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "idle thresholds are minutes, far below f64 precision limits"
    )]
    fn contribution(&self, now: DateTime<Utc>) -> f64 {
        match self {
            Self::Recency {
                last_observed_at: None,
                ..
            } => 0.0,
            Self::Recency {
                last_observed_at: Some(last),
                idle_threshold,
                weight,
            } => {
                let elapsed_ms = (now - *last).num_milliseconds().max(0);
                let threshold_ms = idle_threshold.num_milliseconds().max(1);
                let idle_ratio = (elapsed_ms as f64 / threshold_ms as f64).min(1.0);
                (1.0 - idle_ratio) * weight
            }
            Self::Level { is_active, weight } => {
                if *is_active {
                    *weight
                } else {
                    0.0
                }
            }
        }
    }
}

/// Last-observed state and weight of every signal channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalStore {
    channels: [Channel; 6],
}

impl SignalStore {
    /// Creates a store with configured weights and nothing observed yet.
    pub fn new(config: &AttentionConfig) -> Self {
        let channels = Signal::ALL.map(|signal| {
            let weight = config.weights.get(signal);
            match config.idle_threshold(signal) {
                Some(idle_threshold) => Channel::Recency {
                    last_observed_at: None,
                    idle_threshold,
                    weight,
                },
                None => Channel::Level {
                    is_active: false,
                    weight,
                },
            }
        });
        Self { channels }
    }

    /// Records a signal.
    ///
    /// Recency-kind signals are stamped with `now`; level-kind signals take
    /// `active`, which defaults to off.
    pub fn observe(&mut self, signal: Signal, active: Option<bool>, now: DateTime<Utc>) {
        match &mut self.channels[signal.index()] {
            Channel::Recency {
                last_observed_at, ..
            } => *last_observed_at = Some(now),
            Channel::Level { is_active, .. } => *is_active = active.unwrap_or(false),
        }
    }

    /// Overwrites a channel's weight. Negative weights are clamped to zero.
    pub fn set_weight(&mut self, signal: Signal, weight: f64) {
        debug_assert!(weight >= 0.0, "signal weights must be non-negative");
        let weight = weight.max(0.0);
        match &mut self.channels[signal.index()] {
            Channel::Recency { weight: w, .. } | Channel::Level { weight: w, .. } => *w = weight,
        }
    }

    pub fn weight(&self, signal: Signal) -> f64 {
        self.channels[signal.index()].weight()
    }

    /// Current contribution of one channel, between zero and its weight.
    pub fn contribution(&self, signal: Signal, now: DateTime<Utc>) -> f64 {
        self.channels[signal.index()].contribution(now)
    }

    pub fn last_observed_at(&self, signal: Signal) -> Option<DateTime<Utc>> {
        match &self.channels[signal.index()] {
            Channel::Recency {
                last_observed_at, ..
            } => *last_observed_at,
            Channel::Level { .. } => None,
        }
    }

    pub fn is_active(&self, signal: Signal) -> bool {
        matches!(
            self.channels[signal.index()],
            Channel::Level {
                is_active: true,
                ..
            }
        )
    }

    /// Activity score in `[0, 100]`. Zero when every weight is zero.
    pub fn score(&self, now: DateTime<Utc>) -> f64 {
        let (total, max) = self
            .channels
            .iter()
            .filter(|channel| channel.weight() > 0.0)
            .fold((0.0, 0.0), |(total, max), channel| {
                (total + channel.contribution(now), max + channel.weight())
            });

        if max > 0.0 {
            (100.0 * total / max).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Marks every recency signal as just seen and turns level signals off.
    pub fn reset_all(&mut self, now: DateTime<Utc>) {
        for signal in Signal::ALL {
            match signal.kind() {
                SignalKind::Recency => self.observe(signal, None, now),
                SignalKind::Level => self.observe(signal, Some(false), now),
            }
        }
    }
}
