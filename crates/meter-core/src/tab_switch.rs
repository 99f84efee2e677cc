//! Rapid tab-switch detection.
//!
//! Bursts of tab cycling in one window are treated as deliberate activity:
//! while a burst is running the tab-switch signal carries a raised weight.

use chrono::{DateTime, Duration, Utc};

use crate::activity::SignalStore;
use crate::config::AttentionConfig;
use crate::event::WindowId;
use crate::signal::Signal;

/// Sliding-window counter over consecutive tab switches.
#[derive(Debug, Clone, PartialEq)]
pub struct TabSwitchDetector {
    window: Duration,
    burst_count: u32,
    burst_weight: f64,
    base_weight: f64,
    count: u32,
    last_switch_at: Option<DateTime<Utc>>,
    window_id: Option<WindowId>,
}

impl TabSwitchDetector {
    pub fn new(config: &AttentionConfig) -> Self {
        Self {
            window: config.rapid_switch_window(),
            burst_count: config.rapid_switch_count,
            burst_weight: config.rapid_switch_weight,
            base_weight: config.weights.tab_switch,
            count: 0,
            last_switch_at: None,
            window_id: None,
        }
    }

    /// Counts a switch and re-weights the tab-switch signal.
    ///
    /// Returns `true` while a burst is in progress.
    pub fn record_switch(
        &mut self,
        window_id: WindowId,
        now: DateTime<Utc>,
        signals: &mut SignalStore,
    ) -> bool {
        let continues_run = self.window_id == Some(window_id)
            && self
                .last_switch_at
                .is_some_and(|last| now - last < self.window);

        self.count = if continues_run {
            self.count.saturating_add(1)
        } else {
            1
        };
        self.last_switch_at = Some(now);
        self.window_id = Some(window_id);

        let bursting = self.count >= self.burst_count;
        let weight = if bursting {
            self.burst_weight
        } else {
            self.base_weight
        };
        if (signals.weight(Signal::TabSwitch) - weight).abs() > f64::EPSILON {
            tracing::debug!(count = self.count, weight, "tab-switch weight changed");
        }
        signals.set_weight(Signal::TabSwitch, weight);
        bursting
    }

    pub const fn count(&self) -> u32 {
        self.count
    }
}
