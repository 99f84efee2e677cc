//! Grace-period gated away-from-keyboard state machine.
//!
//! ```text
//! Present ──idle candidate──▶ PendingAway ──grace timer──▶ Away
//!    ▲                             │                         │
//!    └──────── not candidate ──────┴──────── not candidate ──┘
//! ```
//!
//! A lock skips the grace period and forces `Away` directly. While locked the
//! machine stays `Away`; once the lock ends normal reevaluation resumes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AttentionConfig;

/// Whether the user is paying attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttentionState {
    Present,
    /// Presence looks doubtful; the grace timer is running.
    PendingAway { since: DateTime<Utc> },
    Away,
}

impl AttentionState {
    pub const fn pending_since(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::PendingAway { since } => Some(*since),
            Self::Present | Self::Away => None,
        }
    }
}

/// System state as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemPresence {
    Active,
    Idle,
    Locked,
}

/// Handle to the single outstanding grace timer.
///
/// The token identifies which timer a firing belongs to; a firing whose token
/// no longer matches was cancelled and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraceTimer {
    pub token: u64,
    pub deadline: DateTime<Utc>,
}

/// Observable result of driving the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed.
    Unchanged,
    /// `Present → PendingAway`; a grace timer was started.
    Pending,
    /// `PendingAway → Present` before the timer fired.
    Recovered,
    /// `PendingAway → Away` after the grace period.
    WentAway,
    /// `Away → Present`.
    Returned,
    /// Lock forced `Away` without a grace period.
    Locked,
}

/// Attention state plus the overrides that gate it.
#[derive(Debug, Clone, PartialEq)]
pub struct AfkMachine {
    state: AttentionState,
    presence: SystemPresence,
    picture_in_picture: bool,
    grace: Option<GraceTimer>,
    next_token: u64,
    grace_period: Duration,
    activity_threshold: f64,
}

impl AfkMachine {
    pub fn new(config: &AttentionConfig) -> Self {
        Self {
            state: AttentionState::Present,
            presence: SystemPresence::Active,
            picture_in_picture: false,
            grace: None,
            next_token: 0,
            grace_period: config.grace_period(),
            activity_threshold: config.activity_threshold,
        }
    }

    pub const fn state(&self) -> AttentionState {
        self.state
    }

    pub const fn presence(&self) -> SystemPresence {
        self.presence
    }

    pub const fn picture_in_picture(&self) -> bool {
        self.picture_in_picture
    }

    /// The outstanding grace timer, if any.
    pub const fn grace_timer(&self) -> Option<GraceTimer> {
        self.grace
    }

    pub fn is_idle_candidate(&self, score: f64) -> bool {
        matches!(self.presence, SystemPresence::Idle | SystemPresence::Locked)
            && !self.picture_in_picture
            && score < self.activity_threshold
    }

    pub const fn set_picture_in_picture(&mut self, active: bool) {
        self.picture_in_picture = active;
    }

    /// Applies a host idle-state report.
    ///
    /// Entering `Locked` forces `Away` immediately. Every other change only
    /// records the new presence; callers reevaluate afterwards.
    pub fn set_presence(&mut self, presence: SystemPresence) -> Transition {
        let was = self.presence;
        self.presence = presence;

        if presence == SystemPresence::Locked && was != SystemPresence::Locked {
            self.cancel_grace();
            self.state = AttentionState::Away;
            return Transition::Locked;
        }
        Transition::Unchanged
    }

    /// Event-driven reevaluation against the current activity score.
    pub fn reevaluate(&mut self, score: f64, now: DateTime<Utc>) -> Transition {
        if self.presence == SystemPresence::Locked {
            return Transition::Unchanged;
        }

        let candidate = self.is_idle_candidate(score);
        match (self.state, candidate) {
            (AttentionState::Present, true) => {
                self.state = AttentionState::PendingAway { since: now };
                self.start_grace(now);
                Transition::Pending
            }
            (AttentionState::PendingAway { .. }, false) => {
                self.cancel_grace();
                self.state = AttentionState::Present;
                Transition::Recovered
            }
            (AttentionState::Away, false) => {
                self.state = AttentionState::Present;
                Transition::Returned
            }
            (AttentionState::Present, false)
            | (AttentionState::PendingAway { .. } | AttentionState::Away, true) => {
                Transition::Unchanged
            }
        }
    }

    /// Handles a grace timer firing.
    ///
    /// Only the live timer counts, and only while still pending.
    pub fn grace_elapsed(&mut self, token: u64) -> Transition {
        match self.grace {
            Some(timer) if timer.token == token => {
                self.grace = None;
                if matches!(self.state, AttentionState::PendingAway { .. }) {
                    self.state = AttentionState::Away;
                    Transition::WentAway
                } else {
                    Transition::Unchanged
                }
            }
            _ => Transition::Unchanged,
        }
    }

    /// Abandons a pending away without waiting for the timer.
    pub fn cancel_pending(&mut self) -> Transition {
        if matches!(self.state, AttentionState::PendingAway { .. }) {
            self.cancel_grace();
            self.state = AttentionState::Present;
            Transition::Recovered
        } else {
            Transition::Unchanged
        }
    }

    fn start_grace(&mut self, now: DateTime<Utc>) {
        if let Some(prior) = self.grace.take() {
            tracing::debug!(token = prior.token, "replacing outstanding grace timer");
        }
        self.next_token += 1;
        let deadline = now
            .checked_add_signed(self.grace_period)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.grace = Some(GraceTimer {
            token: self.next_token,
            deadline,
        });
    }

    fn cancel_grace(&mut self) {
        if let Some(timer) = self.grace.take() {
            tracing::debug!(token = timer.token, "grace timer cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn idle_machine() -> AfkMachine {
        let mut machine = AfkMachine::new(&AttentionConfig::default());
        machine.set_presence(SystemPresence::Idle);
        machine
    }

    #[test]
    fn starts_present_and_active() {
        let machine = AfkMachine::new(&AttentionConfig::default());
        assert_eq!(machine.state(), AttentionState::Present);
        assert_eq!(machine.presence(), SystemPresence::Active);
        assert!(machine.grace_timer().is_none());
    }

    #[test]
    fn low_score_while_active_is_not_a_candidate() {
        let mut machine = AfkMachine::new(&AttentionConfig::default());
        assert_eq!(machine.reevaluate(0.0, t(0)), Transition::Unchanged);
        assert_eq!(machine.state(), AttentionState::Present);
    }

    #[test]
    fn idle_with_low_score_starts_grace_timer() {
        let mut machine = idle_machine();
        assert_eq!(machine.reevaluate(5.0, t(0)), Transition::Pending);
        assert_eq!(machine.state().pending_since(), Some(t(0)));
        assert_eq!(machine.grace_timer().map(|g| g.deadline), Some(t(10)));
    }

    #[test]
    fn out_of_range_grace_deadline_saturates() {
        let config = AttentionConfig {
            grace_period_ms: i64::MAX,
            ..AttentionConfig::default()
        };
        let mut machine = AfkMachine::new(&config);
        machine.set_presence(SystemPresence::Idle);

        assert_eq!(machine.reevaluate(5.0, t(0)), Transition::Pending);
        assert_eq!(
            machine.grace_timer().map(|g| g.deadline),
            Some(DateTime::<Utc>::MAX_UTC)
        );
    }

    #[test]
    fn score_at_threshold_is_not_a_candidate() {
        let mut machine = idle_machine();
        assert_eq!(machine.reevaluate(20.0, t(0)), Transition::Unchanged);
    }

    #[test]
    fn repeated_candidate_reevaluation_keeps_the_first_timer() {
        let mut machine = idle_machine();
        machine.reevaluate(5.0, t(0));
        let first = machine.grace_timer();
        assert_eq!(machine.reevaluate(1.0, t(3)), Transition::Unchanged);
        assert_eq!(machine.grace_timer(), first);
    }

    #[test]
    fn activity_during_grace_recovers_and_stale_timer_is_ignored() {
        let mut machine = idle_machine();
        machine.reevaluate(5.0, t(0));
        let timer = machine.grace_timer().unwrap();

        assert_eq!(machine.reevaluate(60.0, t(5)), Transition::Recovered);
        assert_eq!(machine.state(), AttentionState::Present);
        assert!(machine.grace_timer().is_none());

        assert_eq!(machine.grace_elapsed(timer.token), Transition::Unchanged);
        assert_eq!(machine.state(), AttentionState::Present);
    }

    #[test]
    fn new_grace_period_gets_a_new_token() {
        let mut machine = idle_machine();
        machine.reevaluate(5.0, t(0));
        let first = machine.grace_timer().unwrap();
        machine.reevaluate(60.0, t(2));
        machine.reevaluate(5.0, t(4));
        let second = machine.grace_timer().unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(machine.grace_elapsed(first.token), Transition::Unchanged);
        assert_eq!(machine.grace_elapsed(second.token), Transition::WentAway);
    }

    #[test]
    fn grace_elapsing_confirms_away() {
        let mut machine = idle_machine();
        machine.reevaluate(5.0, t(0));
        let timer = machine.grace_timer().unwrap();

        assert_eq!(machine.grace_elapsed(timer.token), Transition::WentAway);
        assert_eq!(machine.state(), AttentionState::Away);
        assert!(machine.grace_timer().is_none());
    }

    #[test]
    fn away_returns_when_no_longer_candidate() {
        let mut machine = idle_machine();
        machine.reevaluate(5.0, t(0));
        machine.grace_elapsed(machine.grace_timer().unwrap().token);

        machine.set_presence(SystemPresence::Active);
        assert_eq!(machine.reevaluate(5.0, t(60)), Transition::Returned);
        assert_eq!(machine.state(), AttentionState::Present);
    }

    #[test]
    fn picture_in_picture_prevents_pending() {
        let mut machine = idle_machine();
        machine.set_picture_in_picture(true);
        assert_eq!(machine.reevaluate(0.0, t(0)), Transition::Unchanged);
        assert_eq!(machine.state(), AttentionState::Present);
    }

    #[test]
    fn lock_forces_away_regardless_of_pip_and_cancels_grace() {
        let mut machine = idle_machine();
        machine.reevaluate(5.0, t(0));
        machine.set_picture_in_picture(true);

        assert_eq!(machine.set_presence(SystemPresence::Locked), Transition::Locked);
        assert_eq!(machine.state(), AttentionState::Away);
        assert!(machine.grace_timer().is_none());
    }

    #[test]
    fn repeated_lock_report_is_a_no_op() {
        let mut machine = AfkMachine::new(&AttentionConfig::default());
        machine.set_presence(SystemPresence::Locked);
        assert_eq!(
            machine.set_presence(SystemPresence::Locked),
            Transition::Unchanged
        );
    }

    #[test]
    fn stays_away_while_locked_even_with_high_score() {
        let mut machine = AfkMachine::new(&AttentionConfig::default());
        machine.set_presence(SystemPresence::Locked);
        assert_eq!(machine.reevaluate(100.0, t(5)), Transition::Unchanged);
        assert_eq!(machine.state(), AttentionState::Away);
    }

    #[test]
    fn unlock_into_idle_with_low_score_stays_away() {
        let mut machine = AfkMachine::new(&AttentionConfig::default());
        machine.set_presence(SystemPresence::Locked);
        machine.set_presence(SystemPresence::Idle);
        assert_eq!(machine.reevaluate(3.0, t(5)), Transition::Unchanged);
        assert_eq!(machine.state(), AttentionState::Away);
    }

    #[test]
    fn cancel_pending_only_affects_pending_state() {
        let mut machine = idle_machine();
        assert_eq!(machine.cancel_pending(), Transition::Unchanged);

        machine.reevaluate(5.0, t(0));
        assert_eq!(machine.cancel_pending(), Transition::Recovered);
        assert!(machine.grace_timer().is_none());
        assert_eq!(machine.state(), AttentionState::Present);
    }
}
