//! The attention engine: event dispatch over signals, AFK state and the
//! session tracker.
//!
//! One owned instance holds all mutable state. Every method runs to
//! completion before the next call, and time is always passed in, so the
//! engine is deterministic under replay. Flushed time goes to a
//! [`UsageSink`]; sink failures are logged and never interrupt tracking.

use chrono::{DateTime, Utc};

use crate::activity::SignalStore;
use crate::afk::{AfkMachine, AttentionState, GraceTimer, SystemPresence, Transition};
use crate::config::{AttentionConfig, ConfigError};
use crate::domain::{Domain, resolve_domain};
use crate::event::{HostEvent, WindowId};
use crate::signal::{Signal, SignalKind};
use crate::tab_switch::TabSwitchDetector;
use crate::tracker::{ActiveSession, Flush, SessionTracker, UsageSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowFocus {
    has_focus: bool,
    last_change: DateTime<Utc>,
}

/// Attention-gated time tracker.
#[derive(Debug, Clone)]
pub struct AttentionEngine {
    config: AttentionConfig,
    signals: SignalStore,
    tab_switches: TabSwitchDetector,
    afk: AfkMachine,
    tracker: SessionTracker,
    focus: WindowFocus,
    /// Domain of the active tab in the focused window, tracked or not.
    active_domain: Option<Domain>,
}

impl AttentionEngine {
    /// Cold start: present, focused, and every recency signal fresh.
    pub fn new(config: AttentionConfig, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut signals = SignalStore::new(&config);
        signals.reset_all(now);
        Ok(Self {
            tab_switches: TabSwitchDetector::new(&config),
            afk: AfkMachine::new(&config),
            signals,
            tracker: SessionTracker::new(),
            focus: WindowFocus {
                has_focus: true,
                last_change: now,
            },
            active_domain: None,
            config,
        })
    }

    pub const fn config(&self) -> &AttentionConfig {
        &self.config
    }

    pub const fn attention(&self) -> AttentionState {
        self.afk.state()
    }

    pub const fn presence(&self) -> SystemPresence {
        self.afk.presence()
    }

    pub const fn has_focus(&self) -> bool {
        self.focus.has_focus
    }

    pub const fn signals(&self) -> &SignalStore {
        &self.signals
    }

    pub fn score(&self, now: DateTime<Utc>) -> f64 {
        self.signals.score(now)
    }

    pub const fn session(&self) -> Option<&ActiveSession> {
        self.tracker.current()
    }

    pub const fn active_domain(&self) -> Option<&Domain> {
        self.active_domain.as_ref()
    }

    /// The grace timer the runtime should wait on, if any.
    pub const fn pending_grace(&self) -> Option<GraceTimer> {
        self.afk.grace_timer()
    }

    /// Dispatches one host event.
    ///
    /// A grace timer whose deadline has passed by `now` fires first, so
    /// replayed event streams see the same transitions as live ones.
    pub fn handle<S: UsageSink>(&mut self, event: HostEvent, now: DateTime<Utc>, sink: &mut S) {
        self.fire_due_grace(now, sink);

        match event {
            HostEvent::TabActivated {
                window_id, url, ..
            } => self.on_tab_activated(window_id, url.as_deref(), now, sink),
            HostEvent::UrlChanged { url, active, .. } => {
                if active {
                    self.on_url_changed(&url, now, sink);
                }
            }
            HostEvent::FocusLost => self.on_focus_lost(now, sink),
            HostEvent::FocusGained { window_id, url } => {
                self.on_focus_gained(window_id, url.as_deref(), now, sink);
            }
            HostEvent::IdleState { state } => self.on_idle_state(state, now, sink),
            HostEvent::ActivityBatch { activities } => {
                let signals: Vec<Signal> = activities
                    .iter()
                    .filter_map(|name| match name.parse() {
                        Ok(signal) => Some(signal),
                        Err(err) => {
                            tracing::warn!(%err, "skipping activity");
                            None
                        }
                    })
                    .collect();
                self.on_activity_batch(&signals, now, sink);
            }
            HostEvent::MediaStatus {
                has_video,
                has_audio,
            } => self.on_media_status(has_video, has_audio, now, sink),
            HostEvent::PictureInPicture { active } => {
                self.on_picture_in_picture(active, now, sink);
            }
            HostEvent::DebugLog { message } => {
                tracing::debug!(target: "meter::content", "{message}");
            }
        }
    }

    pub fn on_tab_activated<S: UsageSink>(
        &mut self,
        window_id: WindowId,
        url: Option<&str>,
        now: DateTime<Utc>,
        sink: &mut S,
    ) {
        self.stop_tracking(now, sink);
        self.active_domain = url.and_then(resolve_domain);
        self.try_start(now);

        self.tab_switches
            .record_switch(window_id, now, &mut self.signals);
        self.signals.observe(Signal::TabSwitch, None, now);
        self.reevaluate(now, sink);
    }

    pub fn on_url_changed<S: UsageSink>(&mut self, url: &str, now: DateTime<Utc>, sink: &mut S) {
        self.stop_tracking(now, sink);
        self.active_domain = resolve_domain(url);
        self.try_start(now);
    }

    pub fn on_focus_lost<S: UsageSink>(&mut self, now: DateTime<Utc>, sink: &mut S) {
        if self.focus.has_focus {
            self.focus = WindowFocus {
                has_focus: false,
                last_change: now,
            };
            tracing::debug!("browser lost focus");
        }
        self.stop_tracking(now, sink);
    }

    /// Focus returned to a browser window whose active tab has `url`.
    ///
    /// A return shortly after losing focus is multitasking, not absence:
    /// signals are refreshed and any pending away is abandoned.
    pub fn on_focus_gained<S: UsageSink>(
        &mut self,
        _window_id: WindowId,
        url: Option<&str>,
        now: DateTime<Utc>,
        sink: &mut S,
    ) {
        if !self.focus.has_focus {
            let away_for = now - self.focus.last_change;
            self.focus = WindowFocus {
                has_focus: true,
                last_change: now,
            };
            if away_for < self.config.short_focus_switch() {
                tracing::debug!(
                    away_ms = away_for.num_milliseconds(),
                    "short focus switch, treating as multitasking"
                );
                self.signals.reset_all(now);
                self.afk.cancel_pending();
            }
            self.reevaluate(now, sink);
        }

        if url.is_none() {
            tracing::debug!("focused window has no active tab");
        }
        let domain = url.and_then(resolve_domain);
        if self.tracker.current_domain() != domain.as_ref() {
            self.stop_tracking(now, sink);
        }
        self.active_domain = domain;
        self.try_start(now);
    }

    pub fn on_idle_state<S: UsageSink>(
        &mut self,
        presence: SystemPresence,
        now: DateTime<Utc>,
        sink: &mut S,
    ) {
        let was = self.afk.presence();
        if self.afk.set_presence(presence) == Transition::Locked {
            tracing::info!("system locked, stopping tracking");
            self.stop_tracking(now, sink);
            return;
        }
        if was == SystemPresence::Locked && presence != SystemPresence::Locked {
            tracing::info!(?presence, "system unlocked");
        }
        self.reevaluate(now, sink);
    }

    /// Batches only carry recency signals; level signals are ignored here.
    pub fn on_activity_batch<S: UsageSink>(
        &mut self,
        signals: &[Signal],
        now: DateTime<Utc>,
        sink: &mut S,
    ) {
        for signal in signals {
            if signal.kind() == SignalKind::Recency {
                self.signals.observe(*signal, None, now);
            }
        }
        self.reevaluate(now, sink);
    }

    pub fn on_media_status<S: UsageSink>(
        &mut self,
        has_video: bool,
        has_audio: bool,
        now: DateTime<Utc>,
        sink: &mut S,
    ) {
        self.signals.observe(Signal::Video, Some(has_video), now);
        self.signals.observe(Signal::Audio, Some(has_audio), now);
        self.reevaluate(now, sink);
    }

    pub fn on_picture_in_picture<S: UsageSink>(
        &mut self,
        active: bool,
        now: DateTime<Utc>,
        sink: &mut S,
    ) {
        self.afk.set_picture_in_picture(active);
        self.reevaluate(now, sink);
    }

    /// The grace timer identified by `token` fired at `now`.
    pub fn on_grace_timer<S: UsageSink>(&mut self, token: u64, now: DateTime<Utc>, sink: &mut S) {
        if self.afk.grace_elapsed(token) == Transition::WentAway {
            tracing::info!("grace period elapsed, user is away");
            self.stop_tracking(now, sink);
        }
    }

    /// Fires the outstanding grace timer if its deadline is not after `now`.
    pub fn fire_due_grace<S: UsageSink>(&mut self, now: DateTime<Utc>, sink: &mut S) {
        if let Some(timer) = self.afk.grace_timer() {
            if timer.deadline <= now {
                self.on_grace_timer(timer.token, timer.deadline, sink);
            }
        }
    }

    /// Rolling flush, skipped while locked or away.
    pub fn periodic_flush<S: UsageSink>(&mut self, now: DateTime<Utc>, sink: &mut S) {
        if self.afk.presence() == SystemPresence::Locked
            || self.afk.state() == AttentionState::Away
        {
            return;
        }
        let flush = self.tracker.flush_rolling(now, self.config.min_flush_secs);
        record(sink, flush);
    }

    /// Final flush before exit.
    pub fn shutdown<S: UsageSink>(&mut self, now: DateTime<Utc>, sink: &mut S) {
        self.fire_due_grace(now, sink);
        self.stop_tracking(now, sink);
    }

    fn reevaluate<S: UsageSink>(&mut self, now: DateTime<Utc>, sink: &mut S) {
        let score = self.signals.score(now);
        match self.afk.reevaluate(score, now) {
            Transition::Pending => {
                tracing::debug!(score, "user may be away, grace period started");
            }
            Transition::Recovered => {
                tracing::debug!(score, "activity resumed within grace period");
            }
            Transition::Returned => {
                tracing::info!(score, "user returned");
                self.signals.reset_all(now);
                self.try_start(now);
            }
            Transition::WentAway => {
                self.stop_tracking(now, sink);
            }
            Transition::Unchanged | Transition::Locked => {}
        }
    }

    /// Starts tracking the active domain when attention allows it.
    fn try_start(&mut self, now: DateTime<Utc>) {
        if !self.focus.has_focus
            || self.afk.presence() == SystemPresence::Locked
            || self.afk.state() == AttentionState::Away
        {
            return;
        }
        if let Some(domain) = self.active_domain.clone() {
            self.tracker.start(domain, now);
        }
    }

    fn stop_tracking<S: UsageSink>(&mut self, now: DateTime<Utc>, sink: &mut S) {
        let flush = self.tracker.stop(now);
        record(sink, flush);
    }
}

fn record<S: UsageSink>(sink: &mut S, flush: Option<Flush>) {
    let Some(flush) = flush else {
        return;
    };
    match sink.record(&flush) {
        Ok(()) => tracing::debug!(
            day = %flush.day,
            domain = %flush.domain,
            seconds = flush.seconds,
            "flushed"
        ),
        Err(err) => tracing::warn!(
            %err,
            day = %flush.day,
            domain = %flush.domain,
            seconds = flush.seconds,
            "failed to save time"
        ),
    }
}
