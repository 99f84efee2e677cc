//! Domain session tracking and flushing to per-day storage.

use std::convert::Infallible;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::day::day_key;
use crate::domain::Domain;

/// Whole seconds captured for one domain on one day.
///
/// Each flush carries its own delta, so storage only needs an additive
/// merge and flushes may complete in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flush {
    /// `YYYY-MM-DD` key of the day the flush happened.
    pub day: String,
    pub domain: Domain,
    pub seconds: u64,
}

/// Destination for flushed time.
pub trait UsageSink {
    type Error: fmt::Display;

    /// Adds `flush.seconds` to the running total for its day and domain.
    fn record(&mut self, flush: &Flush) -> Result<(), Self::Error>;
}

impl UsageSink for Vec<Flush> {
    type Error = Infallible;

    fn record(&mut self, flush: &Flush) -> Result<(), Self::Error> {
        self.push(flush.clone());
        Ok(())
    }
}

/// The domain currently accruing time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub domain: Domain,
    pub started_at: DateTime<Utc>,
}

impl ActiveSession {
    fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.started_at).num_seconds()).unwrap_or(0)
    }

    fn flush(&self, seconds: u64, now: DateTime<Utc>) -> Flush {
        Flush {
            day: day_key(now),
            domain: self.domain.clone(),
            seconds,
        }
    }
}

/// Owns the single tracked session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTracker {
    current: Option<ActiveSession>,
}

impl SessionTracker {
    pub const fn new() -> Self {
        Self { current: None }
    }

    pub const fn current(&self) -> Option<&ActiveSession> {
        self.current.as_ref()
    }

    pub fn current_domain(&self) -> Option<&Domain> {
        self.current.as_ref().map(|session| &session.domain)
    }

    /// Begins tracking `domain`.
    ///
    /// Tracking the same domain again keeps the original start. A different
    /// domain replaces the current one without flushing it; call
    /// [`stop`](Self::stop) first to keep its time.
    pub fn start(&mut self, domain: Domain, now: DateTime<Utc>) -> bool {
        if self
            .current
            .as_ref()
            .is_some_and(|session| session.domain == domain)
        {
            tracing::debug!(%domain, "already tracking, ignoring restart");
            return false;
        }
        tracing::debug!(%domain, "tracking started");
        self.current = Some(ActiveSession {
            domain,
            started_at: now,
        });
        true
    }

    /// Ends the session, returning its time if at least one whole second
    /// accrued.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<Flush> {
        let session = self.current.take()?;
        let elapsed = session.elapsed_secs(now);
        tracing::debug!(domain = %session.domain, elapsed, "tracking stopped");
        (elapsed > 0).then(|| session.flush(elapsed, now))
    }

    /// Rolling flush: once `min_secs` have accrued, hands them off and
    /// restarts the clock without ending the session.
    pub fn flush_rolling(&mut self, now: DateTime<Utc>, min_secs: u64) -> Option<Flush> {
        let session = self.current.as_mut()?;
        let elapsed = session.elapsed_secs(now);
        if elapsed == 0 || elapsed < min_secs {
            return None;
        }
        let flush = session.flush(elapsed, now);
        session.started_at = now;
        Some(flush)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, TimeZone};

    use crate::domain::resolve_domain;

    fn t_ms(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap() + Duration::milliseconds(ms)
    }

    fn domain(name: &str) -> Domain {
        resolve_domain(&format!("https://{name}/")).unwrap()
    }

    #[test]
    fn start_same_domain_keeps_original_start() {
        let mut tracker = SessionTracker::new();
        assert!(tracker.start(domain("github.com"), t_ms(0)));
        assert!(!tracker.start(domain("github.com"), t_ms(4_000)));
        assert_eq!(tracker.current().unwrap().started_at, t_ms(0));
    }

    #[test]
    fn start_other_domain_replaces_without_flush() {
        let mut tracker = SessionTracker::new();
        tracker.start(domain("github.com"), t_ms(0));
        assert!(tracker.start(domain("docs.rs"), t_ms(5_000)));

        let session = tracker.current().unwrap();
        assert_eq!(session.domain, domain("docs.rs"));
        assert_eq!(session.started_at, t_ms(5_000));
    }

    #[test]
    fn stop_flushes_floored_seconds() {
        let mut tracker = SessionTracker::new();
        tracker.start(domain("github.com"), t_ms(0));

        let flush = tracker.stop(t_ms(12_999)).unwrap();
        assert_eq!(flush.seconds, 12);
        assert_eq!(flush.day, "2026-03-02");
        assert_eq!(flush.domain, domain("github.com"));
        assert!(tracker.current().is_none());
    }

    #[test]
    fn stop_under_a_second_clears_without_flush() {
        let mut tracker = SessionTracker::new();
        tracker.start(domain("github.com"), t_ms(0));
        assert_eq!(tracker.stop(t_ms(999)), None);
        assert!(tracker.current().is_none());
    }

    #[test]
    fn stop_without_session_is_a_no_op() {
        let mut tracker = SessionTracker::new();
        assert_eq!(tracker.stop(t_ms(0)), None);
        assert_eq!(tracker.stop(t_ms(10_000)), None);
    }

    #[test]
    fn stop_before_start_flushes_nothing() {
        let mut tracker = SessionTracker::new();
        tracker.start(domain("github.com"), t_ms(10_000));
        assert_eq!(tracker.stop(t_ms(0)), None);
    }

    #[test]
    fn rolling_flush_waits_for_minimum() {
        let mut tracker = SessionTracker::new();
        tracker.start(domain("github.com"), t_ms(0));
        assert_eq!(tracker.flush_rolling(t_ms(9_500), 10), None);
        assert_eq!(tracker.current().unwrap().started_at, t_ms(0));
    }

    #[test]
    fn rolling_flush_restarts_clock_and_keeps_session() {
        let mut tracker = SessionTracker::new();
        tracker.start(domain("github.com"), t_ms(0));

        let first = tracker.flush_rolling(t_ms(10_000), 10).unwrap();
        assert_eq!(first.seconds, 10);
        assert_eq!(tracker.current().unwrap().started_at, t_ms(10_000));

        let last = tracker.stop(t_ms(14_000)).unwrap();
        assert_eq!(last.seconds, 4);
    }

    #[test]
    fn flush_day_is_taken_at_flush_time() {
        let mut tracker = SessionTracker::new();
        let before_midnight = Utc.with_ymd_and_hms(2026, 3, 2, 23, 59, 50).unwrap();
        tracker.start(domain("github.com"), before_midnight);

        let flush = tracker
            .stop(before_midnight + Duration::seconds(20))
            .unwrap();
        assert_eq!(flush.day, "2026-03-03");
    }

    #[test]
    fn vec_sink_collects_flushes() {
        let mut sink = Vec::new();
        let flush = Flush {
            day: "2026-03-02".to_string(),
            domain: domain("github.com"),
            seconds: 3,
        };
        sink.record(&flush).unwrap();
        assert_eq!(sink, vec![flush]);
    }
}
