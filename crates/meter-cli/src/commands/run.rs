//! Live tracking loop over host events read from stdin.

use std::future::Future;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{Instant, MissedTickBehavior};

use meter_core::{AttentionEngine, HostEventEnvelope, UsageSink};

/// Counts of host-event lines seen by one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub handled: usize,
    pub skipped: usize,
}

/// Time as the engine sees it: the latest event time plus the real time
/// elapsed since that event arrived.
///
/// Replayed input carries timestamps far from the wall clock, so timers and
/// the final shutdown must not mix `Utc::now()` into the event timeline.
#[derive(Debug, Clone, Copy)]
struct RunClock {
    last_event: DateTime<Utc>,
    seen_at: Instant,
}

impl RunClock {
    fn start() -> Self {
        Self {
            last_event: Utc::now(),
            seen_at: Instant::now(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let elapsed = Duration::from_std(self.seen_at.elapsed()).unwrap_or(Duration::zero());
        self.last_event
            .checked_add_signed(elapsed)
            .unwrap_or(self.last_event)
    }

    fn observe(&mut self, at: DateTime<Utc>) {
        self.last_event = at;
        self.seen_at = Instant::now();
    }

    /// Real time left until `deadline` on this clock, zero once it has passed.
    fn until(&self, deadline: DateTime<Utc>) -> std::time::Duration {
        (deadline - self.now()).to_std().unwrap_or_default()
    }
}

/// Drives `engine` until `reader` hits end of input or `shutdown` resolves.
///
/// Input lines, the grace deadline, the rolling flush and `shutdown` are
/// polled in that order, so all input already buffered is applied before a
/// timer gets a chance to fire.
pub async fn run<R, S, F>(
    reader: R,
    engine: &mut AttentionEngine,
    sink: &mut S,
    shutdown: F,
) -> Result<RunSummary>
where
    R: AsyncBufRead + Unpin,
    S: UsageSink,
    F: Future<Output = ()>,
{
    let period = engine
        .config()
        .flush_interval()
        .to_std()
        .context("flush interval must be positive")?;
    let first_tick = Instant::now()
        .checked_add(period)
        .context("flush interval is too long")?;
    let mut flush = tokio::time::interval_at(first_tick, period);
    flush.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut lines = reader.lines();
    let mut summary = RunSummary::default();
    let mut clock = RunClock::start();
    tokio::pin!(shutdown);

    loop {
        // Re-read every iteration so a cancelled or replaced timer is dropped.
        let grace = engine
            .pending_grace()
            .map(|timer| (clock.until(timer.deadline), timer));
        let grace_elapsed = async move {
            match grace {
                Some((wait, timer)) => {
                    tokio::time::sleep(wait).await;
                    timer
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;

            line = lines.next_line() => {
                match line.context("failed to read host event")? {
                    Some(line) => {
                        if handle_line(engine, &line, &mut clock, sink) {
                            summary.handled += 1;
                        } else if !line.trim().is_empty() {
                            summary.skipped += 1;
                        }
                    }
                    None => {
                        tracing::debug!("end of host events");
                        break;
                    }
                }
            }
            timer = grace_elapsed => {
                clock.observe(timer.deadline);
                engine.on_grace_timer(timer.token, timer.deadline, sink);
            }
            _ = flush.tick() => {
                engine.periodic_flush(clock.now(), sink);
            }
            () = &mut shutdown => {
                tracing::info!("interrupted, stopping");
                break;
            }
        }
    }

    engine.shutdown(clock.now(), sink);
    tracing::info!(
        handled = summary.handled,
        skipped = summary.skipped,
        "tracking stopped"
    );
    Ok(summary)
}

/// Applies one line of input and advances `clock` to its time. Returns
/// whether it was a valid host event.
fn handle_line<S: UsageSink>(
    engine: &mut AttentionEngine,
    line: &str,
    clock: &mut RunClock,
    sink: &mut S,
) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    match HostEventEnvelope::from_json_line(trimmed) {
        Ok(envelope) => {
            let now = envelope.timestamp.unwrap_or_else(|| clock.now());
            clock.observe(now);
            engine.handle(envelope.event, now, sink);
            true
        }
        Err(err) => {
            tracing::warn!(%err, "skipping malformed host event");
            false
        }
    }
}
