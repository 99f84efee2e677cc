//! Core domain logic for the browsing time meter.
//!
//! This crate contains the attention state engine:
//! - Activity: weighted scoring over input, media and tab-switch signals
//! - AFK: the grace-period gated away-from-keyboard state machine
//! - Tracking: the per-domain session that accrues time into daily totals
//! - Engine: dispatch of host events onto all of the above

mod activity;
pub mod afk;
pub mod config;
pub mod day;
pub mod domain;
mod engine;
pub mod event;
pub mod signal;
mod tab_switch;
pub mod tracker;

pub use activity::SignalStore;
pub use afk::{AfkMachine, AttentionState, GraceTimer, SystemPresence, Transition};
pub use config::{AttentionConfig, ConfigError, SignalWeights};
pub use day::{day_key, day_label, format_duration, parse_day_key};
pub use domain::{Domain, resolve_domain};
pub use engine::AttentionEngine;
pub use event::{HostEvent, HostEventEnvelope, TabId, WindowId};
pub use signal::{Signal, SignalKind, UnknownSignal};
pub use tab_switch::TabSwitchDetector;
pub use tracker::{ActiveSession, Flush, SessionTracker, UsageSink};
