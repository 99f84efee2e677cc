//! Host events consumed by the attention engine.
//!
//! Events arrive as newline-delimited JSON tagged by `type`. Tab lookups are
//! the host adapter's job: events carry the already-resolved URL of the
//! relevant tab, or `null` when there is none.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::afk::SystemPresence;

/// Browser window identifier.
pub type WindowId = i64;

/// Browser tab identifier.
pub type TabId = i64;

/// A discrete event reported by the host environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// The user switched to another tab.
    TabActivated {
        tab_id: TabId,
        window_id: WindowId,
        #[serde(default)]
        url: Option<String>,
    },
    /// A tab navigated to a new URL.
    UrlChanged {
        tab_id: TabId,
        url: String,
        /// Only changes in the active tab affect tracking.
        #[serde(default = "default_true")]
        active: bool,
    },
    /// No browser window has focus any more.
    FocusLost,
    /// A browser window gained focus. `url` is that window's active tab.
    FocusGained {
        window_id: WindowId,
        #[serde(default)]
        url: Option<String>,
    },
    /// System idle detection changed state.
    IdleState { state: SystemPresence },
    /// Batched input activity from the content observer.
    ActivityBatch { activities: Vec<String> },
    MediaStatus {
        #[serde(default)]
        has_video: bool,
        #[serde(default)]
        has_audio: bool,
    },
    PictureInPicture { active: bool },
    /// Free-form diagnostics forwarded by the content observer.
    DebugLog { message: String },
}

const fn default_true() -> bool {
    true
}

/// A host event with an optional capture time.
///
/// Events without a timestamp are stamped on receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEventEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub event: HostEvent,
}

impl HostEventEnvelope {
    /// Parses one line of the event stream.
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    #[test]
    fn parses_tab_activated_with_timestamp() {
        let line = r#"{"type":"tab_activated","tab_id":4,"window_id":1,"url":"https://github.com/","timestamp":"2026-03-02T09:00:00Z"}"#;
        let envelope = HostEventEnvelope::from_json_line(line).unwrap();

        assert_eq!(
            envelope.timestamp,
            Some(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap())
        );
        assert_eq!(
            envelope.event,
            HostEvent::TabActivated {
                tab_id: 4,
                window_id: 1,
                url: Some("https://github.com/".to_string()),
            }
        );
    }

    #[test]
    fn parses_unit_and_defaulted_variants() {
        let lost = HostEventEnvelope::from_json_line(r#"{"type":"focus_lost"}"#).unwrap();
        assert_eq!(lost.event, HostEvent::FocusLost);
        assert_eq!(lost.timestamp, None);

        let changed =
            HostEventEnvelope::from_json_line(r#"{"type":"url_changed","tab_id":1,"url":"x"}"#)
                .unwrap();
        assert!(matches!(changed.event, HostEvent::UrlChanged { active: true, .. }));

        let media = HostEventEnvelope::from_json_line(r#"{"type":"media_status","has_video":true}"#)
            .unwrap();
        assert_eq!(
            media.event,
            HostEvent::MediaStatus {
                has_video: true,
                has_audio: false
            }
        );
    }

    #[test]
    fn parses_idle_states() {
        for (raw, expected) in [
            ("active", SystemPresence::Active),
            ("idle", SystemPresence::Idle),
            ("locked", SystemPresence::Locked),
        ] {
            let line = format!(r#"{{"type":"idle_state","state":"{raw}"}}"#);
            let envelope = HostEventEnvelope::from_json_line(&line).unwrap();
            assert_eq!(envelope.event, HostEvent::IdleState { state: expected });
        }
    }

    #[test]
    fn rejects_unknown_type_and_idle_state() {
        assert!(HostEventEnvelope::from_json_line(r#"{"type":"tab_closed"}"#).is_err());
        assert!(
            HostEventEnvelope::from_json_line(r#"{"type":"idle_state","state":"asleep"}"#)
                .is_err()
        );
    }
}
