//! Signal channels as the single source of truth for signal name strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An observable proxy for user presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Mouse,
    Keyboard,
    Scroll,
    TabSwitch,
    Video,
    Audio,
}

/// How a signal's contribution is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Contribution decays linearly with time since the last observation.
    Recency,
    /// Contribution is the full weight while the signal is on, zero otherwise.
    Level,
}

impl Signal {
    /// Every channel, in storage order.
    pub const ALL: [Self; 6] = [
        Self::Mouse,
        Self::Keyboard,
        Self::Scroll,
        Self::TabSwitch,
        Self::Video,
        Self::Audio,
    ];

    pub const fn kind(self) -> SignalKind {
        match self {
            Self::Mouse | Self::Keyboard | Self::Scroll | Self::TabSwitch => SignalKind::Recency,
            Self::Video | Self::Audio => SignalKind::Level,
        }
    }

    /// Wire name used by the content observer.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mouse => "mouse",
            Self::Keyboard => "keyboard",
            Self::Scroll => "scroll",
            Self::TabSwitch => "tab_switch",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Mouse => 0,
            Self::Keyboard => 1,
            Self::Scroll => 2,
            Self::TabSwitch => 3,
            Self::Video => 4,
            Self::Audio => 5,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Signal {
    type Err = UnknownSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mouse" => Ok(Self::Mouse),
            "keyboard" => Ok(Self::Keyboard),
            "scroll" => Ok(Self::Scroll),
            "tab_switch" | "tabSwitch" => Ok(Self::TabSwitch),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            _ => Err(UnknownSignal(s.to_string())),
        }
    }
}

impl Serialize for Signal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Signal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown signal names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown signal: {0}")]
pub struct UnknownSignal(String);
