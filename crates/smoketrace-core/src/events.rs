use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::burn::BurnMode;

/// Every state change of a burn session produces an Event.
/// The driver forwards them to the app; the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    BurnStarted {
        mode: BurnMode,
        progress: u8,
        at: DateTime<Utc>,
    },
    /// Manual burning stopped because the pointer was lifted.
    BurnStopped {
        progress: u8,
        at: DateTime<Utc>,
    },
    /// Auto burning stopped by a press.
    AutoCancelled {
        progress: u8,
        at: DateTime<Utc>,
    },
    Ticked {
        progress: u8,
        at: DateTime<Utc>,
    },
    /// Progress reached the end. The session is already back at Idle with
    /// progress 0 when this is observed.
    SessionCompleted {
        count: u64,
        mode: BurnMode,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: BurnMode,
        progress: u8,
        burning: bool,
        count: u64,
        tick_interval_ms: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Whether this event ends a burn without finishing the cigarette.
    pub fn is_stop(&self) -> bool {
        matches!(self, Event::BurnStopped { .. } | Event::AutoCancelled { .. })
    }

    pub fn completed_count(&self) -> Option<u64> {
        match self {
            Event::SessionCompleted { count, .. } => Some(*count),
            _ => None,
        }
    }
}
