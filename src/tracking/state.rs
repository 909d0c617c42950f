use serde::{Deserialize, Serialize};

use crate::db::models::TimeEntry;

/// Per-employee session state as last confirmed by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "status", content = "entry", rename_all = "camelCase")]
pub enum SessionState {
    #[default]
    Idle,
    Tracking(TimeEntry),
}

impl SessionState {
    pub fn from_active(entry: Option<TimeEntry>) -> Self {
        match entry {
            Some(entry) => SessionState::Tracking(entry),
            None => SessionState::Idle,
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self, SessionState::Tracking(_))
    }

    pub fn entry(&self) -> Option<&TimeEntry> {
        match self {
            SessionState::Tracking(entry) => Some(entry),
            SessionState::Idle => None,
        }
    }

    pub fn entry_id(&self) -> Option<&str> {
        self.entry().map(|entry| entry.id.as_str())
    }
}

/// What a widget needs to render the timer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSnapshot {
    pub employee_id: String,
    pub state: SessionState,
    pub elapsed_seconds: u64,
    /// A start or stop is awaiting the store; the action should be disabled.
    pub busy: bool,
}
