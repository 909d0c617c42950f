//! Error kinds surfaced by the tracking core.
//!
//! Storage code works in `anyhow::Result`; anything that crosses into the
//! repository or controller is folded into [`TrackingError`] so callers can
//! match on the kinds they recover from.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackingError {
    /// A session is already active for the employee.
    #[error("employee {employee_id} already has an active time entry")]
    AlreadyTracking {
        employee_id: String,
        entry_id: Option<String>,
    },

    /// Closing an entry that is already completed, or closing before its start.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The store returned more than one active entry for one employee.
    #[error("consistency violation: employee {employee_id} has {count} active entries")]
    Consistency { employee_id: String, count: usize },

    #[error("time entry {0} not found")]
    NotFound(String),

    #[error("no active session to stop")]
    NotTracking,

    /// A start or stop is already in flight for this session.
    #[error("another tracking operation is still in progress")]
    Busy,

    #[error("no employee matches the supplied credential")]
    UnknownEmployee,

    /// Transient storage failure; the cause is kept for the caller.
    #[error("store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl TrackingError {
    pub fn is_already_tracking(&self) -> bool {
        matches!(self, TrackingError::AlreadyTracking { .. })
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, TrackingError::InvalidState(_))
    }
}

pub type TrackingResult<T> = Result<T, TrackingError>;
