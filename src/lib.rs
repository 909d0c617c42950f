//! Time tracking and attendance core.
//!
//! An employee has at most one active [`TimeEntry`]. The
//! [`TrackingController`] owns the start/stop lifecycle against the
//! [`TimeEntryRepository`], an [`ElapsedClock`] ticks the live duration, and
//! the [`attendance`] functions derive day, week and month records from
//! stored entries.

pub mod app;
pub mod attendance;
pub mod boundary;
pub mod db;
pub mod errors;
pub mod settings;
pub mod tracking;
pub mod utils;
pub mod views;

pub use app::AppState;
pub use db::{models::DateRange, Database, EntryDraft, EntryStatus, TimeEntry};
pub use errors::{TrackingError, TrackingResult};
pub use settings::{SettingsStore, TrackerSettings};
pub use tracking::{
    ElapsedClock, SessionState, StartOutcome, TimeEntryRepository, TrackingController,
    TrackingEvent, TrackingSnapshot,
};
pub use utils::logging::init_logging;
