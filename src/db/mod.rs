pub mod connection;
pub mod helpers;
mod migrations;
pub mod models;
pub mod repositories;

pub use connection::Database;
pub use models::{DateRange, EntryDraft, EntryStatus, TimeEntry};
pub use repositories::time_entries::{CloseOutcome, InsertOutcome};
