pub mod time_entry;

pub use time_entry::{whole_seconds_between, DateRange, EntryDraft, EntryStatus, TimeEntry};
