#![allow(dead_code)]
use std::sync::{Arc, Mutex};

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use timetrack::{
    boundary::{Notification, Notifier, Severity},
    Database, TimeEntryRepository, TrackerSettings, TrackingController,
};

/// Collects notifications so tests can assert on what the user would see.
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.notifications()
            .iter()
            .filter(|n| n.severity == severity)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

pub fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

pub fn test_settings() -> TrackerSettings {
    TrackerSettings {
        tick_interval_ms: 50,
        ..TrackerSettings::default()
    }
}

pub fn setup_repository() -> TimeEntryRepository {
    let db = Database::in_memory().expect("in-memory database");
    TimeEntryRepository::new(db, utc())
}

pub fn controller_for(
    repository: &TimeEntryRepository,
    employee_id: &str,
) -> (TrackingController, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let controller = TrackingController::new(
        employee_id,
        repository.clone(),
        notifier.clone(),
        &test_settings(),
    );
    (controller, notifier)
}

/// Removes the one-active-entry index so tests can plant corrupt data.
pub async fn drop_active_index(db: &Database) {
    db.execute(|conn| {
        conn.execute_batch("DROP INDEX idx_time_entries_one_active")?;
        Ok(())
    })
    .await
    .expect("drop index");
}

pub async fn insert_raw_active(db: &Database, id: &str, employee_id: &str, start: DateTime<Utc>) {
    let id = id.to_string();
    let employee_id = employee_id.to_string();
    let start_text = start.to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
    let date_text = start.format("%Y-%m-%d").to_string();
    db.execute(move |conn| {
        conn.execute(
            "INSERT INTO time_entries (id, employee_id, entry_date, start_time, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'active', ?4, ?4)",
            rusqlite::params![id, employee_id, date_text, start_text],
        )?;
        Ok(())
    })
    .await
    .expect("insert raw entry");
}

/// Makes every insert race a second writer that lands an active entry for the
/// same employee first. The failed statement rolls both rows back, so the
/// store ends up with no active entry.
pub async fn install_interleaved_writer(db: &Database) {
    db.execute(|conn| {
        conn.execute_batch(
            "CREATE TEMP TRIGGER interleaved_writer BEFORE INSERT ON time_entries
             WHEN NEW.id <> 'other-writer'
             BEGIN
                 INSERT INTO time_entries (id, employee_id, entry_date, start_time, status, created_at, updated_at)
                 VALUES ('other-writer', NEW.employee_id, NEW.entry_date, NEW.start_time, 'active',
                         NEW.created_at, NEW.updated_at);
             END;",
        )?;
        Ok(())
    })
    .await
    .expect("install trigger");
}
