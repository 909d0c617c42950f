use chrono::{DateTime, FixedOffset, NaiveDate, SubsecRound, Utc};
use log::{error, info};
use uuid::Uuid;

use crate::{
    db::{
        models::{DateRange, EntryDraft, EntryStatus, TimeEntry},
        CloseOutcome, Database, InsertOutcome,
    },
    errors::{TrackingError, TrackingResult},
};

/// Sole path between the tracking core and the entry store.
///
/// Storage failures come back as [`TrackingError::Store`] and are never
/// retried here; retry policy belongs to the caller.
#[derive(Clone)]
pub struct TimeEntryRepository {
    db: Database,
    utc_offset: FixedOffset,
}

impl TimeEntryRepository {
    pub fn new(db: Database, utc_offset: FixedOffset) -> Self {
        Self { db, utc_offset }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Employee-local calendar date of an instant.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.utc_offset).date_naive()
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    /// The employee's active entry, if any. More than one is reported as a
    /// consistency violation rather than resolved.
    pub async fn find_active_entry(&self, employee_id: &str) -> TrackingResult<Option<TimeEntry>> {
        let mut active = self
            .db
            .list_entries_with_status(employee_id, EntryStatus::Active)
            .await?;

        if active.len() > 1 {
            error!(
                "Employee {} has {} active entries in the store",
                employee_id,
                active.len()
            );
            return Err(TrackingError::Consistency {
                employee_id: employee_id.to_string(),
                count: active.len(),
            });
        }

        Ok(active.pop())
    }

    /// Creates a new active entry starting at `start_time`.
    ///
    /// Fails with [`TrackingError::AlreadyTracking`] when the employee has an
    /// active entry, whether the pre-insert lookup or the store's unique
    /// index catches it.
    pub async fn create_entry(
        &self,
        employee_id: &str,
        draft: &EntryDraft,
        start_time: DateTime<Utc>,
    ) -> TrackingResult<TimeEntry> {
        if employee_id.trim().is_empty() {
            return Err(TrackingError::UnknownEmployee);
        }

        // The store keeps microseconds; match it so the returned entry equals a re-read.
        let start_time = start_time.trunc_subsecs(6);
        let now = Utc::now().trunc_subsecs(6);
        let entry = TimeEntry {
            id: Uuid::new_v4().to_string(),
            employee_id: employee_id.to_string(),
            project_id: draft.project_id.clone(),
            task_id: draft.task_id.clone(),
            description: draft.description.clone(),
            date: self.local_date(start_time),
            start_time,
            end_time: None,
            duration: None,
            status: EntryStatus::Active,
            created_at: now,
            updated_at: now,
        };

        match self.db.insert_active_entry(&entry).await? {
            InsertOutcome::Created => {
                info!("Created time entry {} for employee {}", entry.id, employee_id);
                Ok(entry)
            }
            InsertOutcome::Conflict { existing_id } => Err(TrackingError::AlreadyTracking {
                employee_id: employee_id.to_string(),
                entry_id: existing_id,
            }),
        }
    }

    /// Completes an active entry at `end_time` with
    /// `duration = floor(end_time - start_time)` seconds.
    pub async fn close_entry(
        &self,
        entry_id: &str,
        end_time: DateTime<Utc>,
    ) -> TrackingResult<TimeEntry> {
        match self.db.close_active_entry(entry_id, end_time).await? {
            CloseOutcome::Closed(entry) => {
                info!(
                    "Closed time entry {} for employee {} after {}s",
                    entry.id,
                    entry.employee_id,
                    entry.duration.unwrap_or_default()
                );
                Ok(entry)
            }
            CloseOutcome::NotFound => Err(TrackingError::NotFound(entry_id.to_string())),
            CloseOutcome::AlreadyCompleted(_) => Err(TrackingError::InvalidState(format!(
                "time entry {entry_id} is already completed"
            ))),
            CloseOutcome::EndBeforeStart(entry) => Err(TrackingError::InvalidState(format!(
                "end time {} precedes start time {} of entry {entry_id}",
                end_time, entry.start_time
            ))),
        }
    }

    pub async fn get_entry(&self, entry_id: &str) -> TrackingResult<TimeEntry> {
        self.db
            .get_time_entry(entry_id)
            .await?
            .ok_or_else(|| TrackingError::NotFound(entry_id.to_string()))
    }

    /// Entries of the employee dated within `range`, by start time ascending.
    /// Includes an active entry when its date is in range.
    pub async fn list_entries(
        &self,
        employee_id: &str,
        range: DateRange,
    ) -> TrackingResult<Vec<TimeEntry>> {
        Ok(self.db.list_time_entries(employee_id, range).await?)
    }

    /// Entries of every employee dated within `range`.
    pub async fn list_all_entries(&self, range: DateRange) -> TrackingResult<Vec<TimeEntry>> {
        Ok(self.db.list_time_entries_for_range(range).await?)
    }
}
