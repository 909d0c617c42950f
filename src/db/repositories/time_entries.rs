use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{
        format_date, format_datetime, parse_date, parse_datetime, parse_optional_datetime,
        parse_status,
    },
    models::{whole_seconds_between, DateRange, EntryStatus, TimeEntry},
};

const ENTRY_COLUMNS: &str = "id, employee_id, project_id, task_id, description, entry_date, start_time, end_time, duration_secs, status, created_at, updated_at";

/// Result of the conditional insert of a new active entry.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Created,
    /// The employee already has an active entry. The id is known when the
    /// pre-insert check found it, unknown when only the unique index fired.
    Conflict { existing_id: Option<String> },
}

/// Result of the conditional close of an active entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CloseOutcome {
    Closed(TimeEntry),
    NotFound,
    AlreadyCompleted(TimeEntry),
    EndBeforeStart(TimeEntry),
}

fn row_to_entry(row: &Row) -> Result<TimeEntry> {
    let entry_date: String = row.get("entry_date")?;
    let start_time: String = row.get("start_time")?;
    let end_time: Option<String> = row.get("end_time")?;
    let status: String = row.get("status")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(TimeEntry {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        project_id: row.get("project_id")?,
        task_id: row.get("task_id")?,
        description: row.get("description")?,
        date: parse_date(&entry_date, "entry_date")?,
        start_time: parse_datetime(&start_time, "start_time")?,
        end_time: parse_optional_datetime(end_time, "end_time")?,
        duration: row.get("duration_secs")?,
        status: parse_status(&status)?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

fn load_entry(conn: &Connection, entry_id: &str) -> Result<Option<TimeEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = ?1"
    ))?;
    let mut rows = stmt.query(params![entry_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_entry(row)?)),
        None => Ok(None),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _) if code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl Database {
    /// Inserts `entry` as the employee's active entry unless one exists.
    ///
    /// The lookup and the insert run in the same worker task, and the
    /// partial unique index backs it up for writers outside this process.
    pub async fn insert_active_entry(&self, entry: &TimeEntry) -> Result<InsertOutcome> {
        let record = entry.clone();
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM time_entries
                     WHERE employee_id = ?1 AND status = 'active'
                     ORDER BY start_time ASC
                     LIMIT 1",
                    params![record.employee_id],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing_id) = existing {
                return Ok(InsertOutcome::Conflict {
                    existing_id: Some(existing_id),
                });
            }

            let inserted = tx.execute(
                &format!(
                    "INSERT INTO time_entries ({ENTRY_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                params![
                    record.id,
                    record.employee_id,
                    record.project_id,
                    record.task_id,
                    record.description,
                    format_date(&record.date),
                    format_datetime(&record.start_time),
                    record.end_time.as_ref().map(format_datetime),
                    record.duration,
                    record.status.as_str(),
                    format_datetime(&record.created_at),
                    format_datetime(&record.updated_at),
                ],
            );

            match inserted {
                Ok(_) => {
                    tx.commit()?;
                    Ok(InsertOutcome::Created)
                }
                Err(err) if is_unique_violation(&err) => {
                    Ok(InsertOutcome::Conflict { existing_id: None })
                }
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    pub async fn get_time_entry(&self, entry_id: &str) -> Result<Option<TimeEntry>> {
        let entry_id = entry_id.to_string();
        self.execute(move |conn| load_entry(conn, &entry_id)).await
    }

    /// Every entry of the employee with `status`, oldest first. No limit is
    /// applied so callers can detect duplicates.
    pub async fn list_entries_with_status(
        &self,
        employee_id: &str,
        status: EntryStatus,
    ) -> Result<Vec<TimeEntry>> {
        let employee_id = employee_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS}
                 FROM time_entries
                 WHERE employee_id = ?1 AND status = ?2
                 ORDER BY start_time ASC, id ASC"
            ))?;

            let mut rows = stmt.query(params![employee_id, status.as_str()])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_entry(row)?);
            }
            Ok(entries)
        })
        .await
    }

    /// Closes an active entry at `end_time`, computing its duration from the
    /// stored start. Nothing is written unless the entry is still active.
    pub async fn close_active_entry(
        &self,
        entry_id: &str,
        end_time: DateTime<Utc>,
    ) -> Result<CloseOutcome> {
        let entry_id = entry_id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            let entry = match load_entry(&tx, &entry_id)? {
                Some(entry) => entry,
                None => return Ok(CloseOutcome::NotFound),
            };
            if entry.status == EntryStatus::Completed {
                return Ok(CloseOutcome::AlreadyCompleted(entry));
            }
            if end_time < entry.start_time {
                return Ok(CloseOutcome::EndBeforeStart(entry));
            }

            let duration = whole_seconds_between(entry.start_time, end_time);
            let updated_at = Utc::now().max(end_time);
            let rows_affected = tx.execute(
                "UPDATE time_entries
                 SET status = ?1,
                     end_time = ?2,
                     duration_secs = ?3,
                     updated_at = ?4
                 WHERE id = ?5 AND status = 'active'",
                params![
                    EntryStatus::Completed.as_str(),
                    format_datetime(&end_time),
                    duration,
                    format_datetime(&updated_at),
                    entry_id,
                ],
            )?;

            if rows_affected == 0 {
                return match load_entry(&tx, &entry_id)? {
                    Some(current) => Ok(CloseOutcome::AlreadyCompleted(current)),
                    None => Ok(CloseOutcome::NotFound),
                };
            }

            let closed = load_entry(&tx, &entry_id)?;
            tx.commit()?;
            Ok(closed.map_or(CloseOutcome::NotFound, CloseOutcome::Closed))
        })
        .await
    }

    /// Entries of one employee whose date falls in `range`, by start time.
    pub async fn list_time_entries(
        &self,
        employee_id: &str,
        range: DateRange,
    ) -> Result<Vec<TimeEntry>> {
        let employee_id = employee_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS}
                 FROM time_entries
                 WHERE employee_id = ?1 AND entry_date BETWEEN ?2 AND ?3
                 ORDER BY start_time ASC, id ASC"
            ))?;

            let mut rows = stmt.query(params![
                employee_id,
                format_date(&range.start),
                format_date(&range.end),
            ])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_entry(row)?);
            }
            Ok(entries)
        })
        .await
    }

    /// Entries of every employee whose date falls in `range`.
    pub async fn list_time_entries_for_range(&self, range: DateRange) -> Result<Vec<TimeEntry>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS}
                 FROM time_entries
                 WHERE entry_date BETWEEN ?1 AND ?2
                 ORDER BY start_time ASC, id ASC"
            ))?;

            let mut rows = stmt.query(params![format_date(&range.start), format_date(&range.end)])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_entry(row)?);
            }
            Ok(entries)
        })
        .await
    }
}
