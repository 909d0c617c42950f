use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    Absent,
    Present,
    /// At least one entry of the day is still running.
    Active,
    OnLeave,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Present => "present",
            AttendanceStatus::Active => "active",
            AttendanceStatus::OnLeave => "on-leave",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LeaveStatus {
    #[default]
    Available,
    OnLeave,
}

/// Leave days supplied by the caller, keyed by employee and date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveCalendar {
    days: HashSet<(String, NaiveDate)>,
}

impl LeaveCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, employee_id: impl Into<String>, date: NaiveDate) {
        self.days.insert((employee_id.into(), date));
    }

    pub fn with_leave(mut self, employee_id: impl Into<String>, date: NaiveDate) -> Self {
        self.mark(employee_id, date);
        self
    }

    pub fn status(&self, employee_id: &str, date: NaiveDate) -> LeaveStatus {
        if self.days.contains(&(employee_id.to_string(), date)) {
            LeaveStatus::OnLeave
        } else {
            LeaveStatus::Available
        }
    }
}

/// Derived summary of one employee's entries on one date. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayAttendanceRecord {
    pub employee_id: String,
    pub date: NaiveDate,
    pub clock_in: Option<DateTime<Utc>>,
    /// Absent while any entry of the day is still active.
    pub clock_out: Option<DateTime<Utc>>,
    /// Seconds; includes live elapsed time of an active entry.
    pub total_duration: i64,
    pub status: AttendanceStatus,
    pub entry_count: usize,
    /// Entry that defines `clock_in`, lowest `(start_time, id)`.
    pub first_entry_id: Option<String>,
}

impl DayAttendanceRecord {
    pub(crate) fn without_entries(employee_id: &str, date: NaiveDate, leave: LeaveStatus) -> Self {
        let status = match leave {
            LeaveStatus::OnLeave => AttendanceStatus::OnLeave,
            LeaveStatus::Available => AttendanceStatus::Absent,
        };
        Self {
            employee_id: employee_id.to_string(),
            date,
            clock_in: None,
            clock_out: None,
            total_duration: 0,
            status,
            entry_count: 0,
            first_entry_id: None,
        }
    }

    pub fn is_worked(&self) -> bool {
        matches!(self.status, AttendanceStatus::Present | AttendanceStatus::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekAttendanceRecord {
    pub employee_id: String,
    /// Monday of the week.
    pub week_start: NaiveDate,
    /// Monday through Sunday.
    pub days: Vec<DayAttendanceRecord>,
    pub total_duration: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthAttendanceRecord {
    pub employee_id: String,
    pub year: i32,
    pub month: u32,
    pub days: Vec<DayAttendanceRecord>,
    pub total_duration: i64,
    pub present_days: usize,
    pub absent_days: usize,
    pub leave_days: usize,
}
