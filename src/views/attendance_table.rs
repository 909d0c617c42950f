use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;

use crate::{
    attendance::{AttendanceStatus, DayAttendanceRecord},
    boundary::EmployeeDirectory,
    utils::formatting::{format_clock, format_hm},
};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRow {
    pub employee_id: String,
    pub employee_name: String,
    pub clock_in: Option<String>,
    pub clock_out: Option<String>,
    pub total: String,
    pub status: AttendanceStatus,
    pub status_label: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceTable {
    pub date: NaiveDate,
    pub rows: Vec<AttendanceRow>,
    pub present_count: usize,
    pub absent_count: usize,
    pub leave_count: usize,
}

fn status_label(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Absent => "Absent",
        AttendanceStatus::Present => "Present",
        AttendanceStatus::Active => "Working now",
        AttendanceStatus::OnLeave => "On leave",
    }
}

impl AttendanceTable {
    /// Rows keep the order of `records`. Times are shown in `offset`.
    pub fn build(
        date: NaiveDate,
        records: &[DayAttendanceRecord],
        directory: &dyn EmployeeDirectory,
        offset: &FixedOffset,
    ) -> Self {
        let rows: Vec<AttendanceRow> = records
            .iter()
            .map(|record| AttendanceRow {
                employee_id: record.employee_id.clone(),
                employee_name: directory
                    .employee_name(&record.employee_id)
                    .unwrap_or_else(|| record.employee_id.clone()),
                clock_in: record.clock_in.as_ref().map(|at| format_clock(at, offset)),
                clock_out: record.clock_out.as_ref().map(|at| format_clock(at, offset)),
                total: format_hm(record.total_duration),
                status: record.status,
                status_label: status_label(record.status).to_string(),
                entry_count: record.entry_count,
            })
            .collect();

        let count = |wanted: &[AttendanceStatus]| {
            rows.iter().filter(|row| wanted.contains(&row.status)).count()
        };
        let present_count = count(&[AttendanceStatus::Present, AttendanceStatus::Active]);
        let absent_count = count(&[AttendanceStatus::Absent]);
        let leave_count = count(&[AttendanceStatus::OnLeave]);

        Self {
            date,
            rows,
            present_count,
            absent_count,
            leave_count,
        }
    }
}
