use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::{
    attendance::{compute_week_record, entry_seconds, week_days, week_start, LeaveCalendar},
    boundary::ProjectDirectory,
    db::models::TimeEntry,
    utils::formatting::format_hm,
};

const NO_PROJECT: &str = "No project";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetRow {
    pub project_id: Option<String>,
    pub label: String,
    /// Seconds per day, Monday first.
    pub day_seconds: Vec<i64>,
    pub total_seconds: i64,
    pub total_label: String,
}

/// One employee's week, split by project.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTimesheet {
    pub employee_id: String,
    pub week_start: NaiveDate,
    pub days: Vec<NaiveDate>,
    pub rows: Vec<TimesheetRow>,
    pub day_totals: Vec<i64>,
    pub day_total_labels: Vec<String>,
    pub week_total: i64,
    pub week_total_label: String,
}

impl WeeklyTimesheet {
    pub fn build(
        entries: &[TimeEntry],
        employee_id: &str,
        reference: NaiveDate,
        directory: &dyn ProjectDirectory,
        now: DateTime<Utc>,
    ) -> Self {
        let start = week_start(reference);
        let days: Vec<NaiveDate> = week_days(start).collect();

        let mut by_project: BTreeMap<Option<String>, Vec<i64>> = BTreeMap::new();
        for entry in entries.iter().filter(|entry| entry.employee_id == employee_id) {
            let Some(column) = days.iter().position(|day| *day == entry.date) else {
                continue;
            };
            let row = by_project
                .entry(entry.project_id.clone())
                .or_insert_with(|| vec![0; days.len()]);
            row[column] = row[column].saturating_add(entry_seconds(entry, now));
        }

        let rows = by_project
            .into_iter()
            .map(|(project_id, day_seconds)| {
                let total_seconds = day_seconds.iter().sum();
                let label = match project_id.as_deref() {
                    Some(id) => directory.project_name(id).unwrap_or_else(|| id.to_string()),
                    None => NO_PROJECT.to_string(),
                };
                TimesheetRow {
                    project_id,
                    label,
                    day_seconds,
                    total_seconds,
                    total_label: format_hm(total_seconds),
                }
            })
            .collect();

        let week = compute_week_record(entries, employee_id, start, &LeaveCalendar::default(), now);
        let day_totals: Vec<i64> = week.days.iter().map(|day| day.total_duration).collect();

        Self {
            employee_id: employee_id.to_string(),
            week_start: start,
            days,
            rows,
            day_total_labels: day_totals.iter().map(|secs| format_hm(*secs)).collect(),
            day_totals,
            week_total: week.total_duration,
            week_total_label: format_hm(week.total_duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{boundary::StaticDirectory, db::models::EntryStatus};
    use chrono::{Duration, TimeZone};

    fn completed(id: &str, project: Option<&str>, start: DateTime<Utc>, secs: i64) -> TimeEntry {
        TimeEntry {
            id: id.into(),
            employee_id: "emp-1".into(),
            project_id: project.map(str::to_string),
            task_id: None,
            description: None,
            date: start.date_naive(),
            start_time: start,
            end_time: Some(start + Duration::seconds(secs)),
            duration: Some(secs),
            status: EntryStatus::Completed,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn splits_week_by_project() {
        let monday = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
        let tuesday = monday + Duration::days(1);
        let entries = vec![
            completed("a", Some("p1"), monday, 3600),
            completed("b", None, monday + Duration::hours(2), 900),
            completed("c", Some("p1"), tuesday, 1800),
        ];
        let directory = StaticDirectory::new().with_project("p1", "Harbor Bridge");

        let sheet = WeeklyTimesheet::build(&entries, "emp-1", tuesday.date_naive(), &directory, tuesday);

        assert_eq!(sheet.week_start, monday.date_naive());
        assert_eq!(sheet.rows.len(), 2);
        let no_project = &sheet.rows[0];
        assert_eq!(no_project.label, NO_PROJECT);
        assert_eq!(no_project.day_seconds[0], 900);
        let harbor = &sheet.rows[1];
        assert_eq!(harbor.label, "Harbor Bridge");
        assert_eq!(harbor.day_seconds[..2], [3600, 1800]);
        assert_eq!(harbor.total_label, "1h 30m");
        assert_eq!(sheet.day_totals[0], 4500);
        assert_eq!(sheet.week_total, 6300);
        assert_eq!(sheet.week_total_label, "1h 45m");
    }

    #[test]
    fn last_calendar_week_is_truncated() {
        let sheet = WeeklyTimesheet::build(
            &[],
            "emp-1",
            NaiveDate::MAX,
            &StaticDirectory::new(),
            Utc::now(),
        );

        assert!(sheet.days.len() <= 7);
        assert_eq!(sheet.days.last(), Some(&NaiveDate::MAX));
        assert_eq!(sheet.day_totals.len(), sheet.days.len());
        assert_eq!(sheet.week_total, 0);
    }
}
