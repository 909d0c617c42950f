//! Attendance derived from time entries.
//!
//! Everything here is a pure function of its inputs. The current instant is
//! passed in as `now` so a live total can be reproduced in tests.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

use crate::{
    db::models::{DateRange, TimeEntry},
    tracking::clock::elapsed_seconds,
};

use super::types::{
    AttendanceStatus, DayAttendanceRecord, LeaveCalendar, MonthAttendanceRecord,
    WeekAttendanceRecord,
};

/// Seconds an entry contributes to a total at `now`.
///
/// Active entries count their live elapsed time. Completed entries use the
/// stored duration, fall back to `end - start`, and count zero when both are
/// missing.
pub fn entry_seconds(entry: &TimeEntry, now: DateTime<Utc>) -> i64 {
    if entry.is_active() {
        i64::try_from(elapsed_seconds(entry.start_time, now)).unwrap_or(i64::MAX)
    } else {
        entry.recorded_duration().unwrap_or(0)
    }
}

/// Monday on or before `date`, clamped to the first representable day.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN)
}

/// Monday to Sunday around `reference`.
pub fn week_range(reference: NaiveDate) -> DateRange {
    let start = week_start(reference);
    DateRange::new(start, start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX))
}

/// Up to seven consecutive days from `start`; fewer at the end of the calendar.
pub fn week_days(start: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    days_from(start).take(7)
}

/// First to last day of the month containing `reference`.
pub fn month_range(reference: NaiveDate) -> DateRange {
    let first = reference.with_day(1).unwrap_or(reference);
    let last = days_from(first)
        .take_while(|date| date.month() == first.month())
        .last()
        .unwrap_or(first);
    DateRange::new(first, last)
}

fn days_from(start: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), |date| date.succ_opt())
}

pub fn compute_day_record(
    entries: &[TimeEntry],
    employee_id: &str,
    date: NaiveDate,
    leave: &LeaveCalendar,
    now: DateTime<Utc>,
) -> DayAttendanceRecord {
    let mut day: Vec<&TimeEntry> = entries
        .iter()
        .filter(|entry| entry.employee_id == employee_id && entry.date == date)
        .collect();

    if day.is_empty() {
        return DayAttendanceRecord::without_entries(employee_id, date, leave.status(employee_id, date));
    }

    // Ties on start time resolve by id so identical input gives identical output.
    day.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.id.cmp(&b.id))
    });

    let any_active = day.iter().any(|entry| entry.is_active());
    let clock_out = if any_active {
        None
    } else {
        day.iter().filter_map(|entry| entry.end_time).max()
    };
    let total_duration = day
        .iter()
        .map(|entry| entry_seconds(entry, now))
        .fold(0i64, i64::saturating_add);

    DayAttendanceRecord {
        employee_id: employee_id.to_string(),
        date,
        clock_in: Some(day[0].start_time),
        clock_out,
        total_duration,
        status: if any_active {
            AttendanceStatus::Active
        } else {
            AttendanceStatus::Present
        },
        entry_count: day.len(),
        first_entry_id: Some(day[0].id.clone()),
    }
}

/// Seven day records from the Monday on or before `reference`.
pub fn compute_week_record(
    entries: &[TimeEntry],
    employee_id: &str,
    reference: NaiveDate,
    leave: &LeaveCalendar,
    now: DateTime<Utc>,
) -> WeekAttendanceRecord {
    let start = week_start(reference);
    let days: Vec<DayAttendanceRecord> = week_days(start)
        .map(|date| compute_day_record(entries, employee_id, date, leave, now))
        .collect();
    let total_duration = sum_durations(&days);

    WeekAttendanceRecord {
        employee_id: employee_id.to_string(),
        week_start: start,
        days,
        total_duration,
    }
}

/// Every day of `month` in `year`, with day counts by status. An invalid
/// month yields a record with no days.
pub fn compute_month_record(
    entries: &[TimeEntry],
    employee_id: &str,
    year: i32,
    month: u32,
    leave: &LeaveCalendar,
    now: DateTime<Utc>,
) -> MonthAttendanceRecord {
    let days: Vec<DayAttendanceRecord> = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(first) => {
            let range = month_range(first);
            days_from(range.start)
                .take_while(|date| *date <= range.end)
                .map(|date| compute_day_record(entries, employee_id, date, leave, now))
                .collect()
        }
        None => Vec::new(),
    };

    let count = |status: AttendanceStatus| days.iter().filter(|day| day.status == status).count();
    let present_days = days.iter().filter(|day| day.is_worked()).count();
    let absent_days = count(AttendanceStatus::Absent);
    let leave_days = count(AttendanceStatus::OnLeave);
    let total_duration = sum_durations(&days);

    MonthAttendanceRecord {
        employee_id: employee_id.to_string(),
        year,
        month,
        days,
        total_duration,
        present_days,
        absent_days,
        leave_days,
    }
}

/// One day record per employee, in the order the ids are given.
pub fn compute_day_table<S: AsRef<str>>(
    entries: &[TimeEntry],
    employee_ids: &[S],
    date: NaiveDate,
    leave: &LeaveCalendar,
    now: DateTime<Utc>,
) -> Vec<DayAttendanceRecord> {
    employee_ids
        .iter()
        .map(|employee_id| compute_day_record(entries, employee_id.as_ref(), date, leave, now))
        .collect()
}

fn sum_durations(days: &[DayAttendanceRecord]) -> i64 {
    days.iter()
        .map(|day| day.total_duration)
        .fold(0i64, i64::saturating_add)
}
