mod aggregator;
mod types;

pub use aggregator::{
    compute_day_record, compute_day_table, compute_month_record, compute_week_record,
    entry_seconds, month_range, week_days, week_range, week_start,
};
pub use types::{
    AttendanceStatus, DayAttendanceRecord, LeaveCalendar, LeaveStatus, MonthAttendanceRecord,
    WeekAttendanceRecord,
};
