//! Display-ready view models. They format what the controller and the
//! aggregator produce and hold no tracking logic of their own.

mod attendance_table;
mod timer_card;
mod timesheet;

pub use attendance_table::{AttendanceRow, AttendanceTable};
pub use timer_card::TimerCard;
pub use timesheet::{TimesheetRow, WeeklyTimesheet};
