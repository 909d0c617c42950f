use std::{path::Path, sync::Arc};

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use log::{info, warn};

use crate::{
    attendance::{
        compute_day_table, compute_month_record, compute_week_record, month_range, week_range,
        DayAttendanceRecord, LeaveCalendar, MonthAttendanceRecord, WeekAttendanceRecord,
    },
    boundary::{IdentityProvider, Notifier},
    db::{models::DateRange, Database},
    errors::{TrackingError, TrackingResult},
    settings::TrackerSettings,
    tracking::{TimeEntryRepository, TrackingController},
};

/// Long-lived handles shared by every employee session.
///
/// Sessions are never global: each [`open_session`](Self::open_session)
/// call hands back a controller owned by the caller and discarded at sign-out.
pub struct AppState {
    db: Database,
    repository: TimeEntryRepository,
    settings: TrackerSettings,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        db: Database,
        settings: TrackerSettings,
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let repository = TimeEntryRepository::new(db.clone(), settings.utc_offset());
        Self {
            db,
            repository,
            settings,
            identity,
            notifier,
        }
    }

    /// Opens (or creates) the database named by the settings inside `data_dir`.
    pub fn open(
        data_dir: &Path,
        settings: TrackerSettings,
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db = Database::new(data_dir.join(&settings.database_file))?;
        Ok(Self::new(db, settings, identity, notifier))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn repository(&self) -> &TimeEntryRepository {
        &self.repository
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Resolves `credential` to an employee and returns that employee's
    /// controller, already reconciled with the store.
    pub async fn open_session(&self, credential: &str) -> TrackingResult<TrackingController> {
        let employee_id = match self.identity.resolve_employee(credential)? {
            Some(employee_id) => employee_id,
            None => {
                warn!("Sign-in rejected: unknown credential");
                return Err(TrackingError::UnknownEmployee);
            }
        };

        let controller = TrackingController::new(
            employee_id.clone(),
            self.repository.clone(),
            self.notifier.clone(),
            &self.settings,
        );
        controller.initialize().await?;
        info!("Opened tracking session for employee {employee_id}");
        Ok(controller)
    }

    pub async fn day_table<S: AsRef<str>>(
        &self,
        employee_ids: &[S],
        date: NaiveDate,
        leave: &LeaveCalendar,
    ) -> TrackingResult<Vec<DayAttendanceRecord>> {
        let entries = self.repository.list_all_entries(DateRange::single(date)).await?;
        Ok(compute_day_table(&entries, employee_ids, date, leave, Utc::now()))
    }

    pub async fn week_record(
        &self,
        employee_id: &str,
        reference: NaiveDate,
        leave: &LeaveCalendar,
    ) -> TrackingResult<WeekAttendanceRecord> {
        let entries = self
            .repository
            .list_entries(employee_id, week_range(reference))
            .await?;
        Ok(compute_week_record(&entries, employee_id, reference, leave, Utc::now()))
    }

    pub async fn month_record(
        &self,
        employee_id: &str,
        year: i32,
        month: u32,
        leave: &LeaveCalendar,
    ) -> TrackingResult<MonthAttendanceRecord> {
        let entries = match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(first) => {
                self.repository
                    .list_entries(employee_id, month_range(first))
                    .await?
            }
            None => Vec::new(),
        };
        Ok(compute_month_record(&entries, employee_id, year, month, leave, Utc::now()))
    }
}
