use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use tokio::sync::{broadcast, watch, Mutex};

use crate::{
    boundary::{Notification, Notifier, Severity},
    db::models::{EntryDraft, TimeEntry},
    errors::{TrackingError, TrackingResult},
    settings::TrackerSettings,
    utils::formatting::format_hm,
};

use super::{
    clock::ElapsedClock,
    repository::TimeEntryRepository,
    state::{SessionState, TrackingSnapshot},
};

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "entry", rename_all = "camelCase")]
pub enum StartOutcome {
    Created(TimeEntry),
    Adopted(TimeEntry),
}

impl StartOutcome {
    pub fn entry(&self) -> &TimeEntry {
        match self {
            StartOutcome::Created(entry) | StartOutcome::Adopted(entry) => entry,
        }
    }

    pub fn into_entry(self) -> TimeEntry {
        match self {
            StartOutcome::Created(entry) | StartOutcome::Adopted(entry) => entry,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "entry", rename_all = "camelCase")]
pub enum TrackingEvent {
    Started(TimeEntry),
    Adopted(TimeEntry),
    Stopped(TimeEntry),
    Idle,
}

/// Start/stop state machine for one employee session.
///
/// Local state only changes after the store confirms a write. Start and
/// stop are serialized: a second call while one is pending fails with
/// [`TrackingError::Busy`]. Clones share the same session.
#[derive(Clone)]
pub struct TrackingController {
    employee_id: String,
    repository: TimeEntryRepository,
    state: Arc<Mutex<SessionState>>,
    clock: Arc<Mutex<ElapsedClock>>,
    elapsed_rx: watch::Receiver<u64>,
    op_lock: Arc<Mutex<()>>,
    events: broadcast::Sender<TrackingEvent>,
    notifier: Arc<dyn Notifier>,
    notifications_enabled: bool,
}

impl TrackingController {
    pub fn new(
        employee_id: impl Into<String>,
        repository: TimeEntryRepository,
        notifier: Arc<dyn Notifier>,
        settings: &TrackerSettings,
    ) -> Self {
        let clock = ElapsedClock::new(settings.tick_interval());
        let elapsed_rx = clock.subscribe();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            employee_id: employee_id.into(),
            repository,
            state: Arc::new(Mutex::new(SessionState::Idle)),
            clock: Arc::new(Mutex::new(clock)),
            elapsed_rx,
            op_lock: Arc::new(Mutex::new(())),
            events,
            notifier,
            notifications_enabled: settings.notifications_enabled,
        }
    }

    pub fn employee_id(&self) -> &str {
        &self.employee_id
    }

    pub fn repository(&self) -> &TimeEntryRepository {
        &self.repository
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackingEvent> {
        self.events.subscribe()
    }

    pub fn elapsed_receiver(&self) -> watch::Receiver<u64> {
        self.elapsed_rx.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.op_lock.try_lock().is_err()
    }

    pub async fn state(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn snapshot(&self) -> TrackingSnapshot {
        let state = self.state.lock().await.clone();
        let elapsed_seconds = if state.is_tracking() {
            self.clock.lock().await.elapsed_seconds()
        } else {
            0
        };

        TrackingSnapshot {
            employee_id: self.employee_id.clone(),
            state,
            elapsed_seconds,
            busy: self.is_busy(),
        }
    }

    pub async fn initialize(&self) -> TrackingResult<SessionState> {
        let _guard = self.op_lock.lock().await;

        let active = match self.repository.find_active_entry(&self.employee_id).await {
            Ok(active) => active,
            Err(err) => {
                self.notify_failure("Could not load time tracking", &err);
                return Err(err);
            }
        };

        let next = SessionState::from_active(active);
        match next.entry() {
            Some(entry) => info!(
                "Employee {} resumes tracking entry {}",
                self.employee_id, entry.id
            ),
            None => info!("Employee {} is idle", self.employee_id),
        }
        self.apply_state(next.clone()).await;
        Ok(next)
    }

    pub async fn start(&self, draft: EntryDraft) -> TrackingResult<StartOutcome> {
        self.start_at(Utc::now(), draft).await
    }

    pub async fn start_at(&self, now: DateTime<Utc>, draft: EntryDraft) -> TrackingResult<StartOutcome> {
        let _guard = self.op_lock.try_lock().map_err(|_| TrackingError::Busy)?;

        let err = match self
            .repository
            .create_entry(&self.employee_id, &draft, now)
            .await
        {
            Ok(entry) => {
                info!(
                    "Employee {} started tracking entry {}",
                    self.employee_id, entry.id
                );
                self.apply_state(SessionState::Tracking(entry.clone())).await;
                self.emit(TrackingEvent::Started(entry.clone()));
                self.notify(Notification::new(
                    "Time tracking started",
                    describe_entry(&entry),
                    Severity::Success,
                ));
                return Ok(StartOutcome::Created(entry));
            }
            Err(err) => err,
        };

        if !err.is_already_tracking() {
            warn!("Employee {} failed to start tracking: {err}", self.employee_id);
            self.notify_failure("Could not start time tracking", &err);
            return Err(err);
        }

        match self.repository.find_active_entry(&self.employee_id).await {
            Ok(Some(existing)) => {
                info!(
                    "Employee {} already tracking; adopting entry {}",
                    self.employee_id, existing.id
                );
                self.apply_state(SessionState::Tracking(existing.clone())).await;
                self.emit(TrackingEvent::Adopted(existing.clone()));
                self.notify(Notification::new(
                    "Time tracking resumed",
                    describe_entry(&existing),
                    Severity::Info,
                ));
                Ok(StartOutcome::Adopted(existing))
            }
            // The conflicting entry was closed before it could be read back.
            Ok(None) => {
                warn!(
                    "Employee {} conflict on start but no active entry found",
                    self.employee_id
                );
                self.notify_failure("Could not start time tracking", &err);
                Err(err)
            }
            Err(lookup_err) => {
                self.notify_failure("Could not start time tracking", &lookup_err);
                Err(lookup_err)
            }
        }
    }

    pub async fn stop(&self) -> TrackingResult<TimeEntry> {
        self.stop_at(Utc::now()).await
    }

    /// Closes the tracked entry at `now` and returns it with its duration.
    ///
    /// On failure the state stays `Tracking`. If the store reports the entry
    /// as already completed, the stored entry is returned and the session
    /// goes `Idle`, which makes a retried stop harmless.
    pub async fn stop_at(&self, now: DateTime<Utc>) -> TrackingResult<TimeEntry> {
        let _guard = self.op_lock.try_lock().map_err(|_| TrackingError::Busy)?;

        let entry = match self.state.lock().await.entry().cloned() {
            Some(entry) => entry,
            None => {
                self.notify_failure("Could not stop time tracking", &TrackingError::NotTracking);
                return Err(TrackingError::NotTracking);
            }
        };

        match self.repository.close_entry(&entry.id, now).await {
            Ok(closed) => {
                info!(
                    "Employee {} stopped entry {} after {}s",
                    self.employee_id,
                    closed.id,
                    closed.duration.unwrap_or_default()
                );
                self.finish(closed.clone()).await;
                Ok(closed)
            }
            Err(TrackingError::InvalidState(reason)) => {
                match self.repository.get_entry(&entry.id).await {
                    Ok(current) if !current.is_active() => {
                        info!(
                            "Entry {} was already completed in the store; employee {} is idle",
                            current.id, self.employee_id
                        );
                        self.finish(current.clone()).await;
                        Ok(current)
                    }
                    _ => {
                        let err = TrackingError::InvalidState(reason);
                        warn!("Employee {} failed to stop entry {}: {err}", self.employee_id, entry.id);
                        self.notify_failure("Could not stop time tracking", &err);
                        Err(err)
                    }
                }
            }
            Err(err) => {
                warn!("Employee {} failed to stop entry {}: {err}", self.employee_id, entry.id);
                self.notify_failure("Could not stop time tracking", &err);
                Err(err)
            }
        }
    }

    pub async fn suspend_clock(&self) {
        self.clock.lock().await.suspend().await;
    }

    pub async fn resume_clock(&self) {
        let mut clock = self.clock.lock().await;
        if self.state.lock().await.is_tracking() {
            clock.resume();
        }
    }

    pub async fn close(&self) {
        self.clock.lock().await.stop().await;
        info!("Closed tracking session for employee {}", self.employee_id);
    }

    async fn finish(&self, closed: TimeEntry) {
        self.apply_state(SessionState::Idle).await;
        self.notify(Notification::new(
            "Time tracking stopped",
            format!("Tracked {}", format_hm(closed.duration.unwrap_or_default())),
            Severity::Success,
        ));
        self.emit(TrackingEvent::Stopped(closed));
        self.emit(TrackingEvent::Idle);
    }

    async fn apply_state(&self, next: SessionState) {
        let mut clock = self.clock.lock().await;
        match next.entry() {
            Some(entry) => {
                if clock.started_at() != Some(entry.start_time) || !clock.is_running() {
                    clock.start(entry.start_time).await;
                }
            }
            None => clock.stop().await,
        }
        *self.state.lock().await = next;
    }

    fn emit(&self, event: TrackingEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn notify(&self, notification: Notification) {
        if self.notifications_enabled {
            self.notifier.notify(notification);
        }
    }

    fn notify_failure(&self, title: &str, err: &TrackingError) {
        self.notify(Notification::new(title, err.to_string(), Severity::Error));
    }
}

fn describe_entry(entry: &TimeEntry) -> String {
    match (&entry.description, &entry.project_id) {
        (Some(description), _) => description.clone(),
        (None, Some(project_id)) => format!("Project {project_id}"),
        (None, None) => format!("Since {}", entry.start_time.format("%H:%M UTC")),
    }
}
