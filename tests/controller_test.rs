mod common;

use std::sync::Arc;

use chrono::{Datelike, Duration};
use common::{
    at, controller_for, drop_active_index, insert_raw_active, install_interleaved_writer,
    setup_repository, test_settings,
};
use timetrack::{
    boundary::{Severity, StaticDirectory},
    AppState, DateRange, Database, EntryDraft, EntryStatus, SessionState, StartOutcome,
    TrackingError, TrackingEvent,
};

#[tokio::test]
async fn start_then_stop_records_exact_duration() {
    let repository = setup_repository();
    let (controller, notifier) = controller_for(&repository, "emp-1");
    assert_eq!(controller.initialize().await.unwrap(), SessionState::Idle);

    let t0 = at(2024, 6, 10, 9, 0, 0);
    let outcome = controller
        .start_at(t0, EntryDraft::new().project("p1").description("Inspection"))
        .await
        .unwrap();
    let entry = match outcome {
        StartOutcome::Created(entry) => entry,
        other => panic!("expected a new entry, got {other:?}"),
    };
    assert_eq!(entry.status, EntryStatus::Active);
    assert_eq!(entry.start_time, t0);
    assert_eq!(controller.state().await, SessionState::Tracking(entry.clone()));

    let closed = controller.stop_at(t0 + Duration::seconds(125)).await.unwrap();
    assert_eq!(closed.id, entry.id);
    assert_eq!(closed.duration, Some(125));
    assert_eq!(closed.status, EntryStatus::Completed);
    assert_eq!(controller.state().await, SessionState::Idle);
    assert_eq!(notifier.count(Severity::Success), 2);
}

#[tokio::test]
async fn fresh_controller_adopts_session_after_reload() {
    let repository = setup_repository();
    let (first, _) = controller_for(&repository, "emp-1");
    first.initialize().await.unwrap();
    let entry = first
        .start_at(at(2024, 6, 10, 9, 0, 0), EntryDraft::new())
        .await
        .unwrap()
        .into_entry();

    let (reloaded, _) = controller_for(&repository, "emp-1");
    let state = reloaded.initialize().await.unwrap();
    assert_eq!(state.entry_id(), Some(entry.id.as_str()));

    let snapshot = reloaded.snapshot().await;
    assert!(snapshot.state.is_tracking());
    // Elapsed is derived from the stored start time, which is long past.
    assert!(snapshot.elapsed_seconds > 0);
}

#[tokio::test]
async fn initialize_twice_yields_same_state() {
    let repository = setup_repository();
    let (controller, _) = controller_for(&repository, "emp-1");

    let idle_a = controller.initialize().await.unwrap();
    let idle_b = controller.initialize().await.unwrap();
    assert_eq!(idle_a, idle_b);

    controller
        .start_at(at(2024, 6, 10, 9, 0, 0), EntryDraft::new())
        .await
        .unwrap();
    let tracking_a = controller.initialize().await.unwrap();
    let tracking_b = controller.initialize().await.unwrap();
    assert!(tracking_a.is_tracking());
    assert_eq!(tracking_a.entry_id(), tracking_b.entry_id());
}

#[tokio::test]
async fn double_start_keeps_single_active_entry() {
    let repository = setup_repository();
    let (controller, notifier) = controller_for(&repository, "emp-1");
    controller.initialize().await.unwrap();
    let t0 = at(2024, 6, 10, 9, 0, 0);

    let first = controller.start_at(t0, EntryDraft::new()).await.unwrap();
    let second = controller
        .start_at(t0 + Duration::seconds(30), EntryDraft::new())
        .await
        .unwrap();

    assert!(matches!(first, StartOutcome::Created(_)));
    assert!(matches!(second, StartOutcome::Adopted(_)));
    assert_eq!(first.entry().id, second.entry().id);
    assert_eq!(controller.state().await.entry_id(), Some(first.entry().id.as_str()));

    let entries = repository
        .list_entries("emp-1", DateRange::single(t0.date_naive()))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries.iter().filter(|e| e.is_active()).count(), 1);
    assert_eq!(notifier.count(Severity::Error), 0);
}

#[tokio::test]
async fn start_from_second_device_adopts_existing_entry() {
    let repository = setup_repository();
    let (laptop, _) = controller_for(&repository, "emp-1");
    let (phone, _) = controller_for(&repository, "emp-1");
    laptop.initialize().await.unwrap();
    phone.initialize().await.unwrap();

    let t0 = at(2024, 6, 10, 9, 0, 0);
    let on_laptop = laptop.start_at(t0, EntryDraft::new()).await.unwrap();
    let on_phone = phone
        .start_at(t0 + Duration::minutes(5), EntryDraft::new())
        .await
        .unwrap();

    assert!(matches!(on_phone, StartOutcome::Adopted(_)));
    assert_eq!(on_phone.entry().id, on_laptop.entry().id);
}

#[tokio::test]
async fn alternating_starts_and_stops_never_leave_two_active_entries() {
    let repository = setup_repository();
    let (controller, _) = controller_for(&repository, "emp-1");
    controller.initialize().await.unwrap();
    let t0 = at(2024, 6, 10, 8, 0, 0);
    let range = DateRange::single(t0.date_naive());

    let script = ["start", "start", "stop", "stop", "start", "stop", "start", "start", "stop"];
    for (step, action) in script.iter().enumerate() {
        let now = t0 + Duration::minutes(step as i64 * 10);
        let _ = match *action {
            "start" => controller.start_at(now, EntryDraft::new()).await.map(|_| ()),
            _ => controller.stop_at(now).await.map(|_| ()),
        };

        let entries = repository.list_entries("emp-1", range).await.unwrap();
        assert!(entries.iter().filter(|e| e.is_active()).count() <= 1, "step {step}");
    }
}

#[tokio::test]
async fn stop_while_idle_is_not_tracking() {
    let repository = setup_repository();
    let (controller, notifier) = controller_for(&repository, "emp-1");
    controller.initialize().await.unwrap();

    let err = controller.stop_at(at(2024, 6, 10, 9, 0, 0)).await.unwrap_err();
    assert!(matches!(err, TrackingError::NotTracking));
    assert_eq!(notifier.count(Severity::Error), 1);
}

#[tokio::test]
async fn failed_stop_keeps_tracking_and_can_be_retried() {
    let repository = setup_repository();
    let (controller, notifier) = controller_for(&repository, "emp-1");
    controller.initialize().await.unwrap();
    let t0 = at(2024, 6, 10, 9, 0, 0);
    let entry = controller.start_at(t0, EntryDraft::new()).await.unwrap().into_entry();

    // An end before the start is rejected by the repository.
    let err = controller.stop_at(t0 - Duration::seconds(10)).await.unwrap_err();
    assert!(err.is_invalid_state());
    assert_eq!(controller.state().await.entry_id(), Some(entry.id.as_str()));
    assert_eq!(notifier.count(Severity::Error), 1);

    let stored = repository.get_entry(&entry.id).await.unwrap();
    assert_eq!(stored.status, EntryStatus::Active);

    let closed = controller.stop_at(t0 + Duration::seconds(60)).await.unwrap();
    assert_eq!(closed.duration, Some(60));
    assert_eq!(controller.state().await, SessionState::Idle);
}

#[tokio::test]
async fn stop_after_entry_closed_elsewhere_is_a_no_op_success() {
    let repository = setup_repository();
    let (controller, _) = controller_for(&repository, "emp-1");
    controller.initialize().await.unwrap();
    let t0 = at(2024, 6, 10, 9, 0, 0);
    let entry = controller.start_at(t0, EntryDraft::new()).await.unwrap().into_entry();

    // Another device closes the entry first.
    repository
        .close_entry(&entry.id, t0 + Duration::seconds(300))
        .await
        .unwrap();

    let result = controller.stop_at(t0 + Duration::seconds(900)).await.unwrap();
    assert_eq!(result.id, entry.id);
    assert_eq!(result.duration, Some(300));
    assert_eq!(controller.state().await, SessionState::Idle);
}

#[tokio::test]
async fn consistency_error_surfaces_from_initialize() {
    let repository = setup_repository();
    let db = repository.database().clone();
    drop_active_index(&db).await;
    insert_raw_active(&db, "a", "emp-1", at(2024, 6, 10, 9, 0, 0)).await;
    insert_raw_active(&db, "b", "emp-1", at(2024, 6, 10, 9, 30, 0)).await;

    let (controller, notifier) = controller_for(&repository, "emp-1");
    let err = controller.initialize().await.unwrap_err();
    assert!(matches!(err, TrackingError::Consistency { count: 2, .. }));
    assert_eq!(controller.state().await, SessionState::Idle);
    assert_eq!(notifier.count(Severity::Error), 1);
}

#[tokio::test]
async fn conflict_with_no_readable_entry_stays_idle() {
    let repository = setup_repository();
    let (controller, notifier) = controller_for(&repository, "emp-1");
    controller.initialize().await.unwrap();
    install_interleaved_writer(repository.database()).await;

    let err = controller
        .start_at(at(2024, 6, 10, 9, 0, 0), EntryDraft::new())
        .await
        .unwrap_err();

    assert!(err.is_already_tracking(), "got {err:?}");
    assert_eq!(controller.state().await, SessionState::Idle);
    assert_eq!(controller.snapshot().await.elapsed_seconds, 0);
    assert_eq!(notifier.count(Severity::Error), 1);
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn concurrent_start_is_rejected_as_busy() {
    let repository = setup_repository();
    let (controller, _) = controller_for(&repository, "emp-1");
    controller.initialize().await.unwrap();
    let t0 = at(2024, 6, 10, 9, 0, 0);

    let (a, b) = tokio::join!(
        controller.start_at(t0, EntryDraft::new()),
        controller.start_at(t0, EntryDraft::new()),
    );

    let results = [a, b];
    let started = results.iter().filter(|r| r.is_ok()).count();
    let busy = results
        .iter()
        .filter(|r| matches!(r, Err(TrackingError::Busy)))
        .count();
    assert_eq!(started, 1);
    assert_eq!(busy, 1);
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn transitions_are_broadcast() {
    let repository = setup_repository();
    let (controller, _) = controller_for(&repository, "emp-1");
    controller.initialize().await.unwrap();
    let mut events = controller.subscribe();
    let t0 = at(2024, 6, 10, 9, 0, 0);

    let entry = controller.start_at(t0, EntryDraft::new()).await.unwrap().into_entry();
    controller.stop_at(t0 + Duration::seconds(5)).await.unwrap();

    assert_eq!(events.recv().await.unwrap(), TrackingEvent::Started(entry.clone()));
    match events.recv().await.unwrap() {
        TrackingEvent::Stopped(closed) => assert_eq!(closed.id, entry.id),
        other => panic!("expected Stopped, got {other:?}"),
    }
    assert_eq!(events.recv().await.unwrap(), TrackingEvent::Idle);
}

#[tokio::test]
async fn clock_follows_session() {
    let repository = setup_repository();
    let (controller, _) = controller_for(&repository, "emp-1");
    controller.initialize().await.unwrap();
    let elapsed = controller.elapsed_receiver();

    let t0 = chrono::Utc::now() - Duration::seconds(42);
    controller.start_at(t0, EntryDraft::new()).await.unwrap();
    assert!(*elapsed.borrow() >= 42);
    assert!(controller.snapshot().await.elapsed_seconds >= 42);

    controller.stop().await.unwrap();
    assert_eq!(controller.snapshot().await.elapsed_seconds, 0);
}

#[tokio::test]
async fn app_state_opens_sessions_by_credential() {
    let directory = Arc::new(StaticDirectory::new().with_employee("badge-7", "emp-7", "Lee Moreno"));
    let notifier = Arc::new(common::RecordingNotifier::default());
    let app = AppState::new(
        Database::in_memory().unwrap(),
        test_settings(),
        directory,
        notifier,
    );

    let err = app.open_session("badge-unknown").await.err().unwrap();
    assert!(matches!(err, TrackingError::UnknownEmployee));

    let session = app.open_session("badge-7").await.unwrap();
    assert_eq!(session.employee_id(), "emp-7");
    assert_eq!(session.state().await, SessionState::Idle);
    let entry = session.start(EntryDraft::new()).await.unwrap().into_entry();
    session.close().await;
    drop(session);

    let again = app.open_session("badge-7").await.unwrap();
    assert_eq!(again.state().await.entry_id(), Some(entry.id.as_str()));

    let table = app
        .day_table(&["emp-7", "emp-8"], entry.date, &Default::default())
        .await
        .unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table[0].entry_count, 1);
    assert_eq!(table[1].entry_count, 0);

    let month = app
        .month_record("emp-7", entry.date.year(), entry.date.month(), &Default::default())
        .await
        .unwrap();
    assert_eq!((month.year, month.month), (entry.date.year(), entry.date.month()));
    assert_eq!(month.present_days, 1);

    let invalid = app
        .month_record("emp-7", 2024, 13, &Default::default())
        .await
        .unwrap();
    assert!(invalid.days.is_empty());
}
