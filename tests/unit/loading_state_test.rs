//! Unit tests for the loading state machine

use std::sync::{Arc, Mutex};

use flipcache::loader::{LoaderState, LoaderStatus, LoadingStateMachine};

#[test]
fn full_sequence_reaches_ready() {
    let mut machine = LoadingStateMachine::new();
    assert_eq!(machine.status(), LoaderStatus::Idle);
    assert_eq!(machine.progress(), 0.0);

    machine.begin().unwrap();
    assert_eq!(machine.progress(), 10.0);
    machine.data_ready().unwrap();
    machine.update_progress(1, 4).unwrap();
    assert_eq!(machine.progress(), 30.0);
    machine.update_progress(4, 4).unwrap();
    assert_eq!(machine.progress(), 90.0);
    machine.images_ready().unwrap();
    assert_eq!(machine.progress(), 95.0);
    machine.engine_ready().unwrap();
    assert_eq!(machine.status(), LoaderStatus::Ready);
    assert_eq!(machine.progress(), 100.0);
    assert_eq!(machine.state().status_text, "Ready!");
}

#[test]
fn skipping_a_step_is_rejected() {
    let mut machine = LoadingStateMachine::new();
    let err = machine.images_ready().unwrap_err();
    assert_eq!(err.from, LoaderStatus::Idle);
    assert_eq!(machine.status(), LoaderStatus::Idle);
}

#[test]
fn progress_outside_preloading_is_rejected() {
    let mut machine = LoadingStateMachine::new();
    machine.begin().unwrap();
    assert!(machine.update_progress(1, 2).is_err());
    assert_eq!(machine.progress(), 10.0);
}

#[test]
fn zero_total_leaves_progress_alone() {
    let mut machine = LoadingStateMachine::new();
    machine.begin().unwrap();
    machine.data_ready().unwrap();
    machine.update_progress(0, 0).unwrap();
    assert_eq!(machine.progress(), 10.0);
}

#[test]
fn error_is_terminal() {
    let mut machine = LoadingStateMachine::new();
    machine.begin().unwrap();
    machine.fail("Failed to load pages: 500 Internal Server Error").unwrap();
    assert_eq!(machine.status(), LoaderStatus::Error);
    assert_eq!(
        machine.error_message(),
        Some("Failed to load pages: 500 Internal Server Error")
    );
    assert!(machine.fail("again").is_err());
    assert!(machine.begin().is_err());
}

#[test]
fn observers_see_every_snapshot() {
    let seen: Arc<Mutex<Vec<LoaderStatus>>> = Arc::default();
    let sink = seen.clone();
    let mut machine = LoadingStateMachine::new();
    machine.subscribe(Arc::new(move |s: &LoaderState| sink.lock().unwrap().push(s.status)));

    machine.begin().unwrap();
    machine.data_ready().unwrap();
    machine.fail("boom").unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            LoaderStatus::FetchingData,
            LoaderStatus::PreloadingImages,
            LoaderStatus::Error
        ]
    );
}

#[test]
fn state_serializes_in_camel_case() {
    let mut machine = LoadingStateMachine::new();
    machine.begin().unwrap();
    let json = serde_json::to_value(machine.state()).unwrap();
    assert_eq!(json["status"], "FETCHING_DATA");
    assert_eq!(json["statusText"], "Loading catalog data...");
    assert_eq!(json["progress"], 10.0);
}
