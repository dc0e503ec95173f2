//! Integration tests for the job store and background worker.

use std::sync::Arc;

use inkdoc::jobs::{InMemoryJobStore, JobState, JobStore, JobWorker};
use inkdoc::{OcrDetection, OcrPage, Reconstructor};

fn page(text: &str) -> OcrPage {
    OcrPage::new(
        800.0,
        vec![OcrDetection::new(text, 0.9, [40.0, 40.0, 200.0, 54.0])],
    )
}

#[test]
fn test_worker_processes_jobs() {
    let store = Arc::new(InMemoryJobStore::new());
    let worker = JobWorker::spawn(Arc::new(Reconstructor::new()), store.clone(), 2);

    worker.submit("ok", page("Hello world")).unwrap();
    worker.submit("empty", OcrPage::new(800.0, vec![])).unwrap();
    worker.submit("bad-width", OcrPage::new(0.0, page("x").detections)).unwrap();
    worker.shutdown();

    let ok = store.get("ok").unwrap();
    assert_eq!(ok.state, JobState::Ready);
    assert_eq!(ok.document.unwrap().row_texts(), vec!["Hello world"]);

    let empty = store.get("empty").unwrap();
    assert_eq!(empty.state, JobState::Error);
    assert_eq!(empty.error.as_deref(), Some("OCR returned no text"));

    assert_eq!(store.get("bad-width").unwrap().state, JobState::Error);
}

#[test]
fn test_duplicate_in_flight_id_is_rejected() {
    let store = Arc::new(InMemoryJobStore::new());
    store.register("job-1").unwrap();

    let worker = JobWorker::spawn(Arc::new(Reconstructor::new()), store.clone(), 1);
    assert!(worker.submit("job-1", page("Hello")).is_err());
    worker.shutdown();

    assert_eq!(store.get("job-1").unwrap().state, JobState::Queued);
}

#[test]
fn test_finished_id_can_be_resubmitted() {
    let store = Arc::new(InMemoryJobStore::new());
    let worker = JobWorker::spawn(Arc::new(Reconstructor::new()), store.clone(), 1);
    worker.submit("again", OcrPage::new(800.0, vec![])).unwrap();
    worker.shutdown();
    assert_eq!(store.get("again").unwrap().state, JobState::Error);

    let worker = JobWorker::spawn(Arc::new(Reconstructor::new()), store.clone(), 1);
    worker.submit("again", page("Second try")).unwrap();
    worker.shutdown();
    assert_eq!(store.get("again").unwrap().state, JobState::Ready);
}

#[test]
fn test_record_serializes_state_and_timestamps() {
    let store = InMemoryJobStore::new();
    let record = store.register("serialize").unwrap();
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["state"], "queued");
    assert!(json["created_at"].is_string());
    assert!(json.get("document").is_none());
}
