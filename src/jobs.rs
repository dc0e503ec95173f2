//! Job tracking and background processing.
//!
//! A job moves `queued → processing → ready | error`. Terminal states are
//! final. The store is an injected trait object so a service can back it
//! with something other than [`InMemoryJobStore`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Sender};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::ClassifiedDocument;
use crate::ocr::OcrPage;
use crate::pipeline::Reconstructor;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Processing,
    Ready,
    Error,
}

impl JobState {
    /// Check if no further transition is allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Ready | JobState::Error)
    }

    /// Check if `next` is a legal successor (re-setting the same state is allowed).
    pub fn can_transition_to(&self, next: JobState) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (JobState::Queued, JobState::Processing)
                | (JobState::Queued, JobState::Error)
                | (JobState::Processing, JobState::Ready)
                | (JobState::Processing, JobState::Error)
        )
    }
}

/// Stored job status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Failure message for `error` jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Result for `ready` jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<ClassifiedDocument>,
}

impl JobRecord {
    fn new(id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            state: JobState::Queued,
            created_at: now,
            updated_at: now,
            error: None,
            document: None,
        }
    }
}

/// Job status storage.
pub trait JobStore: Send + Sync {
    /// Register a new queued job. Fails if the id is already in flight.
    fn register(&self, id: &str) -> Result<JobRecord>;

    /// Look up a job.
    fn get(&self, id: &str) -> Option<JobRecord>;

    /// Move a job to `state`.
    fn set_state(&self, id: &str, state: JobState) -> Result<()>;

    /// Mark a job ready with its result.
    fn complete(&self, id: &str, document: ClassifiedDocument) -> Result<()>;

    /// Mark a job failed.
    fn fail(&self, id: &str, message: String) -> Result<()>;
}

/// Process-local job store.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<String, JobRecord>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of known jobs.
    pub fn len(&self) -> usize {
        self.lock().map(|jobs| jobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, JobRecord>>> {
        self.jobs
            .lock()
            .map_err(|_| Error::Job("job store lock poisoned".to_string()))
    }

    fn update<F>(&self, id: &str, state: JobState, apply: F) -> Result<()>
    where
        F: FnOnce(&mut JobRecord),
    {
        let mut jobs = self.lock()?;
        let record = jobs
            .get_mut(id)
            .ok_or_else(|| Error::Job(format!("unknown job: {}", id)))?;

        if !record.state.can_transition_to(state) {
            return Err(Error::Job(format!(
                "job {} cannot move from {:?} to {:?}",
                id, record.state, state
            )));
        }
        if record.state == state && state.is_terminal() {
            return Ok(());
        }

        record.state = state;
        record.updated_at = Utc::now();
        apply(record);
        Ok(())
    }
}

impl JobStore for InMemoryJobStore {
    fn register(&self, id: &str) -> Result<JobRecord> {
        let mut jobs = self.lock()?;
        if let Some(existing) = jobs.get(id) {
            if !existing.state.is_terminal() {
                return Err(Error::Job(format!("job {} is already in flight", id)));
            }
        }
        let record = JobRecord::new(id);
        jobs.insert(id.to_string(), record.clone());
        Ok(record)
    }

    fn get(&self, id: &str) -> Option<JobRecord> {
        self.lock().ok()?.get(id).cloned()
    }

    fn set_state(&self, id: &str, state: JobState) -> Result<()> {
        self.update(id, state, |_| {})
    }

    fn complete(&self, id: &str, document: ClassifiedDocument) -> Result<()> {
        self.update(id, JobState::Ready, |record| {
            record.document = Some(document);
        })
    }

    fn fail(&self, id: &str, message: String) -> Result<()> {
        self.update(id, JobState::Error, |record| {
            record.error = Some(message);
        })
    }
}

struct JobRequest {
    id: String,
    page: OcrPage,
}

/// Background workers draining a job queue.
pub struct JobWorker {
    sender: Option<Sender<JobRequest>>,
    handles: Vec<JoinHandle<()>>,
    store: Arc<dyn JobStore>,
}

impl JobWorker {
    /// Start `threads` workers (at least one).
    pub fn spawn(reconstructor: Arc<Reconstructor>, store: Arc<dyn JobStore>, threads: usize) -> Self {
        let (sender, receiver) = unbounded::<JobRequest>();

        let handles = (0..threads.max(1))
            .map(|_| {
                let receiver = receiver.clone();
                let store = Arc::clone(&store);
                let reconstructor = Arc::clone(&reconstructor);
                thread::spawn(move || {
                    for request in receiver.iter() {
                        run_job(&reconstructor, store.as_ref(), request);
                    }
                })
            })
            .collect();

        Self {
            sender: Some(sender),
            handles,
            store,
        }
    }

    /// Queue a page for processing under `id`.
    pub fn submit(&self, id: &str, page: OcrPage) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| Error::Job("worker is shut down".to_string()))?;

        self.store.register(id)?;
        sender
            .send(JobRequest {
                id: id.to_string(),
                page,
            })
            .map_err(|_| Error::Job("job queue is closed".to_string()))
    }

    /// The store this worker reports into.
    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Finish queued jobs and stop the workers.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.sender.take();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log::error!("job worker thread panicked");
            }
        }
    }
}

impl Drop for JobWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_job(reconstructor: &Reconstructor, store: &dyn JobStore, request: JobRequest) {
    let JobRequest { id, page } = request;

    if let Err(e) = store.set_state(&id, JobState::Processing) {
        log::warn!("Skipping job {}: {}", id, e);
        return;
    }

    let outcome = match reconstructor.reconstruct_page(&page) {
        Ok(document) => store.complete(&id, document),
        Err(e) => {
            log::warn!("Job {} failed: {}", id, e);
            store.fail(&id, e.to_string())
        }
    };

    if let Err(e) = outcome {
        log::error!("Could not record result of job {}: {}", id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let store = InMemoryJobStore::new();
        store.register("a").unwrap();
        assert_eq!(store.get("a").unwrap().state, JobState::Queued);

        store.set_state("a", JobState::Processing).unwrap();
        store.set_state("a", JobState::Processing).unwrap();
        store.fail("a", "boom".into()).unwrap();

        let record = store.get("a").unwrap();
        assert_eq!(record.state, JobState::Error);
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert!(record.updated_at >= record.created_at);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let store = InMemoryJobStore::new();
        store.register("a").unwrap();
        store.set_state("a", JobState::Processing).unwrap();
        store.set_state("a", JobState::Ready).unwrap();

        assert!(store.set_state("a", JobState::Ready).is_ok());
        assert!(matches!(
            store.set_state("a", JobState::Processing),
            Err(Error::Job(_))
        ));
        assert!(store.set_state("a", JobState::Error).is_err());
    }

    #[test]
    fn test_unknown_and_duplicate_ids() {
        let store = InMemoryJobStore::new();
        assert!(store.set_state("missing", JobState::Processing).is_err());
        assert!(store.get("missing").is_none());

        store.register("a").unwrap();
        assert!(store.register("a").is_err());
    }

    #[test]
    fn test_state_wire_names() {
        assert_eq!(serde_json::to_string(&JobState::Processing).unwrap(), "\"processing\"");
    }
}
