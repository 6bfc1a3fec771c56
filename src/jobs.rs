// src/jobs.rs
use std::collections::HashMap;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use flume::{Receiver, Sender};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info, info_span};

use crate::error::{Error, ErrorKind, Result};
use crate::pipeline::{LocalRequest, Pipeline, RunOutcome, RunRequest};

pub type JobId = u64;

#[derive(Debug, Clone)]
pub enum Job {
    Run(RunRequest),
    Local(LocalRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    Queued,
    Running,
    Finished,
    Failed(ErrorKind),
}

struct JobRequest {
    id: JobId,
    job: Job,
    reply: Sender<Result<RunOutcome>>,
}

/// Receives the outcome of one submitted job.
pub struct JobHandle {
    id: JobId,
    reply: Receiver<Result<RunOutcome>>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Block until the job has finished.
    pub fn wait(self) -> Result<RunOutcome> {
        self.reply
            .recv()
            .map_err(|_| Error::Worker(format!("job {} was dropped by the queue", self.id)))?
    }
}

/// Runs pipeline jobs one after another on a single worker thread, so runs
/// never share a working directory at the same time. Submission never
/// blocks; every job reports back through its own [`JobHandle`].
pub struct JobQueue {
    worker: JoinHandle<()>,
    req_tx: Sender<JobRequest>,
    status: Arc<Mutex<HashMap<JobId, JobStatus>>>,
    next_id: AtomicU64,
}

impl JobQueue {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        let (req_tx, req_rx): (Sender<JobRequest>, Receiver<JobRequest>) = flume::unbounded();
        let status = Arc::new(Mutex::new(HashMap::new()));

        let worker = {
            let status = Arc::clone(&status);
            thread::spawn(move || {
                for request in req_rx {
                    let JobRequest { id, job, reply } = request;
                    let _span = info_span!("job", id).entered();
                    status.lock().insert(id, JobStatus::Running);

                    // A panicking job fails on its own; the worker moves on to the next one.
                    let result = panic::catch_unwind(AssertUnwindSafe(|| match &job {
                        Job::Run(run) => pipeline.run(run),
                        Job::Local(local) => pipeline.process_local(local),
                    }))
                    .unwrap_or_else(|payload| Err(Error::Worker(panic_message(payload.as_ref()))));

                    let state = match &result {
                        Ok(outcome) => {
                            info!(report = %outcome.report_path.display(), "job finished");
                            JobStatus::Finished
                        }
                        Err(err) => {
                            error!(kind = %err.kind(), error = %err, "job failed");
                            JobStatus::Failed(err.kind())
                        }
                    };
                    status.lock().insert(id, state);

                    // The submitter may have dropped its handle.
                    let _ = reply.send(result);
                }
            })
        };

        Self {
            worker,
            req_tx,
            status,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn submit(&self, job: Job) -> Result<JobHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, rx) = flume::bounded(1);
        self.status.lock().insert(id, JobStatus::Queued);
        self.req_tx
            .send(JobRequest { id, job, reply })
            .map_err(|_| Error::Worker("job queue is shut down".into()))?;
        Ok(JobHandle { id, reply: rx })
    }

    pub fn status(&self, id: JobId) -> Option<JobStatus> {
        self.status.lock().get(&id).cloned()
    }

    pub fn snapshot(&self) -> Vec<(JobId, JobStatus)> {
        let mut jobs: Vec<_> = self.status.lock().iter().map(|(k, v)| (*k, v.clone())).collect();
        jobs.sort_by_key(|(id, _)| *id);
        jobs
    }

    /// Stop accepting jobs and wait for the queued ones to drain.
    pub fn join(self) {
        drop(self.req_tx);

        if let Err(e) = self.worker.join() {
            panic::resume_unwind(e);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "job panicked".to_string())
}
