// src/batch.rs
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::jobs::{Job, JobHandle, JobQueue};
use crate::model::{BoundingBox, Credentials, DateRange};
use crate::pipeline::{LocalRequest, Pipeline, RunRequest};

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchConfig {
    #[serde(default)]
    pub global: GlobalParams,
    pub jobs: Vec<BatchJob>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct GlobalParams {
    /// Credentials shared by every `run` job without its own.
    #[serde(default)]
    pub credentials: Option<Credentials>,
    /// Keep going after a failed job.
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            credentials: None,
            continue_on_error: default_true(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BatchJob {
    Run {
        bbox: String,
        dates: String,
        #[serde(default)]
        credentials: Option<Credentials>,
    },
    Process(LocalRequest),
}

impl BatchJob {
    fn into_job(self, global: &GlobalParams) -> Result<Job> {
        match self {
            BatchJob::Run {
                bbox,
                dates,
                credentials,
            } => {
                let credentials = credentials
                    .or_else(|| global.credentials.clone())
                    .ok_or_else(|| Error::invalid_input("run job without credentials"))?;
                Ok(Job::Run(RunRequest {
                    credentials,
                    bbox: bbox.parse::<BoundingBox>()?,
                    dates: dates.parse::<DateRange>()?,
                }))
            }
            BatchJob::Process(request) => Ok(Job::Local(request)),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

pub fn load_batch(path: &Path) -> Result<BatchConfig> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn process_batch(config_path: &Path, pipeline: Arc<Pipeline>) -> Result<BatchSummary> {
    let config = load_batch(config_path)?;
    let total = config.jobs.len();
    info!(jobs = total, "starting batch");

    // Validate everything before anything is queued.
    let jobs = config
        .jobs
        .into_iter()
        .map(|job| job.into_job(&config.global))
        .collect::<Result<Vec<_>>>()?;

    let queue = JobQueue::new(pipeline);
    let handles = jobs
        .into_iter()
        .map(|job| queue.submit(job))
        .collect::<Result<Vec<JobHandle>>>()?;

    let mut summary = BatchSummary::default();
    for (i, handle) in handles.into_iter().enumerate() {
        let id = handle.id();
        match handle.wait() {
            Ok(outcome) => {
                info!(job = id, "[{}/{}] {}", i + 1, total, outcome.report_path.display());
                summary.succeeded += 1;
            }
            Err(err) => {
                error!(job = id, kind = %err.kind(), error = %err, "[{}/{}] failed", i + 1, total);
                summary.failed += 1;
                if !config.global.continue_on_error {
                    break;
                }
            }
        }
    }

    queue.join();
    info!(succeeded = summary.succeeded, failed = summary.failed, "batch complete");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_jobs() {
        let json = r#"{
            "global": { "credentials": { "username": "u", "password": "p" } },
            "jobs": [
                { "type": "run", "bbox": "-23.5,-67.25", "dates": "2023-01-01,2023-01-30" },
                { "type": "process", "reflectance": "a.nc", "bbox": { "lat1": 1.0, "lon1": 2.0, "lat2": 1.0, "lon2": 2.0 } }
            ]
        }"#;
        let config: BatchConfig = serde_json::from_str(json).unwrap();
        assert!(config.global.continue_on_error);

        let jobs = config
            .jobs
            .into_iter()
            .map(|j| j.into_job(&config.global))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert!(matches!(&jobs[0], Job::Run(r) if r.credentials.username == "u"));
        assert!(matches!(&jobs[1], Job::Local(l) if l.mineral.is_none()));
    }

    #[test]
    fn run_job_needs_credentials() {
        let job = BatchJob::Run {
            bbox: "1,2".into(),
            dates: "2023-01-01,2023-01-30".into(),
            credentials: None,
        };
        let err = job.into_job(&GlobalParams::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
    }
}
