//! The parallel tagging pipeline: worker execution, orchestration, and the
//! ordered output merge.
//!
//! One [`JobResult`] is produced per planned bin. `ok` results carry a
//! job-local BAM to merge; `timeout` results may carry a partial one;
//! `empty` and `error` results carry nothing.

pub mod deadline;
pub mod merge;
pub mod orchestrator;
pub mod worker;

use std::path::PathBuf;

use serde::Serialize;

use crate::core::bin::GenomicBin;

pub use deadline::{Deadline, DeadlineExceeded};
pub use orchestrator::{run, PipelineError, RunOptions, RunSummary};
pub use worker::Worker;

/// How a bin's job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// At least one molecule was emitted.
    Ok,
    /// The window held no molecules owned by the bin; no output exists.
    Empty,
    /// The bin's budget ran out; any molecules emitted before that were kept.
    Timeout,
    /// The job failed; its bin contributes nothing to the output.
    Error,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Empty => write!(f, "empty"),
            Self::Timeout => write!(f, "timeout"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Outcome of one bin's job.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub bin: GenomicBin,
    pub status: JobStatus,
    /// Job-local output BAM, present for `ok` and salvaged `timeout` jobs.
    pub output: Option<PathBuf>,
    /// Molecules written to the output.
    pub molecules: u64,
    /// Failure detail for `error` jobs.
    pub error: Option<String>,
}

impl JobResult {
    pub fn failed(bin: GenomicBin, error: String) -> Self {
        Self {
            bin,
            status: JobStatus::Error,
            output: None,
            molecules: 0,
            error: Some(error),
        }
    }
}
