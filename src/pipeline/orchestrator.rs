use std::fs;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::bin::{plan_bins, GenomicBin};
use crate::core::blacklist::{append_bins, read_blacklist, write_blacklist, BlacklistError};
use crate::core::config::{ConfigError, TagConfig};
use crate::io::bam::{bai_path, output_header, AlignmentReader};
use crate::pipeline::merge::merge_outputs;
use crate::pipeline::worker::{Worker, WorkerError};
use crate::pipeline::{JobResult, JobStatus};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Blacklist error: {0}")]
    Blacklist(#[from] BlacklistError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Inputs and outputs of one run.
pub struct RunOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Optional exclusion list seeding the run's blacklist artifact.
    pub blacklist: Option<PathBuf>,
    /// Directory for job-local scratch files. Defaults to the output's parent.
    pub temp_dir: Option<PathBuf>,
    /// Full invocation recorded in the output's program header line.
    pub command_line: String,
}

/// Final per-status accounting reported to the user.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub bins: usize,
    pub ok: usize,
    pub empty: usize,
    pub timeout: usize,
    pub error: usize,
    pub molecules: u64,
    pub output: PathBuf,
    pub blacklist: PathBuf,
}

/// Run the whole pipeline: plan, fan out, collect, merge, index.
///
/// Per-job failures are contained and accounted; only configuration,
/// blacklist, merge, and index failures abort the run.
///
/// # Errors
///
/// Returns a `PipelineError` for those globally fatal failures.
pub fn run(options: &RunOptions, config: &TagConfig) -> Result<RunSummary, PipelineError> {
    config.validate()?;

    let reader = AlignmentReader::open(&options.input)?;
    let contigs = reader.contig_lengths();
    let header = output_header(reader.header(), &options.command_line);
    drop(reader);

    let seed = match &options.blacklist {
        Some(path) => read_blacklist(path)?,
        None => Vec::new(),
    };

    let bins = plan_bins(&contigs, config.bin_size, config.fragment_length, &seed);
    info!(
        contigs = contigs.len(),
        bins = bins.len(),
        workers = config.workers,
        "planned run"
    );

    remove_stale(&options.output)?;
    let blacklist_path = blacklist_artifact_path(&options.output);
    write_blacklist(&blacklist_path, &seed)?;

    let temp_dir = match (&options.temp_dir, options.output.parent()) {
        (Some(dir), _) => tempfile::tempdir_in(dir)?,
        (None, Some(parent)) if !parent.as_os_str().is_empty() => tempfile::tempdir_in(parent)?,
        _ => tempfile::tempdir()?,
    };

    let results = execute(&bins, options, config, &header, temp_dir.path())?;

    let mut summary = RunSummary {
        bins: bins.len(),
        ok: 0,
        empty: 0,
        timeout: 0,
        error: 0,
        molecules: 0,
        output: options.output.clone(),
        blacklist: blacklist_path.clone(),
    };

    let mut timed_out_bins = Vec::new();
    let mut merge_inputs = Vec::new();

    for result in &results {
        summary.molecules += result.molecules;
        match result.status {
            JobStatus::Ok => summary.ok += 1,
            JobStatus::Empty => summary.empty += 1,
            JobStatus::Timeout => {
                summary.timeout += 1;
                timed_out_bins.push(result.bin.clone());
            }
            JobStatus::Error => {
                summary.error += 1;
                warn!(
                    bin = %result.bin,
                    error = result.error.as_deref().unwrap_or("unknown"),
                    "bin failed"
                );
            }
        }

        // Plan order is preserved here; it is what keeps the merge sorted
        if let Some(output) = &result.output {
            merge_inputs.push(output.clone());
        }
    }

    append_bins(&blacklist_path, &timed_out_bins)?;

    merge_outputs(
        &merge_inputs,
        &options.output,
        &header,
        config.merge_chunk_size,
        temp_dir.path(),
    )?;

    info!(
        ok = summary.ok,
        empty = summary.empty,
        timeout = summary.timeout,
        error = summary.error,
        molecules = summary.molecules,
        "run complete"
    );

    Ok(summary)
}

/// Fan the job chunks out over the worker pool and collect results in plan
/// order.
fn execute(
    bins: &[GenomicBin],
    options: &RunOptions,
    config: &TagConfig,
    header: &noodles::sam::Header,
    temp_dir: &Path,
) -> Result<Vec<JobResult>, PipelineError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()?;

    let chunks: Vec<&[GenomicBin]> = bins.chunks(config.job_chunk_size.max(1)).collect();

    let (sender, receiver) = crossbeam_channel::unbounded::<(String, JobStatus)>();
    let progress = std::thread::spawn(move || {
        for (bin, status) in receiver {
            match status {
                JobStatus::Timeout => warn!(%bin, "bin timed out; queued for blacklist"),
                JobStatus::Error => warn!(%bin, "bin errored"),
                _ => debug!(%bin, %status, "bin finished"),
            }
        }
    });

    // collect() keeps the chunks' plan order even though jobs complete in
    // arbitrary order.
    let chunked: Vec<Vec<JobResult>> = pool.install(|| {
        chunks
            .par_iter()
            .map(|chunk| {
                let results = run_chunk(chunk, options, config, header, temp_dir);
                for result in &results {
                    let _ = sender.send((result.bin.to_string(), result.status));
                }
                results
            })
            .collect()
    });

    drop(sender);
    let _ = progress.join();

    Ok(chunked.into_iter().flatten().collect())
}

/// Run one job chunk, converting any failure or panic into `error`-status
/// results so the pool and the sibling jobs keep going.
fn run_chunk(
    chunk: &[GenomicBin],
    options: &RunOptions,
    config: &TagConfig,
    header: &noodles::sam::Header,
    temp_dir: &Path,
) -> Vec<JobResult> {
    let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<Vec<JobResult>, WorkerError> {
        let mut worker = Worker::open(&options.input, header.clone(), config)?;
        Ok(worker.process_chunk(chunk, temp_dir))
    }));

    match outcome {
        Ok(Ok(results)) => results,
        Ok(Err(e)) => chunk
            .iter()
            .map(|bin| JobResult::failed(bin.clone(), e.to_string()))
            .collect(),
        Err(_) => chunk
            .iter()
            .map(|bin| JobResult::failed(bin.clone(), "worker panicked".to_string()))
            .collect(),
    }
}

/// The blacklist artifact lives next to the output.
pub fn blacklist_artifact_path(output: &Path) -> PathBuf {
    PathBuf::from(format!("{}.blacklist.bed", output.display()))
}

fn remove_stale(output: &Path) -> io::Result<()> {
    for path in [output.to_path_buf(), bai_path(output)] {
        match fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed stale output"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blacklist_artifact_is_a_sibling_of_the_output() {
        let path = blacklist_artifact_path(Path::new("/data/tagged.bam"));
        assert_eq!(path, PathBuf::from("/data/tagged.bam.blacklist.bed"));
    }

    #[test]
    fn test_remove_stale_ignores_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_stale(&dir.path().join("never-written.bam")).is_ok());
    }
}
