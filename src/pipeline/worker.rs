use std::io;
use std::path::{Path, PathBuf};

use noodles::sam;
use noodles::sam::alignment::RecordBuf;
use thiserror::Error;
use tracing::debug;

use crate::core::bin::GenomicBin;
use crate::core::config::TagConfig;
use crate::io::bam::{write_bam, AlignmentReader, FetchError};
use crate::io::reference::{ReferenceFetch, ReferenceReader};
use crate::molecule::{build_model, IdentityModel, MoleculeGrouper, Validity};
use crate::pipeline::deadline::Deadline;
use crate::pipeline::{JobResult, JobStatus};

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Processes a chunk of bins with private read handles.
///
/// One worker is built per job chunk so alignment and reference handle setup
/// amortizes over `job_chunk_size` bins. Workers share nothing mutable; the
/// temp directory receives one uniquely named file per bin.
pub struct Worker {
    reader: AlignmentReader,
    reference: Option<ReferenceReader>,
    model: Box<dyn IdentityModel>,
    header: sam::Header,
    config: TagConfig,
}

impl Worker {
    /// Open private handles for one job chunk.
    ///
    /// # Errors
    ///
    /// Returns an error when the alignment source or reference cannot be
    /// opened.
    pub fn open(
        alignment_path: &Path,
        output_header: sam::Header,
        config: &TagConfig,
    ) -> Result<Self, WorkerError> {
        let reader = AlignmentReader::open(alignment_path)?;
        let reference = match &config.reference {
            Some(path) => Some(ReferenceReader::open(path)?),
            None => None,
        };

        Ok(Self {
            reader,
            reference,
            model: build_model(config),
            header: output_header,
            config: config.clone(),
        })
    }

    /// Process each bin of the chunk in order.
    ///
    /// Failures never escape a bin: any error becomes an `error`-status
    /// result and the remaining bins still run.
    pub fn process_chunk(&mut self, bins: &[GenomicBin], temp_dir: &Path) -> Vec<JobResult> {
        bins.iter()
            .map(|bin| {
                let output = job_output_path(temp_dir, bin);
                self.process_bin(bin, &output)
                    .unwrap_or_else(|e| JobResult::failed(bin.clone(), e.to_string()))
            })
            .collect()
    }

    /// Tag one bin's molecules into `output`.
    ///
    /// # Errors
    ///
    /// Returns an error when fetching, reference access, or writing fails.
    pub fn process_bin(
        &mut self,
        bin: &GenomicBin,
        output: &Path,
    ) -> Result<JobResult, WorkerError> {
        let deadline = Deadline::start(self.config.bin_timeout);

        let records =
            match self
                .reader
                .fetch_window(bin, self.config.min_mapping_quality, &deadline)
            {
                Ok(records) => records,
                Err(FetchError::DeadlineExceeded(e)) => {
                    debug!(bin = %bin, %e, "fetch window scan expired");
                    return Ok(JobResult {
                        bin: bin.clone(),
                        status: JobStatus::Timeout,
                        output: None,
                        molecules: 0,
                        error: None,
                    });
                }
                Err(FetchError::Io(e)) => return Err(e.into()),
            };

        let grouper = MoleculeGrouper::new(
            self.model.as_ref(),
            self.config.umi_hamming_distance,
            self.config.max_fragments_per_molecule,
        );
        let grouped = grouper.group(records, &bin.contig);

        debug!(
            bin = %bin,
            fragments = grouped.fragment_count,
            unplaced = grouped.dropped_no_site,
            molecules = grouped.molecules.len(),
            "grouped fetch window"
        );

        let mut emitted: Vec<RecordBuf> = Vec::new();
        let mut molecules = 0u64;
        let mut timed_out = false;

        for molecule in grouped.molecules {
            // Sites at or past the fetch end cannot belong to this bin, and
            // the window is site-sorted, so nothing later can either.
            if molecule.cut_site.pos >= bin.fetch_end {
                break;
            }

            if bin.owns_site(molecule.contig(), molecule.cut_site.pos) {
                let reference = self.reference.as_mut().map(|r| r as &mut dyn ReferenceFetch);
                match self.model.is_valid(&molecule, reference)? {
                    Validity::Invalid(reason) => {
                        debug!(bin = %bin, site = molecule.cut_site.pos, %reason, "molecule rejected");
                    }
                    Validity::Valid => {
                        let reference =
                            self.reference.as_mut().map(|r| r as &mut dyn ReferenceFetch);
                        let tags = self.model.compute_tags(&molecule, reference)?;

                        for mut record in molecule.into_records() {
                            for (tag, value) in &tags {
                                record.data_mut().insert(*tag, value.clone());
                            }
                            emitted.push(record);
                        }
                        molecules += 1;
                    }
                }
            }

            // Checked after each molecule so an expiry salvages everything
            // processed so far; nothing is interrupted mid-molecule.
            if deadline.check().is_err() {
                timed_out = true;
                break;
            }
        }

        // Job outputs must be internally sorted so the final position merge
        // can combine them stream-wise.
        emitted.sort_by_key(|record| record.alignment_start().map(usize::from).unwrap_or(0));

        let output_path = if emitted.is_empty() {
            None
        } else {
            write_bam(output, &self.header, &emitted)?;
            Some(output.to_path_buf())
        };

        let status = if timed_out {
            JobStatus::Timeout
        } else if molecules == 0 {
            JobStatus::Empty
        } else {
            JobStatus::Ok
        };

        Ok(JobResult {
            bin: bin.clone(),
            status,
            output: output_path,
            molecules,
            error: None,
        })
    }
}

/// Unique per-bin path inside the run's temp directory.
fn job_output_path(temp_dir: &Path, bin: &GenomicBin) -> PathBuf {
    temp_dir.join(format!("{}_{}_{}.bam", bin.contig, bin.start, bin.end))
}
