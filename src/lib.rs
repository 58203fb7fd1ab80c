//! # bintag
//!
//! A parallel, binned molecule tagger for coordinate-sorted BAM files.
//!
//! Reads from assays that cut or ligate at defined genomic sites arrive as
//! individual alignments; downstream analysis wants them grouped back into
//! the original DNA molecules. `bintag` partitions the genome into bins,
//! groups each bin's reads into molecules, annotates every read with its
//! molecule's derived tags, and merges the per-bin outputs into one sorted,
//! indexed BAM.
//!
//! The pipeline is built to survive bad regions: every bin runs under a
//! wall-clock budget, timed-out bins land in a blacklist artifact for
//! separate reprocessing, and a failure in one bin never takes down the
//! rest of the run.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bintag::{pipeline, RunOptions, TagConfig};
//!
//! let config = TagConfig::default();
//! let options = RunOptions {
//!     input: "input.bam".into(),
//!     output: "tagged.bam".into(),
//!     blacklist: None,
//!     temp_dir: None,
//!     command_line: "bintag tag input.bam tagged.bam".to_string(),
//! };
//!
//! let summary = pipeline::run(&options, &config).unwrap();
//! println!("{} molecules across {} bins", summary.molecules, summary.bins);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Bin planning, blacklist handling, and run configuration
//! - [`molecule`]: Fragment assembly, molecule grouping, and assay identity
//! - [`io`]: BAM and reference FASTA access
//! - [`pipeline`]: Workers, orchestration, and the ordered output merge
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod io;
pub mod molecule;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::bin::{plan_bins, GenomicBin};
pub use crate::core::blacklist::BlacklistRegion;
pub use crate::core::config::{AssayVariant, TagConfig};
pub use crate::molecule::{IdentityModel, Molecule};
pub use crate::pipeline::{JobResult, JobStatus, RunOptions, RunSummary};
