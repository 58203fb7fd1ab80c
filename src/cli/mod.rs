//! Command-line interface for bintag.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **tag**: Group reads into molecules per genome bin, tag them, and write
//!   a merged, sorted, indexed BAM
//! - **plan**: Print the bin plan for an input without processing anything
//!
//! ## Usage
//!
//! ```text
//! # Tag with the ligation assay
//! bintag tag input.bam tagged.bam
//!
//! # Restriction assay validated against the reference
//! bintag tag input.bam tagged.bam --assay restriction \
//!     --reference ref.fa --site-must-be-mapped
//!
//! # JSON summary for scripting
//! bintag tag input.bam tagged.bam --format json
//!
//! # Inspect the bin decomposition first
//! bintag plan input.bam --bin-size 1000000
//! ```

use clap::{Parser, Subcommand};

pub mod plan;
pub mod tag;

#[derive(Parser)]
#[command(name = "bintag")]
#[command(version)]
#[command(about = "Tag sequencing reads with molecule identity, one genome bin at a time")]
#[command(
    long_about = "bintag partitions the reference genome into bins, groups the reads of each bin into molecules according to the selected assay, annotates every read with its molecule's derived tags, and merges the per-bin outputs into a single coordinate-sorted, indexed BAM.\n\nBins that exceed their time budget are recorded in a blacklist artifact next to the output so they can be reprocessed separately; failures in one bin never abort the rest of the run."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tag molecules and write a merged, sorted, indexed BAM
    Tag(tag::TagArgs),

    /// Print the bin plan without running any jobs
    Plan(plan::PlanArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
