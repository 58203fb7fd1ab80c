use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::config::{AssayVariant, TagConfig};
use crate::pipeline::{self, RunOptions, RunSummary};

#[derive(Args)]
pub struct TagArgs {
    /// Input coordinate-sorted, indexed BAM
    pub input: PathBuf,

    /// Output BAM; the index and blacklist artifact are written next to it
    pub output: PathBuf,

    /// Assay variant deciding what a cut site is
    #[arg(long, value_enum, default_value = "ligation")]
    pub assay: AssayVariant,

    /// Indexed reference FASTA; required for --site-must-be-mapped and
    /// --count-undigested-sites
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// BED-like exclusion list of regions to skip; timed-out bins are
    /// appended to a copy of it next to the output
    #[arg(long)]
    pub blacklist: Option<PathBuf>,

    /// Width of each processing bin in bp
    #[arg(long, default_value_t = 5_000_000)]
    pub bin_size: u64,

    /// Maximum fragment length; widens each bin's fetch window
    #[arg(long, default_value_t = 500)]
    pub fragment_length: u64,

    /// Per-bin time budget in seconds
    #[arg(long, default_value_t = 900)]
    pub timeout: u64,

    /// Discard reads below this mapping quality before grouping
    #[arg(long, default_value_t = 40)]
    pub min_mapping_quality: u8,

    /// Job outputs combined per intermediate merge file
    #[arg(long, default_value_t = 300)]
    pub merge_chunk_size: usize,

    /// Consecutive bins processed per pool job
    #[arg(long, default_value_t = 50)]
    pub job_chunk_size: usize,

    /// Worker threads (0 = all cores)
    #[arg(short = 'j', long, default_value_t = 0)]
    pub workers: usize,

    /// Reject restriction molecules whose cut site lacks the recognition
    /// sequence in the reference
    #[arg(long)]
    pub site_must_be_mapped: bool,

    /// Count undigested recognition sites within each molecule's span
    #[arg(long)]
    pub count_undigested_sites: bool,

    /// Recognition sequence for the restriction assay
    #[arg(long, default_value = "CATG")]
    pub recognition_sequence: String,

    /// UMI mismatch tolerance when joining fragments into a molecule
    #[arg(long, default_value_t = 1)]
    pub umi_hamming_distance: usize,

    /// Maximum fragments per molecule (0 = unbounded)
    #[arg(long, default_value_t = 1)]
    pub max_fragments_per_molecule: usize,

    /// Directory for job-local scratch files (default: next to the output)
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,
}

/// Execute the tag subcommand.
///
/// # Errors
///
/// Returns an error for invalid configuration or a globally fatal pipeline
/// failure; per-bin failures only show up in the summary.
pub fn run(args: TagArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = TagConfig {
        bin_size: args.bin_size,
        fragment_length: args.fragment_length,
        bin_timeout: Duration::from_secs(args.timeout),
        min_mapping_quality: args.min_mapping_quality,
        merge_chunk_size: args.merge_chunk_size,
        job_chunk_size: args.job_chunk_size,
        workers: args.workers,
        assay: args.assay,
        site_must_be_mapped: args.site_must_be_mapped,
        count_undigested_sites: args.count_undigested_sites,
        recognition_sequence: args.recognition_sequence.to_ascii_uppercase().into_bytes(),
        umi_hamming_distance: args.umi_hamming_distance,
        max_fragments_per_molecule: args.max_fragments_per_molecule,
        reference: args.reference.clone(),
    };

    let options = RunOptions {
        input: args.input,
        output: args.output,
        blacklist: args.blacklist,
        temp_dir: args.temp_dir,
        command_line: std::env::args().collect::<Vec<_>>().join(" "),
    };

    let summary = pipeline::run(&options, &config)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_summary(&summary),
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Processed {} bins:", summary.bins);
    println!("  ok:      {}", summary.ok);
    println!("  empty:   {}", summary.empty);
    println!("  timeout: {}", summary.timeout);
    println!("  error:   {}", summary.error);
    println!("Molecules tagged: {}", summary.molecules);
    println!("Output: {}", summary.output.display());
    if summary.timeout > 0 {
        println!(
            "Timed-out bins were appended to {} for reprocessing",
            summary.blacklist.display()
        );
    }
}
