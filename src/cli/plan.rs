use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::bin::plan_bins;
use crate::core::blacklist::read_blacklist;
use crate::io::bam::AlignmentReader;

#[derive(Args)]
pub struct PlanArgs {
    /// Input coordinate-sorted, indexed BAM
    pub input: PathBuf,

    /// BED-like exclusion list of regions to leave out of the plan
    #[arg(long)]
    pub blacklist: Option<PathBuf>,

    /// Width of each processing bin in bp
    #[arg(long, default_value_t = 5_000_000)]
    pub bin_size: u64,

    /// Maximum fragment length; widens each bin's fetch window
    #[arg(long, default_value_t = 500)]
    pub fragment_length: u64,
}

/// Execute the plan subcommand.
///
/// Text output is one tab-separated line per bin: contig, start, end,
/// fetch start, fetch end.
///
/// # Errors
///
/// Returns an error when the input header or the blacklist cannot be read.
pub fn run(args: PlanArgs, format: OutputFormat) -> anyhow::Result<()> {
    anyhow::ensure!(args.bin_size > 0, "Bin size must be positive");

    let reader = AlignmentReader::open(&args.input)?;
    let contigs = reader.contig_lengths();
    drop(reader);

    let blacklist = match &args.blacklist {
        Some(path) => read_blacklist(path)?,
        None => Vec::new(),
    };

    let bins = plan_bins(&contigs, args.bin_size, args.fragment_length, &blacklist);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&bins)?),
        OutputFormat::Text => {
            for bin in &bins {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    bin.contig, bin.start, bin.end, bin.fetch_start, bin.fetch_end
                );
            }
        }
    }

    Ok(())
}
