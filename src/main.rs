use clap::Parser;
use tracing_subscriber::EnvFilter;

use bintag::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("bintag=debug,info")
    } else {
        EnvFilter::new("bintag=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Tag(args) => {
            cli::tag::run(args, cli.format)?;
        }
        cli::Commands::Plan(args) => {
            cli::plan::run(args, cli.format)?;
        }
    }

    Ok(())
}
