use anyhow::Result;
use clap::Parser;
use gbio_cli::dataset::combine_csvs;
use gbio_cli::logging::init_tracing;
use std::path::PathBuf;

/// Merge the per-city CSVs in a directory into one re-indexed table
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Directory holding the per-city CSV files
    #[arg(long, default_value = "data/csv")]
    input: PathBuf,

    /// Combined output file
    #[arg(long, default_value = "data/combined.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let rows = combine_csvs(&args.input, &args.output)?;
    println!("Combined {} rows into {}", rows, args.output.display());
    Ok(())
}
