use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use suindex::pipeline::{pack_su_files, PackConfig};
use suindex::su::Endianness;

/// Pack SU files into a spatially indexed dataset, one slot per input file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input SU files; the first one provides the trace headers
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Output dataset path (writes <dataset>.meta, .data and .json)
    dataset: PathBuf,

    /// Input files are big endian
    #[arg(long)]
    big_endian: bool,

    /// Progress lines logged per input file (at debug level)
    #[arg(long, default_value_t = 100)]
    progress_steps: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = PackConfig {
        endianness: if args.big_endian {
            Endianness::Big
        } else {
            Endianness::Little
        },
        progress_steps: args.progress_steps,
    };

    let stats = pack_su_files(&args.inputs, &args.dataset, &config)
        .with_context(|| format!("Failed to pack dataset {}", args.dataset.display()))?;
    info!(
        "Dataset {}: {} headers, {} slots, {} traces copied",
        args.dataset.display(),
        stats.headers,
        stats.slots,
        stats.traces
    );
    Ok(())
}
