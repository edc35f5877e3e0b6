use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use suindex::pipeline::{ensure_stdout_not_terminal, extract, Selection};
use suindex::query::QueryParser;
use suindex::store::FileStore;
use suindex::su::{SuWriter, SPATIAL_DIMS};

/// Write the traces of one dataset slot to stdout as an SU stream.
///
/// Queries: `range,lo:hi,...` `nearest,x,y,hx,hy,k` `at,x,y,hx,hy`
/// over midpoint x/y and half-offset x/y. No query extracts every trace.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dataset path given to suindex-pack
    dataset: PathBuf,

    /// Slot (input file index) to read samples from
    slot: usize,

    /// Optional query; words are joined back together
    query: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    ensure_stdout_not_terminal()?;

    let text = args.query.concat();
    let query = QueryParser::new(SPATIAL_DIMS)
        .parse(&text)
        .with_context(|| format!("Invalid query {text:?}"))?;
    let selection = Selection::from_query(&query)?;

    let store = FileStore::open(&args.dataset)
        .with_context(|| format!("Failed to open dataset {}", args.dataset.display()))?;

    let stdout = io::stdout();
    let mut writer = SuWriter::new(BufWriter::new(stdout.lock()), "stdout", store.endianness());
    extract(&store, args.slot, &selection, &mut writer).context("Extraction failed")?;
    Ok(())
}
