//! Conversions between SU streams and a dataset.

mod extract;
mod ingest;

pub use extract::{ensure_not_terminal, ensure_stdout_not_terminal, extract, Selection};
pub use ingest::{fill_slot, pack_su_files, read_reference_headers, PackConfig, PackStats};
