//! Spatial indexing for Seismic Unix trace files.
//!
//! SU streams are packed into a dataset holding one copy of every trace
//! header and one sample partition per input stream. Traces are selected back
//! out by a small query language over their midpoint/half-offset location.

pub mod core;
pub mod pipeline;
pub mod query;
pub mod store;
pub mod su;

pub use crate::core::{Error, Result};
pub use crate::pipeline::{extract, pack_su_files, PackConfig, PackStats, Selection};
pub use crate::query::{Query, QueryParser};
pub use crate::store::{FileStore, TraceStore};
pub use crate::su::{Endianness, SuReader, SuWriter, TraceHeader};
