//! Shared building blocks: error types and the memory-mapped file wrapper.

pub mod error;
pub mod mmap;

pub use error::{ConsistencyError, Error, FormatError, ParseError, Result};
pub use mmap::MmapFile;
