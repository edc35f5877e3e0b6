//! Seismic Unix trace streams: the 240-byte header codec and sequential
//! readers and writers over header + sample records.

pub mod codec;
pub mod header;
mod reader;
mod writer;

pub use codec::{Endianness, TraceCodec, HEADER_SIZE};
pub use header::{check_signature, SpatialPoint, TraceHeader, SAMPLE_SIZE, SPATIAL_DIMS};
pub use reader::SuReader;
pub use writer::SuWriter;
