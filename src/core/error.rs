use thiserror::Error;

/// A query string or one of its elements could not be turned into a selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid number of tokens for {kind} query: expected {expected}, got {actual}")]
    TokenCount {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("unknown query {0:?}")]
    UnknownQuery(String),
    #[error("query element {index} out of range ({len} elements)")]
    ElementIndex { index: usize, len: usize },
    #[error("sub-value {index} out of range ({len} sub-values)")]
    ValueIndex { index: usize, len: usize },
    #[error("element {element}: expected {expected} value(s), got {actual}")]
    ValueCount {
        element: usize,
        expected: usize,
        actual: usize,
    },
    #[error("element {element}: coordinate value is empty")]
    EmptyValue { element: usize },
    #[error("missing number of nearest points")]
    MissingNeighborCount,
    #[error("invalid {type_name} value {value:?}")]
    InvalidNumber {
        value: String,
        type_name: &'static str,
    },
    #[error("query has {actual} coordinate elements, the space has {expected} dimensions")]
    Dimensions { expected: usize, actual: usize },
}

/// A fixed-size SU block is malformed or a header cannot be represented in it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: u64, actual: u64 },
    #[error("coordinate scale code is zero")]
    ZeroScale,
    #[error("coordinate scaling error: {coordinate} needs a scale code above {limit}")]
    ScaleOverflow { coordinate: f64, limit: i16 },
    #[error("coordinate {0} is not finite")]
    NonFiniteCoordinate(f64),
    #[error("field {field} value {value} does not fit its {bits}-bit slot")]
    FieldOverflow {
        field: &'static str,
        value: f64,
        bits: u32,
    },
    #[error("sample payload is {actual} bytes, header expects {expected}")]
    PayloadSize { expected: usize, actual: usize },
}

impl FormatError {
    /// Attaches the stream identity and byte position of the offending record.
    pub fn at(self, stream: impl Into<String>, position: u64) -> Error {
        Error::Format {
            stream: stream.into(),
            position,
            source: self,
        }
    }
}

/// Two independently read copies of the same dataset disagree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error(
        "the field {field} of trace {trace_id} at byte {input_id} differ: {input_value} vs {stored_value}"
    )]
    FieldMismatch {
        field: &'static str,
        /// Sequential id of the trace committed to the store.
        trace_id: u64,
        /// Stream-offset id of the freshly read header.
        input_id: u64,
        input_value: String,
        stored_value: String,
    },
    #[error("the number of traces in {stream} differ from dataset: {found} vs {expected}")]
    TraceCount {
        stream: String,
        found: u64,
        expected: u64,
    },
    #[error("the input {stream} has no headers")]
    NoHeaders { stream: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("format error in {stream} at byte {position}: {source}")]
    Format {
        stream: String,
        position: u64,
        #[source]
        source: FormatError,
    },
    #[error("consistency error: {0}")]
    Consistency(#[from] ConsistencyError),
    #[error("corrupt dataset: {0}")]
    Corrupt(&'static str),
    #[error("dataset check mismatch: expected {expected:?}, found {found:?}")]
    SchemaMismatch { expected: String, found: String },
    #[error("slot {slot} out of range ({slots} slots)")]
    InvalidSlot { slot: usize, slots: usize },
    #[error("trace id {id} not in dataset ({len} traces)")]
    UnknownId { id: u64, len: usize },
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("metadata error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("output must be a file or a pipe, not a terminal")]
    TerminalOutput,
}

pub type Result<T> = std::result::Result<T, Error>;
