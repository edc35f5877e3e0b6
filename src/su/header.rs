use crate::core::ConsistencyError;
use crate::query::Point;

/// Size in bytes of one seismic sample (an IEEE 32-bit float).
pub const SAMPLE_SIZE: usize = std::mem::size_of::<f32>();

/// Number of axes of the midpoint/half-offset location.
pub const SPATIAL_DIMS: usize = 4;

pub type SpatialPoint = Point<f64, SPATIAL_DIMS>;

/// Name of the location projection, recorded in the dataset check signature.
pub const LOCATION_HELPER: &str = "helper_mhxy";

/// Ordered (name, type) list of the header fields. The check signature is
/// built from it, so any change here invalidates existing datasets.
pub const HEADER_FIELDS: [(&str, &str); 10] = [
    ("Id", "uint64_t"),
    ("CDP", "int32_t"),
    ("Offset", "double"),
    ("SrcX", "double"),
    ("SrcY", "double"),
    ("RcvX", "double"),
    ("RcvY", "double"),
    ("Delrt", "double"),
    ("Ns", "uint32_t"),
    ("Dt", "double"),
];

/// The essential fields of an SU trace header.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TraceHeader {
    /// Sequential id inside a dataset, or the byte offset of the header in
    /// the SU stream it was read from.
    pub id: u64,
    pub cdp: i32,
    pub offset: f64,
    pub src_x: f64,
    pub src_y: f64,
    pub rcv_x: f64,
    pub rcv_y: f64,
    pub delrt: f64,
    pub ns: u32,
    /// Sample interval in seconds.
    pub dt: f64,
}

impl TraceHeader {
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Length of the sample payload that follows this header.
    pub fn data_size(&self) -> usize {
        self.ns as usize * SAMPLE_SIZE
    }

    /// Midpoint and half-offset of the source/receiver pair.
    pub fn location(&self) -> SpatialPoint {
        Point::new([
            (self.rcv_x + self.src_x) / 2.0,
            (self.rcv_y + self.src_y) / 2.0,
            (self.rcv_x - self.src_x) / 2.0,
            (self.rcv_y - self.src_y) / 2.0,
        ])
    }

    /// Compares every field except the id against the copy already stored
    /// for the same trace.
    pub fn ensure_same(&self, stored: &TraceHeader) -> Result<(), ConsistencyError> {
        let mismatch = |field: &'static str, input: String, stored_value: String| {
            ConsistencyError::FieldMismatch {
                field,
                trace_id: stored.id,
                input_id: self.id,
                input_value: input,
                stored_value,
            }
        };

        if self.cdp != stored.cdp {
            return Err(mismatch("CDP", self.cdp.to_string(), stored.cdp.to_string()));
        }
        let doubles = [
            ("Offset", self.offset, stored.offset),
            ("SrcX", self.src_x, stored.src_x),
            ("SrcY", self.src_y, stored.src_y),
            ("RcvX", self.rcv_x, stored.rcv_x),
            ("RcvY", self.rcv_y, stored.rcv_y),
            ("Delrt", self.delrt, stored.delrt),
        ];
        for (field, input, existing) in doubles {
            if input != existing {
                return Err(mismatch(field, input.to_string(), existing.to_string()));
            }
        }
        if self.ns != stored.ns {
            return Err(mismatch("Ns", self.ns.to_string(), stored.ns.to_string()));
        }
        if self.dt != stored.dt {
            return Err(mismatch("Dt", self.dt.to_string(), stored.dt.to_string()));
        }
        Ok(())
    }
}

/// `helper_mhxy/Id@uint64_t/CDP@int32_t/...`
pub fn check_signature() -> String {
    let mut check = String::from(LOCATION_HELPER);
    for (name, type_name) in HEADER_FIELDS {
        check.push('/');
        check.push_str(name);
        check.push('@');
        check.push_str(type_name);
    }
    check
}
