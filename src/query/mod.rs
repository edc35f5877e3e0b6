//! Textual spatial selections.
//!
//! ```text
//! ""                              everything
//! range,R0,R1,...,RN-1           Ri = [low]:[high], either side may be empty
//! nearest,c0,c1,...,cN-1,k       k nearest neighbours of a point
//! at,c0,c1,...,cN-1              the element exactly at a point
//! ```

mod element;
mod geometry;
mod parser;

pub use element::QueryElement;
pub use geometry::{query_to_point, query_to_range, Coordinate, Point, Range};
pub use parser::{Query, QueryConfig, QueryKind, QueryParser};
