//! The spatially indexed trace store seen from the pipelines.
//!
//! [`TraceStore`] is the whole contract the pack/extract pipelines rely on.
//! [`FileStore`] is an unindexed implementation of it: a header table, a JSON
//! sidecar and one memory-mapped data file holding a partition per slot.
//! Queries scan every header.

mod file_store;
pub mod meta;

pub use file_store::FileStore;
pub use meta::DatasetMeta;

use crate::core::Result;
use crate::su::{SpatialPoint, TraceHeader};

/// A trace as held by a store: its header and its raw sample bytes in one slot.
#[derive(Debug, Clone, Copy)]
pub struct TraceRef<'a> {
    pub header: &'a TraceHeader,
    pub data: &'a [u8],
}

pub type TraceIter<'a> = Box<dyn Iterator<Item = TraceRef<'a>> + 'a>;

pub trait TraceStore {
    /// Number of traces; ids run from 1 to `len()`.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slots(&self) -> usize;

    fn get_element(&self, id: u64, slot: usize) -> Result<TraceRef<'_>>;

    /// The committed header and the writable sample area reserved for it.
    fn get_element_mut(&mut self, id: u64, slot: usize) -> Result<(&TraceHeader, &mut [u8])>;

    fn iter_slot(&self, slot: usize) -> Result<TraceIter<'_>>;

    /// Traces whose location lies in the closed box `[min, max]`.
    fn range_query(
        &self,
        min: &SpatialPoint,
        max: &SpatialPoint,
        slot: usize,
    ) -> Result<TraceIter<'_>>;

    /// The `k` traces closest to `point`, nearest first.
    fn nearest_query(&self, point: &SpatialPoint, k: usize, slot: usize) -> Result<TraceIter<'_>>;

    fn exact_query(&self, point: &SpatialPoint, slot: usize) -> Result<Option<TraceRef<'_>>>;

    fn sync(&self) -> Result<()>;
}
