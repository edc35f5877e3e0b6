use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::core::{Error, MmapFile, Result};
use crate::query::Range;
use crate::store::meta::{
    check_crc, decode_record, encode_record, read_dataset_meta, write_dataset_meta, DatasetMeta,
    TablePreamble, PREAMBLE_SIZE, RECORD_SIZE,
};
use crate::store::{TraceIter, TraceRef, TraceStore};
use crate::su::{check_signature, Endianness, SpatialPoint, TraceHeader};

const TABLE_EXT: &str = "meta";
const DATA_EXT: &str = "data";
const SIDECAR_EXT: &str = "json";

/// Dataset at `P` made of `P.meta`, `P.data` and `P.json`.
pub struct FileStore {
    path: PathBuf,
    meta: DatasetMeta,
    headers: Vec<TraceHeader>,
    /// Offset of each trace's samples inside a slot partition.
    offsets: Vec<u64>,
    data: MmapFile,
}

impl FileStore {
    /// Lays out a new dataset for `headers`, whose ids must run 1..=N in
    /// order. Every slot starts zero-filled.
    pub fn create(
        path: &Path,
        slots: usize,
        headers: Vec<TraceHeader>,
        endianness: Endianness,
    ) -> Result<Self> {
        if slots == 0 {
            return Err(Error::InvalidDataset("at least one slot is required".to_string()));
        }
        if headers.is_empty() {
            return Err(Error::InvalidDataset("no trace headers".to_string()));
        }
        check_sequential_ids(&headers)?;
        let (offsets, slot_bytes) = layout(&headers);

        let check = check_signature();
        let preamble = TablePreamble {
            count: headers.len() as u64,
            slots: u32::try_from(slots)
                .map_err(|_| Error::InvalidDataset(format!("too many slots: {slots}")))?,
            check_crc: check_crc(&check),
        };
        let table_path = sibling(path, TABLE_EXT);
        let mut table = BufWriter::new(File::create(&table_path)?);
        table.write_all(&preamble.to_bytes())?;
        for header in &headers {
            table.write_all(&encode_record(header))?;
        }
        table.flush()?;
        table.get_ref().sync_all()?;

        let data = MmapFile::create(&sibling(path, DATA_EXT), data_file_len(slot_bytes, slots))?;

        let meta = DatasetMeta {
            check,
            slots,
            traces: headers.len() as u64,
            slot_bytes,
            endianness,
            created_at_ns: now_ns(),
        };
        write_dataset_meta(&sibling(path, SIDECAR_EXT), &meta)?;

        info!(
            "created dataset {} with {} traces, {} slots of {} bytes",
            path.display(),
            meta.traces,
            slots,
            slot_bytes
        );

        Ok(Self {
            path: path.to_path_buf(),
            meta,
            headers,
            offsets,
            data,
        })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let meta = read_dataset_meta(&sibling(path, SIDECAR_EXT))?;
        let expected = check_signature();
        if meta.check != expected {
            return Err(Error::SchemaMismatch {
                expected,
                found: meta.check,
            });
        }

        let mut table = Vec::new();
        File::open(sibling(path, TABLE_EXT))?.read_to_end(&mut table)?;
        if table.len() < PREAMBLE_SIZE {
            return Err(Error::Corrupt("header table truncated"));
        }
        let preamble = TablePreamble::from_bytes(
            table[..PREAMBLE_SIZE].try_into().expect("slice length"),
        )?;
        if preamble.check_crc != check_crc(&meta.check) {
            return Err(Error::Corrupt("header table check does not match sidecar"));
        }
        if preamble.count != meta.traces || preamble.slots as usize != meta.slots {
            return Err(Error::Corrupt("header table counts do not match sidecar"));
        }
        let records = &table[PREAMBLE_SIZE..];
        if records.len() as u64 != preamble.count * RECORD_SIZE as u64 {
            return Err(Error::Corrupt("header table size mismatch"));
        }
        let headers: Vec<TraceHeader> = records
            .chunks_exact(RECORD_SIZE)
            .map(|chunk| decode_record(chunk.try_into().expect("chunk length")))
            .collect();
        check_sequential_ids(&headers)?;

        let (offsets, slot_bytes) = layout(&headers);
        if slot_bytes != meta.slot_bytes {
            return Err(Error::Corrupt("slot size does not match headers"));
        }
        let data = MmapFile::open(&sibling(path, DATA_EXT))?;
        if data.len() != data_file_len(slot_bytes, meta.slots) {
            return Err(Error::Corrupt("data file size mismatch"));
        }

        debug!(
            "opened dataset {} ({} traces, {} slots)",
            path.display(),
            headers.len(),
            meta.slots
        );

        Ok(Self {
            path: path.to_path_buf(),
            meta,
            headers,
            offsets,
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn meta(&self) -> &DatasetMeta {
        &self.meta
    }

    pub fn endianness(&self) -> Endianness {
        self.meta.endianness
    }

    pub fn headers(&self) -> &[TraceHeader] {
        &self.headers
    }

    fn check_slot(&self, slot: usize) -> Result<()> {
        if slot >= self.meta.slots {
            return Err(Error::InvalidSlot {
                slot,
                slots: self.meta.slots,
            });
        }
        Ok(())
    }

    fn index_of(&self, id: u64) -> Result<usize> {
        if id == 0 || id > self.headers.len() as u64 {
            return Err(Error::UnknownId {
                id,
                len: self.headers.len(),
            });
        }
        Ok((id - 1) as usize)
    }

    fn data_start(&self, index: usize, slot: usize) -> usize {
        (slot as u64 * self.meta.slot_bytes + self.offsets[index]) as usize
    }

    /// `index` and `slot` must already be validated.
    fn trace_at(&self, index: usize, slot: usize) -> TraceRef<'_> {
        let header = &self.headers[index];
        let start = self.data_start(index, slot);
        TraceRef {
            header,
            data: &self.data.as_slice()[start..start + header.data_size()],
        }
    }
}

impl TraceStore for FileStore {
    fn len(&self) -> usize {
        self.headers.len()
    }

    fn slots(&self) -> usize {
        self.meta.slots
    }

    fn get_element(&self, id: u64, slot: usize) -> Result<TraceRef<'_>> {
        self.check_slot(slot)?;
        let index = self.index_of(id)?;
        Ok(self.trace_at(index, slot))
    }

    fn get_element_mut(&mut self, id: u64, slot: usize) -> Result<(&TraceHeader, &mut [u8])> {
        self.check_slot(slot)?;
        let index = self.index_of(id)?;
        let start = self.data_start(index, slot);
        let header = &self.headers[index];
        let data = self.data.range_mut(start, header.data_size())?;
        Ok((header, data))
    }

    fn iter_slot(&self, slot: usize) -> Result<TraceIter<'_>> {
        self.check_slot(slot)?;
        Ok(Box::new(
            (0..self.headers.len()).map(move |index| self.trace_at(index, slot)),
        ))
    }

    fn range_query(
        &self,
        min: &SpatialPoint,
        max: &SpatialPoint,
        slot: usize,
    ) -> Result<TraceIter<'_>> {
        self.check_slot(slot)?;
        let range = Range {
            min: *min,
            max: *max,
        };
        Ok(Box::new(
            (0..self.headers.len())
                .filter(move |&index| range.contains(&self.headers[index].location()))
                .map(move |index| self.trace_at(index, slot)),
        ))
    }

    fn nearest_query(&self, point: &SpatialPoint, k: usize, slot: usize) -> Result<TraceIter<'_>> {
        self.check_slot(slot)?;
        let mut ranked: Vec<(f64, usize)> = self
            .headers
            .iter()
            .enumerate()
            .map(|(index, header)| (header.location().distance_squared(point), index))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked.truncate(k);
        Ok(Box::new(
            ranked
                .into_iter()
                .map(move |(_, index)| self.trace_at(index, slot)),
        ))
    }

    fn exact_query(&self, point: &SpatialPoint, slot: usize) -> Result<Option<TraceRef<'_>>> {
        self.check_slot(slot)?;
        Ok(self
            .headers
            .iter()
            .position(|header| header.location() == *point)
            .map(|index| self.trace_at(index, slot)))
    }

    fn sync(&self) -> Result<()> {
        self.data.sync()
    }
}

fn check_sequential_ids(headers: &[TraceHeader]) -> Result<()> {
    for (index, header) in headers.iter().enumerate() {
        let expected = index as u64 + 1;
        if header.id != expected {
            return Err(Error::InvalidDataset(format!(
                "trace ids must run 1..N in order: position {index} has id {}, expected {expected}",
                header.id
            )));
        }
    }
    Ok(())
}

fn layout(headers: &[TraceHeader]) -> (Vec<u64>, u64) {
    let mut offsets = Vec::with_capacity(headers.len());
    let mut total = 0u64;
    for header in headers {
        offsets.push(total);
        total += header.data_size() as u64;
    }
    (offsets, total)
}

fn data_file_len(slot_bytes: u64, slots: usize) -> usize {
    // A mapping cannot be empty; sample-less datasets keep one spare byte.
    ((slot_bytes * slots as u64) as usize).max(1)
}

/// `P` + `.ext`, keeping any extension `P` already has.
fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
