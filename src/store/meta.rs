use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::su::{Endianness, TraceHeader};

pub const TABLE_MAGIC: u32 = 0x5331_4f30; // 'S1O0'
pub const TABLE_VERSION: u32 = 1;
pub const PREAMBLE_SIZE: usize = 64;
pub const RECORD_SIZE: usize = 72;

/// JSON sidecar describing a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub check: String,
    pub slots: usize,
    pub traces: u64,
    pub slot_bytes: u64,
    /// Byte order of the SU streams the samples were copied from.
    pub endianness: Endianness,
    pub created_at_ns: u64,
}

pub fn write_dataset_meta(path: &Path, meta: &DatasetMeta) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(meta)?;
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)?;
    file.write_all(&data)?;
    file.sync_all()?;
    std::fs::rename(tmp, path)?;
    Ok(())
}

pub fn read_dataset_meta(path: &Path) -> Result<DatasetMeta> {
    let data = std::fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

pub fn check_crc(check: &str) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(check.as_bytes());
    hasher.finalize()
}

/// Fixed-size head of the binary header table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TablePreamble {
    pub count: u64,
    pub slots: u32,
    pub check_crc: u32,
}

impl TablePreamble {
    pub fn to_bytes(&self) -> [u8; PREAMBLE_SIZE] {
        let mut buf = [0u8; PREAMBLE_SIZE];
        buf[0..4].copy_from_slice(&TABLE_MAGIC.to_le_bytes());
        buf[4..8].copy_from_slice(&TABLE_VERSION.to_le_bytes());
        buf[8..16].copy_from_slice(&self.count.to_le_bytes());
        buf[16..20].copy_from_slice(&self.slots.to_le_bytes());
        buf[20..24].copy_from_slice(&self.check_crc.to_le_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8; PREAMBLE_SIZE]) -> Result<Self> {
        let magic = u32::from_le_bytes(bytes[0..4].try_into().expect("slice length"));
        let version = u32::from_le_bytes(bytes[4..8].try_into().expect("slice length"));
        if magic != TABLE_MAGIC {
            return Err(Error::Corrupt("header table magic mismatch"));
        }
        if version != TABLE_VERSION {
            return Err(Error::Corrupt("unsupported header table version"));
        }
        Ok(Self {
            count: u64::from_le_bytes(bytes[8..16].try_into().expect("slice length")),
            slots: u32::from_le_bytes(bytes[16..20].try_into().expect("slice length")),
            check_crc: u32::from_le_bytes(bytes[20..24].try_into().expect("slice length")),
        })
    }
}

pub fn encode_record(header: &TraceHeader) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    buf[0..8].copy_from_slice(&header.id.to_le_bytes());
    buf[8..12].copy_from_slice(&header.cdp.to_le_bytes());
    buf[12..16].copy_from_slice(&header.ns.to_le_bytes());
    let doubles = [
        header.offset,
        header.src_x,
        header.src_y,
        header.rcv_x,
        header.rcv_y,
        header.delrt,
        header.dt,
    ];
    for (i, value) in doubles.iter().enumerate() {
        let at = 16 + i * 8;
        buf[at..at + 8].copy_from_slice(&value.to_le_bytes());
    }
    buf
}

pub fn decode_record(bytes: &[u8; RECORD_SIZE]) -> TraceHeader {
    let f = |at: usize| f64::from_le_bytes(bytes[at..at + 8].try_into().expect("slice length"));
    TraceHeader {
        id: u64::from_le_bytes(bytes[0..8].try_into().expect("slice length")),
        cdp: i32::from_le_bytes(bytes[8..12].try_into().expect("slice length")),
        ns: u32::from_le_bytes(bytes[12..16].try_into().expect("slice length")),
        offset: f(16),
        src_x: f(24),
        src_y: f(32),
        rcv_x: f(40),
        rcv_y: f(48),
        delrt: f(56),
        dt: f(64),
    }
}
