use serde::{Deserialize, Serialize};

use crate::core::FormatError;
use crate::su::header::TraceHeader;

pub const HEADER_SIZE: usize = 240;

pub const CDP_OFFSET: usize = 20;
pub const OFFSET_OFFSET: usize = 36;
pub const SCALCO_OFFSET: usize = 70;
pub const SX_OFFSET: usize = 72;
pub const SY_OFFSET: usize = 76;
pub const GX_OFFSET: usize = 80;
pub const GY_OFFSET: usize = 84;
pub const DELRT_OFFSET: usize = 108;
pub const NS_OFFSET: usize = 114;
pub const DT_OFFSET: usize = 116;

const DELRT_UNITS: f64 = 1.0e3;
const DT_UNITS: f64 = 1.0e6;

/// Byte order of every multi-byte header field in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl Endianness {
    fn get_i16(self, buf: &[u8; HEADER_SIZE], at: usize) -> i16 {
        let bytes = [buf[at], buf[at + 1]];
        match self {
            Endianness::Little => i16::from_le_bytes(bytes),
            Endianness::Big => i16::from_be_bytes(bytes),
        }
    }

    fn get_u16(self, buf: &[u8; HEADER_SIZE], at: usize) -> u16 {
        let bytes = [buf[at], buf[at + 1]];
        match self {
            Endianness::Little => u16::from_le_bytes(bytes),
            Endianness::Big => u16::from_be_bytes(bytes),
        }
    }

    fn get_i32(self, buf: &[u8; HEADER_SIZE], at: usize) -> i32 {
        let bytes = [buf[at], buf[at + 1], buf[at + 2], buf[at + 3]];
        match self {
            Endianness::Little => i32::from_le_bytes(bytes),
            Endianness::Big => i32::from_be_bytes(bytes),
        }
    }

    fn put_i16(self, buf: &mut [u8; HEADER_SIZE], at: usize, value: i16) {
        let bytes = match self {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        };
        buf[at..at + 2].copy_from_slice(&bytes);
    }

    fn put_u16(self, buf: &mut [u8; HEADER_SIZE], at: usize, value: u16) {
        let bytes = match self {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        };
        buf[at..at + 2].copy_from_slice(&bytes);
    }

    fn put_i32(self, buf: &mut [u8; HEADER_SIZE], at: usize, value: i32) {
        let bytes = match self {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        };
        buf[at..at + 4].copy_from_slice(&bytes);
    }
}

/// Converts between the 240-byte SU header block and [`TraceHeader`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceCodec {
    endianness: Endianness,
}

impl TraceCodec {
    pub fn new(endianness: Endianness) -> Self {
        Self { endianness }
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// `id` is the provisional identifier, normally the block's byte offset.
    pub fn decode(&self, block: &[u8; HEADER_SIZE], id: u64) -> Result<TraceHeader, FormatError> {
        let e = self.endianness;
        let scale = scale_multiplier(e.get_i16(block, SCALCO_OFFSET))?;
        Ok(TraceHeader {
            id,
            cdp: e.get_i32(block, CDP_OFFSET),
            offset: f64::from(e.get_i32(block, OFFSET_OFFSET)),
            src_x: f64::from(e.get_i32(block, SX_OFFSET)) * scale,
            src_y: f64::from(e.get_i32(block, SY_OFFSET)) * scale,
            rcv_x: f64::from(e.get_i32(block, GX_OFFSET)) * scale,
            rcv_y: f64::from(e.get_i32(block, GY_OFFSET)) * scale,
            delrt: f64::from(e.get_u16(block, DELRT_OFFSET)) / DELRT_UNITS,
            ns: u32::from(e.get_u16(block, NS_OFFSET)),
            dt: f64::from(e.get_u16(block, DT_OFFSET)) / DT_UNITS,
        })
    }

    /// Emits a zero-filled block carrying the header's fields. The id is not
    /// part of the SU layout and is dropped.
    pub fn encode(&self, header: &TraceHeader) -> Result<[u8; HEADER_SIZE], FormatError> {
        let e = self.endianness;
        let coords = [header.src_x, header.src_y, header.rcv_x, header.rcv_y];
        let scalco = select_scale(&coords)?;
        let multiplier = f64::from(scalco);

        let mut block = [0u8; HEADER_SIZE];
        e.put_i32(&mut block, CDP_OFFSET, header.cdp);
        e.put_i32(&mut block, OFFSET_OFFSET, narrow_i32("Offset", header.offset)?);
        e.put_i16(&mut block, SCALCO_OFFSET, scalco);
        for (at, coord) in [SX_OFFSET, SY_OFFSET, GX_OFFSET, GY_OFFSET]
            .into_iter()
            .zip(coords)
        {
            // select_scale guarantees the quotient fits.
            e.put_i32(&mut block, at, (coord / multiplier).trunc() as i32);
        }
        e.put_u16(&mut block, DELRT_OFFSET, narrow_u16("Delrt", (header.delrt * DELRT_UNITS).round())?);
        e.put_u16(&mut block, NS_OFFSET, narrow_u16("Ns", f64::from(header.ns))?);
        e.put_u16(&mut block, DT_OFFSET, narrow_u16("Dt", (header.dt * DT_UNITS).round())?);
        Ok(block)
    }
}

/// Multiplier that turns raw coordinates into real ones: negative codes
/// divide, positive codes multiply.
pub fn scale_multiplier(code: i16) -> Result<f64, FormatError> {
    match code {
        0 => Err(FormatError::ZeroScale),
        c if c < 0 => Ok(-1.0 / f64::from(c)),
        c => Ok(f64::from(c)),
    }
}

/// Smallest power-of-ten scale code under which every coordinate fits a
/// signed 32-bit integer.
pub fn select_scale(coords: &[f64]) -> Result<i16, FormatError> {
    if let Some(&bad) = coords.iter().find(|c| !c.is_finite()) {
        return Err(FormatError::NonFiniteCoordinate(bad));
    }
    let mut scale: i32 = 1;
    loop {
        let multiplier = f64::from(scale);
        let Some(&widest) = coords.iter().find(|c| !fits_i32(**c / multiplier)) else {
            break;
        };
        let next = scale * 10;
        if next > i32::from(i16::MAX) {
            return Err(FormatError::ScaleOverflow {
                coordinate: widest,
                limit: i16::MAX,
            });
        }
        scale = next;
    }
    Ok(scale as i16)
}

fn fits_i32(value: f64) -> bool {
    let truncated = value.trunc();
    truncated >= f64::from(i32::MIN) && truncated <= f64::from(i32::MAX)
}

fn narrow_i32(field: &'static str, value: f64) -> Result<i32, FormatError> {
    if !value.is_finite() || !fits_i32(value) {
        return Err(FormatError::FieldOverflow {
            field,
            value,
            bits: 32,
        });
    }
    Ok(value.trunc() as i32)
}

fn narrow_u16(field: &'static str, value: f64) -> Result<u16, FormatError> {
    if !(value >= 0.0 && value <= f64::from(u16::MAX)) {
        return Err(FormatError::FieldOverflow {
            field,
            value,
            bits: 16,
        });
    }
    Ok(value as u16)
}
