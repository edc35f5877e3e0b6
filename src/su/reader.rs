use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use crate::core::{FormatError, Result};
use crate::su::codec::{Endianness, TraceCodec, HEADER_SIZE};
use crate::su::header::TraceHeader;

/// Sequential reader over an SU stream.
///
/// Every decoded header gets its byte offset in the stream as id. Failures are
/// reported against the stream name and the byte position of the record.
pub struct SuReader<R> {
    inner: R,
    name: String,
    position: u64,
    len: u64,
    codec: TraceCodec,
}

impl SuReader<BufReader<File>> {
    pub fn open(path: &Path, endianness: Endianness) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file), path.display().to_string(), endianness)
    }
}

impl<R: Read + Seek> SuReader<R> {
    pub fn new(mut inner: R, name: impl Into<String>, endianness: Endianness) -> Result<Self> {
        let position = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(position))?;
        Ok(Self {
            inner,
            name: name.into(),
            position,
            len,
            codec: TraceCodec::new(endianness),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw header block at the current position, `None` at a clean end of
    /// stream.
    pub fn next_header_block(&mut self) -> Result<Option<[u8; HEADER_SIZE]>> {
        let start = self.position;
        let mut block = [0u8; HEADER_SIZE];
        let read = self.read_full(&mut block)?;
        if read == 0 {
            return Ok(None);
        }
        if read < HEADER_SIZE {
            return Err(FormatError::ShortRead {
                expected: HEADER_SIZE as u64,
                actual: read as u64,
            }
            .at(self.name.as_str(), start));
        }
        Ok(Some(block))
    }

    /// Decodes the next header and seeks over its samples.
    pub fn read_trace_header(&mut self) -> Result<Option<TraceHeader>> {
        let Some(header) = self.read_header()? else {
            return Ok(None);
        };
        self.skip_samples(header.data_size() as u64)?;
        Ok(Some(header))
    }

    /// Decodes the next header and reads its raw sample bytes into `samples`.
    pub fn read_trace(&mut self, samples: &mut Vec<u8>) -> Result<Option<TraceHeader>> {
        let Some(header) = self.read_header()? else {
            return Ok(None);
        };
        let start = self.position;
        samples.resize(header.data_size(), 0);
        let read = self.read_full(samples)?;
        if read < samples.len() {
            return Err(FormatError::ShortRead {
                expected: samples.len() as u64,
                actual: read as u64,
            }
            .at(self.name.as_str(), start));
        }
        Ok(Some(header))
    }

    fn read_header(&mut self) -> Result<Option<TraceHeader>> {
        let start = self.position;
        let Some(block) = self.next_header_block()? else {
            return Ok(None);
        };
        let header = self
            .codec
            .decode(&block, start)
            .map_err(|err| err.at(self.name.as_str(), start))?;
        Ok(Some(header))
    }

    fn skip_samples(&mut self, bytes: u64) -> Result<()> {
        let remaining = self.len.saturating_sub(self.position);
        if bytes > remaining {
            return Err(FormatError::ShortRead {
                expected: bytes,
                actual: remaining,
            }
            .at(self.name.as_str(), self.position));
        }
        self.inner.seek(SeekFrom::Current(bytes as i64))?;
        self.position += bytes;
        Ok(())
    }

    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        self.position += filled as u64;
        Ok(filled)
    }
}
