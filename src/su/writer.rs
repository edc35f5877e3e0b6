use std::io::Write;

use crate::core::{FormatError, Result};
use crate::su::codec::{Endianness, TraceCodec, HEADER_SIZE};
use crate::su::header::TraceHeader;

/// Writes header + sample records to an SU stream, flushing after each trace.
pub struct SuWriter<W> {
    inner: W,
    name: String,
    position: u64,
    traces: u64,
    codec: TraceCodec,
}

impl<W: Write> SuWriter<W> {
    pub fn new(inner: W, name: impl Into<String>, endianness: Endianness) -> Self {
        Self {
            inner,
            name: name.into(),
            position: 0,
            traces: 0,
            codec: TraceCodec::new(endianness),
        }
    }

    pub fn write_trace(&mut self, header: &TraceHeader, samples: &[u8]) -> Result<()> {
        if samples.len() != header.data_size() {
            return Err(FormatError::PayloadSize {
                expected: header.data_size(),
                actual: samples.len(),
            }
            .at(self.name.as_str(), self.position));
        }
        let block = self
            .codec
            .encode(header)
            .map_err(|err| err.at(self.name.as_str(), self.position))?;
        self.inner.write_all(&block)?;
        self.inner.write_all(samples)?;
        self.inner.flush()?;
        self.position += (HEADER_SIZE + samples.len()) as u64;
        self.traces += 1;
        Ok(())
    }

    pub fn traces_written(&self) -> u64 {
        self.traces
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::core::Error;
    use crate::su::reader::SuReader;

    #[test]
    fn written_traces_read_back() {
        let header = TraceHeader {
            id: 77,
            cdp: 3,
            offset: -25.0,
            src_x: 1000.0,
            src_y: 2000.0,
            rcv_x: 1050.0,
            rcv_y: 2000.0,
            delrt: 0.0,
            ns: 2,
            dt: 0.001,
        };
        let samples: Vec<u8> = [1.0f32, -1.0].iter().flat_map(|s| s.to_le_bytes()).collect();

        let mut writer = SuWriter::new(Vec::new(), "out", Endianness::Little);
        writer.write_trace(&header, &samples).expect("write");
        writer.write_trace(&header, &samples).expect("write");
        assert_eq!(writer.traces_written(), 2);
        assert_eq!(writer.position(), 2 * 248);

        let bytes = writer.into_inner();
        let mut reader = SuReader::new(Cursor::new(bytes), "out", Endianness::Little).expect("reader");
        let mut read_samples = Vec::new();
        let first = reader.read_trace(&mut read_samples).expect("read").expect("trace");
        assert_eq!(first.with_id(77), header);
        assert_eq!(read_samples, samples);
        let second = reader.read_trace(&mut read_samples).expect("read").expect("trace");
        assert_eq!(second.id, 248);
    }

    #[test]
    fn payload_length_must_match_ns() {
        let header = TraceHeader {
            ns: 3,
            ..TraceHeader::default()
        };
        let mut writer = SuWriter::new(Vec::new(), "out", Endianness::Little);
        match writer.write_trace(&header, &[0u8; 8]) {
            Err(Error::Format {
                source: FormatError::PayloadSize { expected, actual },
                ..
            }) => assert_eq!((expected, actual), (12, 8)),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(writer.into_inner().is_empty());
    }
}
