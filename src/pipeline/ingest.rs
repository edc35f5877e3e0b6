use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::core::{ConsistencyError, Error, Result};
use crate::store::{FileStore, TraceStore};
use crate::su::{Endianness, SuReader, TraceHeader};

#[derive(Debug, Clone)]
pub struct PackConfig {
    pub endianness: Endianness,
    /// Number of progress lines logged per pass over a stream.
    pub progress_steps: u64,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            endianness: Endianness::Little,
            progress_steps: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackStats {
    pub headers: u64,
    pub slots: usize,
    pub traces: u64,
}

/// Reads every header of `reader`, renumbering them 1..N.
///
/// The returned headers carry their sequential id; the second vector keeps
/// the byte offset each one was read from.
pub fn read_reference_headers<R: Read + Seek>(
    reader: &mut SuReader<R>,
) -> Result<(Vec<TraceHeader>, Vec<u64>)> {
    let mut headers = Vec::new();
    let mut positions = Vec::new();
    while let Some(header) = reader.read_trace_header()? {
        positions.push(header.id);
        headers.push(header.with_id(headers.len() as u64 + 1));
    }
    if headers.is_empty() {
        return Err(ConsistencyError::NoHeaders {
            stream: reader.name().to_string(),
        }
        .into());
    }
    Ok((headers, positions))
}

/// Copies the samples of every trace in `reader` into `slot`.
///
/// Each header is compared with the stored one before its samples are
/// touched. Returns the number of traces copied.
pub fn fill_slot<S, R>(
    store: &mut S,
    slot: usize,
    reader: &mut SuReader<R>,
    progress_steps: u64,
) -> Result<u64>
where
    S: TraceStore + ?Sized,
    R: Read + Seek,
{
    let expected = store.len() as u64;
    let step = (expected / progress_steps.max(1)).max(1);
    let mut samples = Vec::new();
    let mut copied = 0u64;

    while let Some(input) = reader.read_trace(&mut samples)? {
        if copied == expected {
            // Count what is left so the error reports the stream's real length.
            let mut found = copied + 1;
            while reader.read_trace_header()?.is_some() {
                found += 1;
            }
            return Err(ConsistencyError::TraceCount {
                stream: reader.name().to_string(),
                found,
                expected,
            }
            .into());
        }
        let (stored, data) = store.get_element_mut(copied + 1, slot)?;
        input.ensure_same(stored)?;
        data.copy_from_slice(&samples);
        copied += 1;
        if copied % step == 0 {
            debug!(
                "{}: {}/{} traces ({}%)",
                reader.name(),
                copied,
                expected,
                copied * 100 / expected
            );
        }
    }

    if copied != expected {
        return Err(ConsistencyError::TraceCount {
            stream: reader.name().to_string(),
            found: copied,
            expected,
        }
        .into());
    }
    Ok(copied)
}

/// Packs `inputs` into a new dataset at `output`, input i filling slot i.
pub fn pack_su_files(inputs: &[PathBuf], output: &Path, config: &PackConfig) -> Result<PackStats> {
    let Some(first) = inputs.first() else {
        return Err(Error::InvalidDataset("no input streams".to_string()));
    };

    info!("reading reference headers from {}", first.display());
    let mut reader = SuReader::open(first, config.endianness)?;
    let (headers, _) = read_reference_headers(&mut reader)?;
    let count = headers.len() as u64;
    info!("read {} headers", count);

    info!("building dataset {}", output.display());
    let mut store = FileStore::create(output, inputs.len(), headers, config.endianness)?;

    let mut traces = 0u64;
    for (slot, input) in inputs.iter().enumerate() {
        info!("copying {} into slot {}", input.display(), slot);
        let mut reader = SuReader::open(input, config.endianness)?;
        traces += fill_slot(&mut store, slot, &mut reader, config.progress_steps)?;
    }
    store.sync()?;
    info!("packed {} traces into {} slots", traces, inputs.len());

    Ok(PackStats {
        headers: count,
        slots: inputs.len(),
        traces,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::su::SuWriter;
    use tempfile::tempdir;

    fn header(cdp: i32, ns: u32) -> TraceHeader {
        TraceHeader {
            cdp,
            offset: 50.0 * cdp as f64,
            src_x: 100.0 * cdp as f64,
            rcv_x: 100.0 * cdp as f64 + 50.0,
            ns,
            dt: 0.004,
            ..TraceHeader::default()
        }
    }

    fn stream(headers: &[TraceHeader], fill: u8) -> Vec<u8> {
        let mut writer = SuWriter::new(Vec::new(), "mem", Endianness::Little);
        for h in headers {
            writer
                .write_trace(h, &vec![fill; h.data_size()])
                .expect("write");
        }
        writer.into_inner()
    }

    fn reader(bytes: Vec<u8>, name: &str) -> SuReader<Cursor<Vec<u8>>> {
        SuReader::new(Cursor::new(bytes), name, Endianness::Little).expect("reader")
    }

    #[test]
    fn reference_headers_are_renumbered() {
        let hs = [header(1, 2), header(2, 3)];
        let (headers, positions) =
            read_reference_headers(&mut reader(stream(&hs, 0), "a.su")).expect("headers");
        assert_eq!(headers.iter().map(|h| h.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(positions, vec![0, 248]);
        assert_eq!(headers[1].cdp, 2);
    }

    #[test]
    fn empty_reference_is_an_error() {
        let err = read_reference_headers(&mut reader(Vec::new(), "empty.su")).unwrap_err();
        assert!(matches!(
            err,
            Error::Consistency(ConsistencyError::NoHeaders { .. })
        ));
    }

    #[test]
    fn mismatch_stops_before_copying() {
        let dir = tempdir().expect("tempdir");
        let hs = [header(1, 2), header(2, 2)];
        let (headers, _) =
            read_reference_headers(&mut reader(stream(&hs, 0), "a.su")).expect("headers");
        let mut store =
            FileStore::create(&dir.path().join("d"), 1, headers, Endianness::Little).expect("store");

        let mut changed = hs;
        changed[1].cdp = 9;
        let err = fill_slot(&mut store, 0, &mut reader(stream(&changed, 7), "b.su"), 100)
            .unwrap_err();
        match err {
            Error::Consistency(ConsistencyError::FieldMismatch {
                field,
                trace_id,
                input_id,
                input_value,
                stored_value,
            }) => {
                assert_eq!(field, "CDP");
                assert_eq!(trace_id, 2);
                assert_eq!(input_id, 248);
                assert_eq!(input_value, "9");
                assert_eq!(stored_value, "2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.get_element(1, 0).expect("first").data, &[7u8; 8]);
        assert_eq!(store.get_element(2, 0).expect("second").data, &[0u8; 8]);
    }

    #[test]
    fn trace_count_must_match() {
        let dir = tempdir().expect("tempdir");
        let hs = [header(1, 1), header(2, 1)];
        let (headers, _) =
            read_reference_headers(&mut reader(stream(&hs, 0), "a.su")).expect("headers");
        let mut store =
            FileStore::create(&dir.path().join("d"), 2, headers, Endianness::Little).expect("store");

        let short = fill_slot(&mut store, 0, &mut reader(stream(&hs[..1], 1), "short.su"), 100);
        assert!(matches!(
            short,
            Err(Error::Consistency(ConsistencyError::TraceCount {
                found: 1,
                expected: 2,
                ..
            }))
        ));

        let long = [header(1, 1), header(2, 1), header(3, 1)];
        let err = fill_slot(&mut store, 1, &mut reader(stream(&long, 1), "long.su"), 100);
        assert!(matches!(
            err,
            Err(Error::Consistency(ConsistencyError::TraceCount {
                found: 3,
                expected: 2,
                ..
            }))
        ));
    }
}
