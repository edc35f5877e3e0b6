use std::io::Write;
use std::os::unix::io::{AsRawFd, RawFd};

use log::{info, warn};

use crate::core::{Error, ParseError, Result};
use crate::query::{query_to_point, query_to_range, Query, QueryKind};
use crate::store::{TraceIter, TraceStore};
use crate::su::{SpatialPoint, SuWriter, SPATIAL_DIMS};

/// Which traces of a slot an extraction writes out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    All,
    Range(SpatialPoint, SpatialPoint),
    Nearest(SpatialPoint, usize),
    Exact(SpatialPoint),
}

impl Selection {
    pub fn from_query(query: &Query) -> std::result::Result<Self, ParseError> {
        Ok(match query.kind() {
            QueryKind::None => Selection::All,
            QueryKind::Range => {
                let range = query_to_range::<f64, SPATIAL_DIMS>(query)?;
                Selection::Range(range.min, range.max)
            }
            QueryKind::Nearest => Selection::Nearest(
                query_to_point::<f64, SPATIAL_DIMS>(query)?,
                query.neighbor_count()?,
            ),
            QueryKind::Exact => Selection::Exact(query_to_point::<f64, SPATIAL_DIMS>(query)?),
        })
    }
}

/// Writes the selected traces of `slot` to `out`; returns how many were written.
pub fn extract<S, W>(
    store: &S,
    slot: usize,
    selection: &Selection,
    out: &mut SuWriter<W>,
) -> Result<u64>
where
    S: TraceStore + ?Sized,
    W: Write,
{
    let traces: TraceIter<'_> = match selection {
        Selection::All => {
            info!("extracting all {} traces of slot {}", store.len(), slot);
            store.iter_slot(slot)?
        }
        Selection::Range(min, max) => {
            info!("range query: min {} max {}", min, max);
            store.range_query(min, max, slot)?
        }
        Selection::Nearest(point, k) => {
            info!("nearest query: {} neighbours of {}", k, point);
            store.nearest_query(point, *k, slot)?
        }
        Selection::Exact(point) => {
            info!("exact query: {}", point);
            match store.exact_query(point, slot)? {
                Some(trace) => Box::new(std::iter::once(trace)),
                None => {
                    warn!("no trace located at {}", point);
                    Box::new(std::iter::empty())
                }
            }
        }
    };

    let before = out.traces_written();
    for trace in traces {
        out.write_trace(trace.header, trace.data)?;
    }
    let written = out.traces_written() - before;
    info!("wrote {} traces", written);
    Ok(written)
}

/// Fails when `fd` is an interactive terminal.
pub fn ensure_not_terminal(fd: RawFd) -> Result<()> {
    // SAFETY: isatty only inspects the descriptor.
    if unsafe { libc::isatty(fd) } == 1 {
        return Err(Error::TerminalOutput);
    }
    Ok(())
}

pub fn ensure_stdout_not_terminal() -> Result<()> {
    ensure_not_terminal(std::io::stdout().as_raw_fd())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::query::{Point, QueryParser};
    use crate::store::FileStore;
    use crate::su::{Endianness, SuReader, TraceHeader};
    use tempfile::tempdir;

    fn selection(text: &str) -> std::result::Result<Selection, ParseError> {
        let query = QueryParser::new(SPATIAL_DIMS).parse(text)?;
        Selection::from_query(&query)
    }

    #[test]
    fn queries_resolve_to_selections() {
        assert_eq!(selection("").expect("all"), Selection::All);
        assert_eq!(
            selection("at,1,2,3,4").expect("exact"),
            Selection::Exact(Point::new([1.0, 2.0, 3.0, 4.0]))
        );
        assert_eq!(
            selection("nearest,1,2,3,4,5").expect("nearest"),
            Selection::Nearest(Point::new([1.0, 2.0, 3.0, 4.0]), 5)
        );
        match selection("range,5:1,:,2:,:3").expect("range") {
            Selection::Range(min, max) => {
                assert_eq!(min, Point::new([1.0, f64::MIN, 2.0, f64::MIN]));
                assert_eq!(max, Point::new([5.0, f64::MAX, f64::MAX, 3.0]));
            }
            other => panic!("unexpected selection: {other:?}"),
        }
        assert!(selection("nearest,1,2,3,4,").is_err());
        assert!(selection("at,1,2,x,4").is_err());
    }

    #[test]
    fn extract_writes_selected_traces() {
        let dir = tempdir().expect("tempdir");
        let headers: Vec<TraceHeader> = (1..=3u64)
            .map(|id| TraceHeader {
                id,
                cdp: id as i32,
                src_x: 0.0,
                rcv_x: 100.0 * id as f64,
                ns: 2,
                dt: 0.002,
                ..TraceHeader::default()
            })
            .collect();
        let mut store =
            FileStore::create(&dir.path().join("d"), 1, headers.clone(), Endianness::Little)
                .expect("store");
        for id in 1..=3u64 {
            let (_, data) = store.get_element_mut(id, 0).expect("element");
            data.fill(id as u8);
        }

        let mut out = SuWriter::new(Vec::new(), "out", Endianness::Little);
        let target = headers[1].location();
        assert_eq!(
            extract(&store, 0, &Selection::Exact(target), &mut out).expect("extract"),
            1
        );
        let missing = Point::new([1.0, 1.0, 1.0, 1.0]);
        assert_eq!(
            extract(&store, 0, &Selection::Exact(missing), &mut out).expect("extract"),
            0
        );
        assert_eq!(extract(&store, 0, &Selection::All, &mut out).expect("extract"), 3);

        let mut reader =
            SuReader::new(Cursor::new(out.into_inner()), "out", Endianness::Little).expect("reader");
        let mut samples = Vec::new();
        let first = reader.read_trace(&mut samples).expect("read").expect("trace");
        assert_eq!(first.cdp, 2);
        assert_eq!(samples, vec![2u8; 8]);
        let mut count = 1;
        while reader.read_trace(&mut samples).expect("read").is_some() {
            count += 1;
        }
        assert_eq!(count, 4);
    }

    #[test]
    fn pipes_are_not_terminals() {
        let dir = tempdir().expect("tempdir");
        let file = std::fs::File::create(dir.path().join("out.su")).expect("file");
        ensure_not_terminal(file.as_raw_fd()).expect("regular file");
    }
}
