use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;

use suindex::core::{ConsistencyError, Error};
use suindex::pipeline::{extract, pack_su_files, PackConfig, Selection};
use suindex::query::QueryParser;
use suindex::store::{FileStore, TraceStore};
use suindex::su::{Endianness, SuReader, SuWriter, TraceHeader, SPATIAL_DIMS};
use tempfile::tempdir;

fn survey() -> Vec<TraceHeader> {
    let mut headers = Vec::new();
    for shot in 0..4 {
        for channel in 0..5 {
            let src_x = 1000.0 + 50.0 * shot as f64;
            let rcv_x = src_x + 25.0 * (channel + 1) as f64;
            headers.push(TraceHeader {
                cdp: 100 + 2 * shot + channel,
                offset: rcv_x - src_x,
                src_x,
                src_y: 500.0,
                rcv_x,
                rcv_y: 510.0,
                delrt: 0.0,
                ns: 8,
                dt: 0.002,
                ..TraceHeader::default()
            });
        }
    }
    headers
}

/// Samples of trace `index` in input file `file`.
fn samples(file: usize, index: usize, ns: u32) -> Vec<u8> {
    (0..ns)
        .flat_map(|i| ((file * 1000 + index) as f32 + i as f32 * 0.25).to_le_bytes())
        .collect()
}

fn write_su(path: &Path, headers: &[TraceHeader], file: usize, endianness: Endianness) {
    let out = BufWriter::new(File::create(path).expect("create su"));
    let mut writer = SuWriter::new(out, path.display().to_string(), endianness);
    for (index, header) in headers.iter().enumerate() {
        writer
            .write_trace(header, &samples(file, index, header.ns))
            .expect("write trace");
    }
}

fn run_query(store: &FileStore, slot: usize, text: &str) -> Vec<(TraceHeader, Vec<u8>)> {
    let query = QueryParser::new(SPATIAL_DIMS).parse(text).expect("query");
    let selection = Selection::from_query(&query).expect("selection");
    let mut writer = SuWriter::new(Vec::new(), "out", store.endianness());
    extract(store, slot, &selection, &mut writer).expect("extract");

    let mut reader = SuReader::new(Cursor::new(writer.into_inner()), "out", store.endianness())
        .expect("reader");
    let mut out = Vec::new();
    let mut buf = Vec::new();
    while let Some(header) = reader.read_trace(&mut buf).expect("read") {
        out.push((header, buf.clone()));
    }
    out
}

#[test]
fn pack_then_extract_every_slot() {
    let dir = tempdir().expect("tempdir");
    let headers = survey();
    let inputs: Vec<_> = (0..3)
        .map(|file| {
            let path = dir.path().join(format!("line{file}.su"));
            write_su(&path, &headers, file, Endianness::Little);
            path
        })
        .collect();
    let dataset = dir.path().join("survey");

    let stats = pack_su_files(&inputs, &dataset, &PackConfig::default()).expect("pack");
    assert_eq!(stats.headers, 20);
    assert_eq!(stats.slots, 3);
    assert_eq!(stats.traces, 60);

    let store = FileStore::open(&dataset).expect("open");
    assert_eq!(store.len(), 20);
    for slot in 0..3 {
        let traces = run_query(&store, slot, "");
        assert_eq!(traces.len(), 20);
        for (index, (header, data)) in traces.iter().enumerate() {
            assert_eq!(header.cdp, headers[index].cdp);
            assert_eq!(header.src_x, headers[index].src_x);
            assert_eq!(header.dt, headers[index].dt);
            assert_eq!(data, &samples(slot, index, 8));
        }
    }
}

#[test]
fn exact_query_returns_the_located_trace() {
    let dir = tempdir().expect("tempdir");
    let headers = survey();
    let input = dir.path().join("line.su");
    write_su(&input, &headers, 0, Endianness::Little);
    let dataset = dir.path().join("survey");
    pack_su_files(&[input], &dataset, &PackConfig::default()).expect("pack");
    let store = FileStore::open(&dataset).expect("open");

    for (index, header) in headers.iter().enumerate() {
        let location = header.location();
        let found = store
            .exact_query(&location, 0)
            .expect("exact")
            .expect("located");
        assert_eq!(found.header, &header.with_id(index as u64 + 1));

        let coords = location.coords();
        let text = format!("at,{},{},{},{}", coords[0], coords[1], coords[2], coords[3]);
        let traces = run_query(&store, 0, &text);
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].0.cdp, header.cdp);
        assert_eq!(traces[0].1, samples(0, index, 8));
    }

    assert!(run_query(&store, 0, "at,0,0,0,0").is_empty());
}

#[test]
fn range_and_nearest_queries() {
    let dir = tempdir().expect("tempdir");
    let headers = survey();
    let input = dir.path().join("line.su");
    write_su(&input, &headers, 0, Endianness::Little);
    let dataset = dir.path().join("survey");
    pack_su_files(&[input], &dataset, &PackConfig::default()).expect("pack");
    let store = FileStore::open(&dataset).expect("open");

    // Half offsets run 12.5, 25, ..., 62.5 along x.
    let near = run_query(&store, 0, "range,:,:,:30,:");
    assert_eq!(near.len(), 8);
    assert!(near.iter().all(|(h, _)| (h.rcv_x - h.src_x) / 2.0 <= 30.0));

    let far = run_query(&store, 0, "range,:,:,30:,:");
    assert_eq!(far.len(), 12);

    let box_query = run_query(&store, 0, "range,1100:1000,505:505,12.5:12.5,5:5");
    assert_eq!(box_query.len(), 2);

    let nearest = run_query(&store, 0, "nearest,1087.5,505,37.5,5,3");
    assert_eq!(nearest.len(), 3);
    assert_eq!(nearest[0].0.src_x, 1050.0);
    assert_eq!(nearest[0].0.rcv_x, 1125.0);
}

#[test]
fn big_endian_dataset_round_trip() {
    let dir = tempdir().expect("tempdir");
    let headers = survey();
    let input = dir.path().join("line.su");
    write_su(&input, &headers, 0, Endianness::Big);
    let dataset = dir.path().join("survey");
    let config = PackConfig {
        endianness: Endianness::Big,
        ..PackConfig::default()
    };
    pack_su_files(&[input], &dataset, &config).expect("pack");

    let store = FileStore::open(&dataset).expect("open");
    assert_eq!(store.endianness(), Endianness::Big);
    let traces = run_query(&store, 0, "");
    assert_eq!(traces.len(), headers.len());
    assert_eq!(traces[7].0.cdp, headers[7].cdp);
}

#[test]
fn mismatched_input_aborts_before_copying() {
    let dir = tempdir().expect("tempdir");
    let headers = survey();
    let first = dir.path().join("a.su");
    write_su(&first, &headers, 0, Endianness::Little);
    let mut changed = headers.clone();
    changed[3].cdp = 9999;
    let second = dir.path().join("b.su");
    write_su(&second, &changed, 1, Endianness::Little);

    let dataset = dir.path().join("survey");
    let err = pack_su_files(&[first, second], &dataset, &PackConfig::default()).unwrap_err();
    match &err {
        Error::Consistency(ConsistencyError::FieldMismatch {
            field,
            trace_id,
            input_id,
            input_value,
            stored_value,
        }) => {
            assert_eq!(*field, "CDP");
            assert_eq!(*trace_id, 4);
            assert_eq!(*input_id, 3 * (240 + 32));
            assert_eq!(input_value, "9999");
            assert_eq!(stored_value, &headers[3].cdp.to_string());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("9999"));
    assert!(message.contains(&headers[3].cdp.to_string()));

    let store = FileStore::open(&dataset).expect("open");
    assert_eq!(store.get_element(3, 1).expect("copied").data, samples(1, 2, 8).as_slice());
    assert!(store.get_element(4, 1).expect("skipped").data.iter().all(|b| *b == 0));
}
