//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Crux.
//! The Crux project belongs to the Dunimd Team.

use std::fs;

use proptest::prelude::*;

use crux_cache::{CruxChunkerConfig, CruxError, CruxPeriod, CruxRankedRow, CruxRowChunker};

fn period() -> CruxPeriod {
    CruxPeriod::new(2025, 1).unwrap()
}

fn rows(n: usize) -> Vec<CruxRankedRow> {
    (0..n)
        .map(|i| CruxRankedRow::new(format!("https://site{:04}.example", i), 1000 * (i as u64 / 10 + 1)))
        .collect()
}

/// Reads every chunk back, dropping the header of chunk 1.
fn read_back(dir: &std::path::Path, filenames: &[String]) -> Vec<CruxRankedRow> {
    let mut out = Vec::new();
    for (i, name) in filenames.iter().enumerate() {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(i == 0)
            .from_path(dir.join(name))
            .unwrap();
        for row in reader.deserialize() {
            out.push(row.unwrap());
        }
    }
    out
}

#[test]
fn test_empty_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let chunks = CruxRowChunker::new(dir.path()).split(period(), Vec::new()).unwrap();
    assert!(chunks.is_empty());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_only_first_chunk_has_header() {
    let dir = tempfile::tempdir().unwrap();
    let config = CruxChunkerConfig::default().target_chunk_bytes(200);
    let chunks = CruxRowChunker::new(dir.path())
        .with_config(config)
        .split(period(), rows(25))
        .unwrap();

    assert!(chunks.len() > 1);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk as usize, i + 1);
        assert_eq!(chunk.filename, format!("202501_{}.csv", i + 1));
        let content = fs::read_to_string(dir.path().join(&chunk.filename)).unwrap();
        assert_eq!(content.starts_with("origin,rank\n"), i == 0, "{}", chunk.filename);
        assert_eq!(chunk.size, content.len() as u64);
    }
}

#[test]
fn test_offsets_are_contiguous() {
    let dir = tempfile::tempdir().unwrap();
    let chunks = CruxRowChunker::new(dir.path())
        .with_config(CruxChunkerConfig::default().target_chunk_bytes(300))
        .split(period(), rows(40))
        .unwrap();

    let mut expected_start = 0;
    for chunk in &chunks {
        assert_eq!(chunk.start_row, expected_start);
        assert_eq!(chunk.end_row, chunk.start_row + chunk.rows);
        expected_start = chunk.end_row;
    }
    assert_eq!(expected_start, 40);
}

#[test]
fn test_rows_per_chunk_follows_sample_estimate() {
    let dir = tempfile::tempdir().unwrap();
    let chunker = CruxRowChunker::new(dir.path())
        .with_config(CruxChunkerConfig::default().target_chunk_bytes(1_000).sample_rows(5));
    let input = rows(50);
    let plan = chunker.estimate(&input[..5]).unwrap();
    let chunks = chunker.split(period(), input).unwrap();

    for chunk in &chunks[..chunks.len() - 1] {
        assert_eq!(chunk.rows, plan.rows_per_chunk);
    }
    assert!(chunks.last().unwrap().rows <= plan.rows_per_chunk);
}

#[test]
fn test_stream_error_removes_partial_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut stream: Vec<crux_cache::Result<CruxRankedRow>> = rows(30).into_iter().map(Ok).collect();
    stream.push(Err(CruxError::Csv("truncated export".into())));

    let err = CruxRowChunker::new(dir.path())
        .with_config(CruxChunkerConfig::default().target_chunk_bytes(200).sample_rows(5))
        .try_split(period(), stream)
        .unwrap_err();
    assert!(matches!(err, CruxError::Csv(_)));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_concatenation_reconstructs_input(
        input in prop::collection::vec(("[a-z]{1,20}", 1u64..50_000_000u64), 0..120),
        target in 40usize..400,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let rows: Vec<CruxRankedRow> = input
            .into_iter()
            .map(|(host, rank)| CruxRankedRow::new(format!("https://{}.example", host), rank))
            .collect();

        let chunks = CruxRowChunker::new(dir.path())
            .with_config(CruxChunkerConfig::default().target_chunk_bytes(target).sample_rows(10))
            .split(period(), rows.clone())
            .unwrap();

        let names: Vec<String> = chunks.iter().map(|c| c.filename.clone()).collect();
        prop_assert_eq!(read_back(dir.path(), &names), rows);
    }
}
