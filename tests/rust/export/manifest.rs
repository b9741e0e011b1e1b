//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Crux.
//! The Crux project belongs to the Dunimd Team.

use std::fs;
use std::path::Path;

use crux_cache::{
    CruxChunkerConfig, CruxDatasetManifest, CruxManifestReconciler, CruxPeriod, CruxRankedRow,
    CruxRowChunker, CruxUpdateMode,
};

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn sample_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "202501_1.csv", "origin,rank\na.com,1000\nb.com,1000\n");
    write(dir.path(), "202501_2.csv", "c.com,5000\nd.com,5000\ne.com,5000");
    write(dir.path(), "202412_1.csv", "origin,rank\nx.com,1000\n");
    write(dir.path(), "notes.txt", "ignored");
    write(dir.path(), "202501_final.csv", "ignored too");
    dir
}

#[test]
fn test_reconcile_groups_and_counts() {
    let dir = sample_dir();
    let manifest = CruxManifestReconciler::new(dir.path(), "global").reconcile().unwrap();

    assert_eq!(manifest.month_keys(), vec!["202412", "202501"]);
    let jan = manifest.month("202501").unwrap();
    assert_eq!((jan.year, jan.month), (2025, 1));
    assert_eq!(jan.total_chunks, 2);
    assert_eq!(jan.chunks[0].origin_count, 2);
    // no trailing newline on the last row still counts it
    assert_eq!(jan.chunks[1].origin_count, 3);
    assert_eq!(jan.total_origins, 5);

    let on_disk: u64 = ["202501_1.csv", "202501_2.csv"]
        .iter()
        .map(|n| fs::metadata(dir.path().join(n)).unwrap().len())
        .sum();
    assert_eq!(jan.total_size_bytes, on_disk);
}

#[test]
fn test_chunks_sorted_numerically() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "202501_1.csv", "origin,rank\na.com,1000\n");
    write(dir.path(), "202501_10.csv", "j.com,1000\n");
    write(dir.path(), "202501_2.csv", "b.com,1000\n");

    let manifest = CruxManifestReconciler::new(dir.path(), "global").reconcile().unwrap();
    let numbers: Vec<u32> = manifest.months["202501"]
        .chunks
        .iter()
        .map(|c| c.chunk_number)
        .collect();
    assert_eq!(numbers, vec![1, 2, 10]);
}

#[test]
fn test_aggregates_and_summary_bounds() {
    let dir = sample_dir();
    let manifest = CruxManifestReconciler::new(dir.path(), "global").reconcile().unwrap();

    for entry in manifest.months.values() {
        let origins: u64 = entry.chunks.iter().map(|c| c.origin_count).sum();
        let size: u64 = entry.chunks.iter().map(|c| c.size_bytes).sum();
        assert_eq!(entry.total_origins, origins);
        assert_eq!(entry.total_size_bytes, size);
    }

    let summary = &manifest.summary;
    let earliest = summary.earliest_month.as_deref().unwrap();
    let latest = summary.latest_month.as_deref().unwrap();
    for key in manifest.months.keys() {
        assert!(earliest <= key.as_str() && key.as_str() <= latest);
    }
    assert_eq!(summary.total_months, 2);
    assert_eq!(
        summary.total_size_bytes,
        manifest.months.values().map(|m| m.total_size_bytes).sum::<u64>()
    );
}

#[test]
fn test_update_is_idempotent() {
    let dir = sample_dir();
    let reconciler = CruxManifestReconciler::new(dir.path(), "global");

    reconciler.update(CruxUpdateMode::Incremental).unwrap();
    let first = fs::read(reconciler.manifest_path()).unwrap();
    reconciler.update(CruxUpdateMode::Regenerate).unwrap();
    let second = fs::read(reconciler.manifest_path()).unwrap();
    assert_eq!(first, second);

    let parsed: CruxDatasetManifest = serde_json::from_slice(&second).unwrap();
    assert_eq!(parsed, reconciler.reconcile().unwrap());
}

#[test]
fn test_update_reflects_removed_artifacts() {
    let dir = sample_dir();
    let reconciler = CruxManifestReconciler::new(dir.path(), "global");
    reconciler.update(CruxUpdateMode::Incremental).unwrap();

    fs::remove_file(dir.path().join("202412_1.csv")).unwrap();
    let manifest = reconciler.update(CruxUpdateMode::Incremental).unwrap();
    assert_eq!(manifest.month_keys(), vec!["202501"]);
    assert_eq!(manifest.summary.earliest_month.as_deref(), Some("202501"));
}

#[test]
fn test_empty_directory_yields_empty_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = CruxManifestReconciler::new(dir.path(), "us").reconcile().unwrap();
    assert!(manifest.months.is_empty());
    assert_eq!(manifest.summary.earliest_month, None);
    assert_eq!(manifest.display_name, "Cached Chrome User Experience Report - us");
}

#[test]
fn test_missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = CruxManifestReconciler::new(dir.path().join("absent"), "us").reconcile();
    assert!(result.is_err());
}

#[test]
fn test_counts_match_chunker_output() {
    let dir = tempfile::tempdir().unwrap();
    let period = CruxPeriod::new(2025, 2).unwrap();
    let rows: Vec<CruxRankedRow> = (0..57)
        .map(|i| CruxRankedRow::new(format!("https://o{}.example", i), 1000))
        .collect();
    let written = CruxRowChunker::new(dir.path())
        .with_config(CruxChunkerConfig::default().target_chunk_bytes(250))
        .split(period, rows)
        .unwrap();

    let manifest = CruxManifestReconciler::new(dir.path(), "global").reconcile().unwrap();
    let entry = &manifest.months["202502"];
    assert_eq!(entry.total_chunks, written.len());
    assert_eq!(entry.total_origins, 57);
    for (record, result) in entry.chunks.iter().zip(&written) {
        assert_eq!(record.filename, result.filename);
        assert_eq!(record.origin_count, result.rows as u64);
        assert_eq!(record.size_bytes, result.size);
    }
}
