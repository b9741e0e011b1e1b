//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Crux.
//! The Crux project belongs to the Dunimd Team.

#[path = "../common/mod.rs"]
mod common;

use std::fs;

use common::{publish, publish_sample, CountingFetcher};
use crux_cache::{CruxCache, CruxClient, CruxConfig, CruxError, CruxRankIter, Result};

fn client_over(remote: &std::path::Path, local: &std::path::Path) -> (CruxClient, CountingFetcher) {
    let fetcher = CountingFetcher::new(remote);
    let config = CruxConfig::default().cache_dir(local);
    (CruxClient::with_fetcher(config, fetcher.clone()).unwrap(), fetcher)
}

fn pairs(items: &[(&str, i64)]) -> Vec<(String, i64)> {
    items.iter().map(|(o, r)| (o.to_string(), *r)).collect()
}

#[test]
fn test_rank_ceiling_is_inclusive() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish_sample(remote.path());
    let (client, _) = client_over(remote.path(), local.path());

    let dataset = client.get_dataset("global", Some("202501"), Some(1_000)).unwrap();
    let rows: Vec<(String, i64)> = dataset.iter().collect::<Result<_>>().unwrap();
    assert_eq!(rows, pairs(&[("a.com", 500)]));
}

#[test]
fn test_no_ceiling_yields_all_rows_in_chunk_order() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish_sample(remote.path());
    let (client, _) = client_over(remote.path(), local.path());

    let dataset = client.get_dataset("global", Some("202501"), None).unwrap();
    let rows: Vec<(String, i64)> = (&dataset).into_iter().collect::<Result<_>>().unwrap();
    assert_eq!(
        rows,
        pairs(&[("a.com", 500), ("b.com", 2000), ("c.com", 6000)])
    );
}

#[test]
fn test_ceiling_at_exact_rank_includes_it() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish(
        remote.path(),
        "global",
        &[("202501_1.csv", "origin,rank\na.com,1000\nb.com,5000\nc.com,10000\n")],
    );
    let (client, _) = client_over(remote.path(), local.path());

    let dataset = client.get_dataset("global", None, Some(5_000)).unwrap();
    let rows: Vec<(String, i64)> = dataset.iter().collect::<Result<_>>().unwrap();
    assert_eq!(rows, pairs(&[("a.com", 1000), ("b.com", 5000)]));
}

#[test]
fn test_malformed_rows_are_skipped() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish(
        remote.path(),
        "global",
        &[
            (
                "202501_1.csv",
                "origin,rank\na.com,1000\nd.com,N/A\nlonely\ne.com,-5\n\nf.com,5000,extra\n",
            ),
            ("202501_2.csv", "g.com,10000\n"),
        ],
    );
    let (client, _) = client_over(remote.path(), local.path());

    let dataset = client.get_dataset("global", None, None).unwrap();
    let rows: Vec<(String, i64)> = dataset.iter().collect::<Result<_>>().unwrap();
    assert_eq!(
        rows,
        pairs(&[("a.com", 1000), ("e.com", -5), ("f.com", 5000), ("g.com", 10000)])
    );
}

#[test]
fn test_origin_is_yielded_verbatim() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish(
        remote.path(),
        "global",
        &[("202501_1.csv", "origin,rank
 https://a.example , 1000 \n")],
    );
    let (client, _) = client_over(remote.path(), local.path());

    let dataset = client.get_dataset("global", None, Some(1_000)).unwrap();
    let rows: Vec<(String, i64)> = dataset.iter().collect::<Result<_>>().unwrap();
    assert_eq!(rows, pairs(&[(" https://a.example ", 1000)]));
}

#[test]
fn test_header_is_only_skipped_in_first_chunk() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    // a later chunk whose first row looks like data must not lose it
    publish(
        remote.path(),
        "global",
        &[
            ("202501_1.csv", "origin,rank\na.com,1000\n"),
            ("202501_2.csv", "b.com,1000\nc.com,1000\n"),
        ],
    );
    let (client, _) = client_over(remote.path(), local.path());

    let dataset = client.get_dataset("global", None, None).unwrap();
    assert_eq!(dataset.iter().count(), 3);
}

#[test]
fn test_len_reports_unfiltered_total() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish_sample(remote.path());
    let (client, _) = client_over(remote.path(), local.path());

    let dataset = client.get_dataset("global", None, Some(1_000)).unwrap();
    assert_eq!(dataset.len(), 3);
    assert!(!dataset.is_empty());
    assert_eq!(dataset.iter().count(), 1);
}

#[test]
fn test_iteration_is_lazy_and_restartable() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish_sample(remote.path());
    let (client, fetcher) = client_over(remote.path(), local.path());

    let dataset = client.get_dataset("global", None, None).unwrap();
    assert_eq!(fetcher.count("data/global/202501_1.csv"), 0);

    let first = dataset.iter().next().unwrap().unwrap();
    assert_eq!(first, ("a.com".to_string(), 500));
    assert_eq!(fetcher.count("data/global/202501_1.csv"), 1);
    assert_eq!(fetcher.count("data/global/202501_2.csv"), 0);

    let all: Vec<_> = dataset.iter().collect::<Result<_>>().unwrap();
    let again: Vec<_> = dataset.iter().collect::<Result<_>>().unwrap();
    assert_eq!(all, again);
    assert_eq!(fetcher.count("data/global/202501_1.csv"), 1);
    assert_eq!(fetcher.count("data/global/202501_2.csv"), 1);
}

#[test]
fn test_missing_chunk_surfaces_once_then_stops() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish_sample(remote.path());
    fs::remove_file(remote.path().join("data/global/202501_2.csv")).unwrap();
    let (client, _) = client_over(remote.path(), local.path());

    let dataset = client.get_dataset("global", None, None).unwrap();
    let mut iter = dataset.iter();
    assert!(iter.next().unwrap().is_ok());
    assert!(iter.next().unwrap().is_ok());
    assert!(matches!(iter.next(), Some(Err(CruxError::Download { .. }))));
    assert!(iter.next().is_none());
    assert!(iter.next().is_none());
}

#[test]
fn test_rank_iter_rejects_unlisted_ceiling() {
    let local = tempfile::tempdir().unwrap();
    let cache = CruxCache::new(
        CruxConfig::default().cache_dir(local.path()),
        CountingFetcher::new(local.path()),
    );
    let result = CruxRankIter::new(&cache, "global", &[], Some(750));
    assert!(matches!(result, Err(CruxError::InvalidArgument { .. })));
}

#[test]
fn test_display_mentions_month_and_ceiling() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish_sample(remote.path());
    let (client, _) = client_over(remote.path(), local.path());

    let dataset = client.get_dataset("global", None, Some(10_000)).unwrap();
    let shown = dataset.to_string();
    assert!(shown.contains("202501"), "{}", shown);
    assert!(shown.contains("max_rank=10000"), "{}", shown);
}
