//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Crux.
//! The Crux project belongs to the Dunimd Team.

#[path = "../common/mod.rs"]
mod common;

use std::path::Path;
use std::time::Duration;

use common::{publish, publish_sample, CountingFetcher, ManualClock};
use crux_cache::{CruxClient, CruxConfig, CruxError};

fn client_over(remote: &Path, local: &Path) -> (CruxClient, CountingFetcher) {
    let fetcher = CountingFetcher::new(remote);
    let config = CruxConfig::default().cache_dir(local.join("cache"));
    (CruxClient::with_fetcher(config, fetcher.clone()).unwrap(), fetcher)
}

#[test]
fn test_invalid_ceiling_fails_before_any_fetch() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish_sample(remote.path());
    let (client, fetcher) = client_over(remote.path(), local.path());

    let err = client.get_dataset("global", None, Some(750)).unwrap_err();
    assert!(matches!(err, CruxError::InvalidArgument { .. }), "{:?}", err);
    assert_eq!(fetcher.total(), 0);
}

#[test]
fn test_unknown_dataset_lists_known_ids() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish_sample(remote.path());
    publish(remote.path(), "us", &[("202501_1.csv", "origin,rank\na.com,1000\n")]);
    let (client, _) = client_over(remote.path(), local.path());

    let err = client.get_dataset("xx", None, None).unwrap_err();
    match &err {
        CruxError::NotFound { resource, requested, available } => {
            assert_eq!(resource, "Dataset");
            assert_eq!(requested, "xx");
            assert_eq!(available, &vec!["global".to_string(), "us".to_string()]);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.to_string().contains("global, us"));

    assert!(matches!(
        client.list_months("xx"),
        Err(CruxError::NotFound { .. })
    ));
}

#[test]
fn test_unknown_month_lists_known_months() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish(
        remote.path(),
        "global",
        &[
            ("202412_1.csv", "origin,rank\na.com,1000\n"),
            ("202501_1.csv", "origin,rank\na.com,1000\n"),
        ],
    );
    let (client, _) = client_over(remote.path(), local.path());

    let err = client.get_dataset("global", Some("209912"), None).unwrap_err();
    assert_eq!(err.available(), ["202412".to_string(), "202501".to_string()]);
}

#[test]
fn test_default_month_is_latest() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish(
        remote.path(),
        "global",
        &[
            ("202501_1.csv", "origin,rank\nold.com,1000\n"),
            ("202503_1.csv", "origin,rank\nnew.com,1000\n"),
        ],
    );
    let (client, _) = client_over(remote.path(), local.path());

    let dataset = client.get_dataset("global", None, None).unwrap();
    assert_eq!(dataset.month(), "202503");
    assert_eq!(dataset.dataset_id(), "global");
}

#[test]
fn test_dataset_without_months_is_not_found() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish(remote.path(), "empty", &[]);
    let (client, _) = client_over(remote.path(), local.path());

    let err = client.get_dataset("empty", None, None).unwrap_err();
    assert!(matches!(err, CruxError::NotFound { .. }));
    assert!(client.list_months("empty").unwrap().is_empty());
}

#[test]
fn test_list_datasets_and_months() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish(
        remote.path(),
        "global",
        &[
            ("202503_1.csv", "origin,rank\na.com,1000\n"),
            ("202412_1.csv", "origin,rank\na.com,1000\n"),
            ("202501_1.csv", "origin,rank\na.com,1000\n"),
        ],
    );
    let (client, _) = client_over(remote.path(), local.path());

    let datasets = client.list_datasets().unwrap();
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].latest_origins, Some(1));
    assert_eq!(
        client.list_months("global").unwrap(),
        vec!["202412", "202501", "202503"]
    );
}

#[test]
fn test_metadata_is_reused_within_ttl() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish_sample(remote.path());
    let clock = ManualClock::new();
    let (client, fetcher) = client_over(remote.path(), local.path());
    let client = client.with_clock(clock.clone());

    client.get_dataset("global", None, None).unwrap();
    client.get_dataset("global", None, None).unwrap();
    assert_eq!(fetcher.count("data/datasets.json"), 1);
    assert_eq!(fetcher.count("data/global/manifest.json"), 1);

    clock.advance(Duration::from_secs(2 * 86_400));
    client.list_months("global").unwrap();
    assert_eq!(fetcher.count("data/datasets.json"), 2);
    assert_eq!(fetcher.count("data/global/manifest.json"), 2);
}

#[test]
fn test_clear_cache_and_display() {
    let remote = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    publish_sample(remote.path());
    let (client, fetcher) = client_over(remote.path(), local.path());

    client.list_datasets().unwrap();
    client.clear_cache().unwrap();
    client.list_datasets().unwrap();
    assert_eq!(fetcher.count("data/datasets.json"), 2);

    assert!(client.to_string().contains("cache"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let local = tempfile::tempdir().unwrap();
    let config = CruxConfig::default().valid_ranks(Vec::new());
    let result = CruxClient::with_fetcher(config, CountingFetcher::new(local.path()));
    assert!(matches!(result, Err(CruxError::Config { .. })));
}
