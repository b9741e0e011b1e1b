//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Crux.
//! The Crux project belongs to the Dunimd Team.

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use crux_cache::{
    CruxClock, CruxDatasetsIndexReconciler, CruxDirectoryFetcher, CruxFetcher,
    CruxManifestReconciler, CruxUpdateMode, Result,
};

/// Directory fetcher that counts every fetch per relative path.
#[derive(Clone)]
pub struct CountingFetcher {
    inner: CruxDirectoryFetcher,
    calls: Arc<Mutex<Vec<String>>>,
    total: Arc<AtomicUsize>,
}

impl CountingFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: CruxDirectoryFetcher::new(root),
            calls: Arc::new(Mutex::new(Vec::new())),
            total: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn count(&self, rel: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == rel).count()
    }
}

impl CruxFetcher for CountingFetcher {
    fn locate(&self, rel: &str) -> String {
        self.inner.locate(rel)
    }

    fn fetch(&self, rel: &str, out: &mut dyn Write) -> Result<u64> {
        self.total.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(rel.to_string());
        self.inner.fetch(rel, out)
    }
}

/// Clock the test moves by hand.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<SystemTime>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(SystemTime::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl CruxClock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap()
    }
}

/// Writes `files` into `<root>/data/<dataset>/` and rebuilds the manifest
/// and the datasets index, the way a published tree looks.
pub fn publish(root: &Path, dataset: &str, files: &[(&str, &str)]) {
    let dir = root.join("data").join(dataset);
    fs::create_dir_all(&dir).unwrap();
    for (name, content) in files {
        fs::write(dir.join(name), content).unwrap();
    }
    CruxManifestReconciler::new(&dir, dataset)
        .update(CruxUpdateMode::Regenerate)
        .unwrap();
    CruxDatasetsIndexReconciler::new(root.join("data"))
        .update()
        .unwrap();
}

/// The two-chunk month used across the read-side tests.
pub fn publish_sample(root: &Path) {
    publish(
        root,
        "global",
        &[
            ("202501_1.csv", "origin,rank\na.com,500\nb.com,2000\n"),
            ("202501_2.csv", "c.com,6000\n"),
        ],
    );
}
