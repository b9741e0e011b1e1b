//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Crux.
//! The Crux project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Crux Collector
//!
//! Drives one collection run for a single dataset directory:
//!
//! 1. list the periods the [`CruxRowSource`] has at or after the start month
//! 2. in incremental mode, drop periods that already have chunk artifacts
//! 3. for each remaining period, chunk the new rows into a staging directory
//!    and swap them in for the period's old artifacts
//! 4. rebuild `manifest.json` and the parent directory's `datasets.json`
//!
//! A period that fails to fetch or write is logged and counted; it never
//! aborts the run. A manifest-only run skips steps 1 to 3 and needs no source.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CruxChunkerConfig;
use crate::errors::Result;
use crate::export::{
    CruxChunkWriteResult, CruxDatasetsIndexReconciler, CruxManifestReconciler, CruxRowChunker,
    CruxUpdateMode,
};
use crate::ingest::{existing_periods, CruxDatasetScope, CruxRowSource};
use crate::record::{CruxDatasetManifest, CruxDatasetsIndex, CruxPeriod};

/// Options for one collection run.
#[derive(Clone, Debug)]
pub struct CruxCollectOptions {
    /// Dataset directory, e.g. `data/global` or `data/us`.
    pub data_dir: PathBuf,
    pub scope: CruxDatasetScope,
    /// Earliest period to collect.
    pub start: CruxPeriod,
    /// Skip periods that already have artifacts.
    pub incremental: bool,
    /// Only rebuild the manifest and datasets index.
    pub manifest_only: bool,
    /// Ask for a from-scratch manifest. Both modes rebuild fully.
    pub regenerate: bool,
}

impl CruxCollectOptions {
    pub fn new(data_dir: impl Into<PathBuf>, scope: CruxDatasetScope, start: CruxPeriod) -> Self {
        Self {
            data_dir: data_dir.into(),
            scope,
            start,
            incremental: false,
            manifest_only: false,
            regenerate: false,
        }
    }

    pub fn incremental(mut self, enabled: bool) -> Self {
        self.incremental = enabled;
        self
    }

    pub fn manifest_only(mut self, enabled: bool) -> Self {
        self.manifest_only = enabled;
        self
    }

    pub fn regenerate(mut self, enabled: bool) -> Self {
        self.regenerate = enabled;
        self
    }

    /// Root holding `datasets.json`: the dataset directory's parent.
    pub fn data_root(&self) -> PathBuf {
        match self.data_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Outcome of a collection run.
#[derive(Clone, Debug, Default)]
pub struct CruxCollectReport {
    /// Periods the source reported.
    pub available: Vec<CruxPeriod>,
    /// Periods chunked successfully.
    pub processed: Vec<CruxPeriod>,
    /// Periods with no rows upstream.
    pub empty: Vec<CruxPeriod>,
    /// Periods that failed, with the error message.
    pub failed: Vec<(CruxPeriod, String)>,
    pub chunks_written: usize,
    pub manifest: Option<CruxDatasetManifest>,
    pub index: Option<CruxDatasetsIndex>,
}

impl CruxCollectReport {
    /// Whether the source had nothing at or after the start period.
    pub fn nothing_available(&self) -> bool {
        self.available.is_empty() && self.manifest.is_none()
    }

    pub fn changes_made(&self) -> bool {
        self.chunks_written > 0
    }
}

#[derive(Clone, Debug)]
pub struct CruxCollector {
    options: CruxCollectOptions,
    chunker_config: CruxChunkerConfig,
}

impl CruxCollector {
    pub fn new(options: CruxCollectOptions) -> Self {
        Self {
            options,
            chunker_config: CruxChunkerConfig::default(),
        }
    }

    pub fn with_chunker_config(mut self, config: CruxChunkerConfig) -> Self {
        self.chunker_config = config;
        self
    }

    pub fn options(&self) -> &CruxCollectOptions {
        &self.options
    }

    fn dataset_dir(&self) -> &Path {
        &self.options.data_dir
    }

    fn update_mode(&self) -> CruxUpdateMode {
        if self.options.regenerate {
            CruxUpdateMode::Regenerate
        } else {
            CruxUpdateMode::Incremental
        }
    }

    fn manifest_reconciler(&self) -> CruxManifestReconciler {
        CruxManifestReconciler::new(self.dataset_dir(), self.options.scope.dataset_id())
    }

    /// Rebuilds the dataset manifest and the parent datasets index.
    pub fn refresh_manifests(&self) -> Result<CruxCollectReport> {
        fs::create_dir_all(self.dataset_dir())?;
        let manifest = self.manifest_reconciler().update(self.update_mode())?;
        let index = CruxDatasetsIndexReconciler::new(self.options.data_root()).update()?;
        Ok(CruxCollectReport {
            manifest: Some(manifest),
            index: Some(index),
            ..CruxCollectReport::default()
        })
    }

    pub fn run(&self, source: &dyn CruxRowSource) -> Result<CruxCollectReport> {
        if self.options.manifest_only {
            return self.refresh_manifests();
        }

        let dataset_dir = self.dataset_dir();
        fs::create_dir_all(dataset_dir)?;
        log::info!(
            "Collecting {} into {} from {}",
            self.options.scope,
            dataset_dir.display(),
            self.options.start
        );

        let available = source.available_periods(self.options.start)?;
        if available.is_empty() {
            log::warn!("No periods available upstream");
            return Ok(CruxCollectReport::default());
        }
        log::info!("  Found {} available months", available.len());

        let mut to_process = available.clone();
        if self.options.incremental {
            let existing = existing_periods(dataset_dir)?;
            to_process.retain(|p| !existing.contains(p));
            log::info!("  Already have {} months", existing.len());
            log::info!("  Will download {} new months", to_process.len());
        }

        let mut report = CruxCollectReport {
            available,
            ..CruxCollectReport::default()
        };

        for period in to_process {
            match self.collect_period(source, period) {
                Ok(0) => {
                    log::warn!("  No data for {}, skipping", period);
                    report.empty.push(period);
                }
                Ok(chunks) => {
                    report.chunks_written += chunks;
                    report.processed.push(period);
                }
                Err(err) => {
                    log::error!("  Error processing {}: {}", period, err);
                    report.failed.push((period, err.to_string()));
                }
            }
        }

        let refreshed = self.refresh_manifests()?;
        report.manifest = refreshed.manifest;
        report.index = refreshed.index;

        if report.changes_made() {
            log::info!("Data update completed successfully");
        } else {
            log::warn!("No changes made");
        }
        Ok(report)
    }

    /// Chunks one period, returning the number of chunks written.
    ///
    /// New chunks are written to a staging directory first. The period's
    /// published artifacts are replaced only once the whole stream has been
    /// chunked, so an empty or failing upstream leaves them untouched.
    fn collect_period(&self, source: &dyn CruxRowSource, period: CruxPeriod) -> Result<usize> {
        let rows = source.fetch_period(period)?;
        let staging = self.staging_dir(period);
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }

        let staged = CruxRowChunker::new(&staging)
            .with_config(self.chunker_config.clone())
            .try_split(period, rows);
        let outcome = match staged {
            Ok(chunks) if chunks.is_empty() => Ok(0),
            Ok(chunks) => self.promote(&staging, period, &chunks),
            Err(err) => Err(err),
        };

        if staging.exists() {
            if let Err(err) = fs::remove_dir_all(&staging) {
                log::warn!("  Could not remove {}: {}", staging.display(), err);
            }
        }
        outcome
    }

    fn staging_dir(&self, period: CruxPeriod) -> PathBuf {
        self.dataset_dir().join(format!(".{}.staging", period))
    }

    /// Swaps the staged chunks of `period` in for the published ones.
    fn promote(
        &self,
        staging: &Path,
        period: CruxPeriod,
        chunks: &[CruxChunkWriteResult],
    ) -> Result<usize> {
        let dataset_dir = self.dataset_dir();
        let removed = CruxRowChunker::new(dataset_dir).clear_period(period)?;
        if removed > 0 {
            log::info!("  Removed {} stale artifacts of {}", removed, period);
        }
        for chunk in chunks {
            fs::rename(staging.join(&chunk.filename), dataset_dir.join(&chunk.filename))?;
        }
        Ok(chunks.len())
    }
}
