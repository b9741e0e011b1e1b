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

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::export::write_json_atomic;
use crate::record::{CruxChunkName, CruxChunkRecord, CruxDatasetManifest, CruxMonthEntry, CruxPeriod};

/// Name of the per-dataset manifest file.
pub const MANIFEST_FILENAME: &str = "manifest.json";

const DISPLAY_NAME_PREFIX: &str = "Cached Chrome User Experience Report";

/// How the caller asked for the manifest to be refreshed.
///
/// Both modes rebuild the manifest wholesale from the artifacts on disk; the
/// previous manifest is never read. `Incremental` only reflects that the
/// collector skipped months it already had upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CruxUpdateMode {
    Incremental,
    Regenerate,
}

/// Rebuilds a dataset's `manifest.json` from its chunk artifacts.
#[derive(Clone, Debug)]
pub struct CruxManifestReconciler {
    dataset_dir: PathBuf,
    dataset_name: String,
}

impl CruxManifestReconciler {
    pub fn new(dataset_dir: impl Into<PathBuf>, dataset_name: impl Into<String>) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            dataset_name: dataset_name.into(),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dataset_dir.join(MANIFEST_FILENAME)
    }

    pub fn display_name(&self) -> String {
        format!("{} - {}", DISPLAY_NAME_PREFIX, self.dataset_name)
    }

    /// Groups every chunk artifact in the directory by period.
    ///
    /// Files off the `<YYYYMM>_<n>.csv` grammar are skipped. Every artifact is
    /// re-read to count its rows; chunk 1 has its header line discounted.
    pub fn scan_chunks(&self) -> Result<BTreeMap<CruxPeriod, Vec<CruxChunkRecord>>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dataset_dir)? {
            let entry = entry?;
            let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            entries.push((filename, entry.path()));
        }
        entries.sort();

        let mut months: BTreeMap<CruxPeriod, Vec<CruxChunkRecord>> = BTreeMap::new();
        for (filename, path) in entries {
            let Some(name) = CruxChunkName::parse(&filename) else {
                if filename != MANIFEST_FILENAME {
                    log::debug!("Ignoring {} (not a chunk artifact)", filename);
                }
                continue;
            };
            let metadata = fs::metadata(&path)?;
            if !metadata.is_file() {
                continue;
            }

            let lines = count_lines(&path)?;
            let origin_count = if name.chunk == 1 {
                lines.saturating_sub(1)
            } else {
                lines
            };

            months.entry(name.period).or_default().push(CruxChunkRecord {
                chunk_number: name.chunk,
                filename,
                size_bytes: metadata.len(),
                origin_count,
            });
        }

        for chunks in months.values_mut() {
            chunks.sort_by_key(|c| c.chunk_number);
        }
        Ok(months)
    }

    /// Derives the full manifest from the current directory contents.
    pub fn reconcile(&self) -> Result<CruxDatasetManifest> {
        log::info!("Generating manifest for {}...", self.dataset_dir.display());

        let months: BTreeMap<String, CruxMonthEntry> = self
            .scan_chunks()?
            .into_iter()
            .map(|(period, chunks)| {
                let entry = CruxMonthEntry::from_chunks(period, chunks);
                log::info!(
                    "  {}-{:02}: {} chunks, {:.1} MB, {} origins",
                    entry.year,
                    entry.month,
                    entry.total_chunks,
                    entry.total_size_bytes as f64 / (1024.0 * 1024.0),
                    entry.total_origins
                );
                (period.key(), entry)
            })
            .collect();

        let manifest = CruxDatasetManifest::from_months(self.display_name(), months);
        log::info!(
            "  Total: {} months, {:.2} GB",
            manifest.summary.total_months,
            manifest.summary.total_size_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
        );
        Ok(manifest)
    }

    pub fn save(&self, manifest: &CruxDatasetManifest) -> Result<PathBuf> {
        let path = self.manifest_path();
        write_json_atomic(&path, manifest)?;
        log::info!("  Manifest saved to {}", path.display());
        Ok(path)
    }

    pub fn update(&self, mode: CruxUpdateMode) -> Result<CruxDatasetManifest> {
        match mode {
            CruxUpdateMode::Incremental => log::info!("Updating manifest..."),
            CruxUpdateMode::Regenerate => log::info!("Regenerating manifest from scratch..."),
        }
        let manifest = self.reconcile()?;
        self.save(&manifest)?;
        Ok(manifest)
    }
}

/// Counts newline-delimited lines; a trailing line without `\n` counts too.
pub fn count_lines(path: &Path) -> Result<u64> {
    let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
    let mut newlines = 0u64;
    let mut last = None;
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        newlines += buf.iter().filter(|&&b| b == b'\n').count() as u64;
        last = buf.last().copied();
        let len = buf.len();
        reader.consume(len);
    }
    Ok(match last {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    })
}
