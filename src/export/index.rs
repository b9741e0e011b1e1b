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

//! # Datasets Index
//!
//! Builds `datasets.json`, the manifest of manifests, from a root directory
//! whose subdirectories each hold one dataset.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::Result;
use crate::export::manifest::MANIFEST_FILENAME;
use crate::export::write_json_atomic;
use crate::record::{CruxDatasetSummary, CruxDatasetsIndex, CruxManifestSummary};

/// Name of the root index file.
pub const DATASETS_INDEX_FILENAME: &str = "datasets.json";

/// The parts of a manifest an index row is built from. Month entries stay
/// untyped so one odd entry cannot drop the whole dataset.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CruxManifestHead {
    name: String,
    months: Map<String, Value>,
    summary: CruxManifestSummary,
}

impl CruxManifestHead {
    fn into_summary(self, id: &str) -> CruxDatasetSummary {
        let latest_origins = self
            .summary
            .latest_month
            .as_deref()
            .and_then(|key| self.months.get(key))
            .and_then(|month| month.get("origins"))
            .and_then(Value::as_u64);
        CruxDatasetSummary::from_parts(id, &self.name, &self.summary, latest_origins)
    }
}

#[derive(Clone, Debug)]
pub struct CruxDatasetsIndexReconciler {
    root_dir: PathBuf,
}

impl CruxDatasetsIndexReconciler {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.root_dir.join(DATASETS_INDEX_FILENAME)
    }

    /// Summarises every subdirectory that holds a readable manifest.
    ///
    /// Subdirectories are visited in name order. Missing manifests are skipped
    /// silently, unreadable or unparsable ones with a warning. Only a failure
    /// to list the root itself is an error.
    pub fn reconcile(&self) -> Result<CruxDatasetsIndex> {
        log::info!("Generating datasets manifest...");

        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();

        let mut datasets = Vec::new();
        for dir in dirs {
            let Some(id) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            let manifest_path = dir.join(MANIFEST_FILENAME);
            if !manifest_path.is_file() {
                continue;
            }

            let parsed = fs::read_to_string(&manifest_path)
                .map_err(|e| e.to_string())
                .and_then(|content| {
                    serde_json::from_str::<CruxManifestHead>(&content).map_err(|e| e.to_string())
                });

            match parsed {
                Ok(head) => {
                    let summary = head.into_summary(&id);
                    log::info!("  {}: {}", summary.id, summary.name);
                    datasets.push(summary);
                }
                Err(err) => {
                    log::warn!("  Skipping {}: invalid manifest ({})", id, err);
                }
            }
        }

        if datasets.is_empty() {
            log::warn!("  No datasets found");
        }
        Ok(CruxDatasetsIndex::new(datasets))
    }

    pub fn save(&self, index: &CruxDatasetsIndex) -> Result<PathBuf> {
        let path = self.index_path();
        write_json_atomic(&path, index)?;
        log::info!("  Datasets manifest saved to {}", path.display());
        Ok(path)
    }

    pub fn update(&self) -> Result<CruxDatasetsIndex> {
        let index = self.reconcile()?;
        self.save(&index)?;
        Ok(index)
    }
}
