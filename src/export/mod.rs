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

//! # Data Export Module
//!
//! This module holds the write side of Crux: turning one month of ranked rows
//! into chunk artifacts, and deriving the manifests that describe them.
//!
//! ## Module Components
//!
//! - **Chunker** ([chunker.rs](chunker/index.html)): Estimate-then-split of a row
//!   stream into `<YYYYMM>_<n>.csv` artifacts
//! - **Manifest** ([manifest.rs](manifest/index.html)): Scan-then-reconcile of one
//!   dataset directory into `manifest.json`
//! - **Index** ([index.rs](index/index.html)): Scan of a data root into
//!   `datasets.json`
//!
//! ## Layout On Disk
//!
//! ```text
//! data/datasets.json
//! data/<dataset>/manifest.json
//! data/<dataset>/<YYYYMM>_<n>.csv
//! ```
//!
//! ## Usage Patterns
//!
//! ```rust
//! use crux_cache::export::{CruxRowChunker, CruxManifestReconciler, CruxDatasetsIndexReconciler, CruxUpdateMode};
//!
//! let chunks = CruxRowChunker::new("data/global").split(period, rows)?;
//! CruxManifestReconciler::new("data/global", "global").update(CruxUpdateMode::Regenerate)?;
//! CruxDatasetsIndexReconciler::new("data").update()?;
//! ```
//!
//! Manifests are always rebuilt from the artifacts, so running the
//! reconcilers twice on an unchanged tree writes identical bytes.

pub mod chunker;
pub mod index;
pub mod manifest;

pub use chunker::{CruxChunkPlan, CruxChunkWriteResult, CruxRowChunker};
pub use index::{CruxDatasetsIndexReconciler, DATASETS_INDEX_FILENAME};
pub use manifest::{count_lines, CruxManifestReconciler, CruxUpdateMode, MANIFEST_FILENAME};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::errors::Result;

/// Writes pretty JSON next to `path` and renames it into place.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    let temp = temp_path(path);
    if let Err(err) = fs::write(&temp, json.as_bytes()) {
        let _ = fs::remove_file(&temp);
        return Err(err.into());
    }
    fs::rename(&temp, path)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output");
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(".{}.tmp", name))
}
