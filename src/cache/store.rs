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

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::cache::fetcher::{CruxClock, CruxFetcher, CruxSystemClock};
use crate::config::CruxConfig;
use crate::errors::{CruxError, Result};
use crate::record::{CruxDatasetManifest, CruxDatasetsIndex};

/// Local on-disk cache keyed by remote relative path.
///
/// Metadata artifacts are valid while `now - mtime < ttl`. Chunk artifacts
/// are valid as soon as they exist and are never re-fetched.
pub struct CruxCache {
    config: CruxConfig,
    fetcher: Box<dyn CruxFetcher>,
    clock: Box<dyn CruxClock>,
}

impl CruxCache {
    pub fn new(config: CruxConfig, fetcher: impl CruxFetcher + 'static) -> Self {
        Self::with_boxed(config, Box::new(fetcher))
    }

    pub fn with_boxed(config: CruxConfig, fetcher: Box<dyn CruxFetcher>) -> Self {
        Self {
            config,
            fetcher,
            clock: Box::new(CruxSystemClock),
        }
    }

    /// Replaces the clock used for metadata freshness.
    pub fn with_clock(mut self, clock: impl CruxClock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &CruxConfig {
        &self.config
    }

    pub fn cache_dir(&self) -> &Path {
        &self.config.cache_dir
    }

    /// Local path mirroring `rel` under the cache root.
    pub fn local_path(&self, rel: &str) -> Result<PathBuf> {
        let mut path = self.config.cache_dir.clone();
        let mut parts = 0usize;
        for component in Path::new(rel).components() {
            match component {
                Component::Normal(part) => {
                    path.push(part);
                    parts += 1;
                }
                Component::CurDir => {}
                _ => {
                    return Err(CruxError::invalid_argument(format!(
                        "relative path '{}' escapes the cache root",
                        rel
                    )))
                }
            }
        }
        if parts == 0 {
            return Err(CruxError::invalid_argument("relative path is empty"));
        }
        Ok(path)
    }

    /// Whether the cached copy at `path` can be served without fetching.
    pub fn is_fresh(&self, path: &Path, is_metadata: bool) -> bool {
        let Ok(metadata) = fs::metadata(path) else {
            return false;
        };
        if !metadata.is_file() {
            return false;
        }
        if !is_metadata {
            return true;
        }
        let Ok(modified) = metadata.modified() else {
            return false;
        };
        // an mtime ahead of the clock counts as age zero
        let age = self
            .clock
            .now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        age < self.config.metadata_ttl_duration()
    }

    /// Parsed JSON at `rel`, fetched first when missing or stale.
    pub fn get_json<T: DeserializeOwned>(&self, rel: &str, is_metadata: bool) -> Result<T> {
        let path = self.resolve(rel, is_metadata)?;
        let content = fs::read_to_string(&path)
            .map_err(|e| CruxError::corruption(path.display().to_string(), e.to_string()))?;
        serde_json::from_str(&content)
            .map_err(|e| CruxError::corruption(path.display().to_string(), e.to_string()))
    }

    /// Local path of an immutable artifact, downloaded on first use.
    pub fn get_binary_path(&self, rel: &str) -> Result<PathBuf> {
        self.resolve(rel, false)
    }

    pub fn datasets_index(&self) -> Result<CruxDatasetsIndex> {
        let rel = self.config.datasets_path.clone();
        self.get_json(&rel, true)
    }

    pub fn manifest(&self, dataset: &str) -> Result<CruxDatasetManifest> {
        let rel = self.config.manifest_path_for(dataset);
        self.get_json(&rel, true)
    }

    pub fn chunk_path(&self, dataset: &str, filename: &str) -> Result<PathBuf> {
        let rel = self.config.chunk_path_for(dataset, filename);
        self.get_binary_path(&rel)
    }

    /// Deletes the whole cache root, metadata and chunks alike, and
    /// recreates it empty.
    pub fn clear(&self) -> Result<()> {
        let root = &self.config.cache_dir;
        if root.exists() {
            fs::remove_dir_all(root)?;
        }
        fs::create_dir_all(root)?;
        log::info!("Cleared cache at {}", root.display());
        Ok(())
    }

    fn resolve(&self, rel: &str, is_metadata: bool) -> Result<PathBuf> {
        let path = self.local_path(rel)?;
        if self.is_fresh(&path, is_metadata) {
            log::debug!("Cache hit: {}", rel);
        } else {
            self.download(rel, &path)?;
        }
        Ok(path)
    }

    /// Streams `rel` into a sibling `.part` file, then renames it into place.
    fn download(&self, rel: &str, path: &Path) -> Result<()> {
        let url = self.fetcher.locate(rel);
        log::info!("Downloading {}", url);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CruxError::download(&url, e.to_string()))?;
        }
        let part = part_path(path);

        let written = self.write_part(rel, &url, &part).and_then(|bytes| {
            fs::rename(&part, path).map_err(|e| CruxError::download(&url, e.to_string()))?;
            Ok(bytes)
        });
        match written {
            Ok(bytes) => {
                log::debug!("Saved {} bytes to {}", bytes, path.display());
                Ok(())
            }
            Err(err) => {
                let _ = fs::remove_file(&part);
                Err(err)
            }
        }
    }

    fn write_part(&self, rel: &str, url: &str, part: &Path) -> Result<u64> {
        let file = File::create(part).map_err(|e| CruxError::download(url, e.to_string()))?;
        let mut writer = BufWriter::new(file);
        let bytes = self.fetcher.fetch(rel, &mut writer)?;
        writer
            .flush()
            .map_err(|e| CruxError::download(url, e.to_string()))?;
        Ok(bytes)
    }
}

impl std::fmt::Debug for CruxCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CruxCache")
            .field("cache_dir", &self.config.cache_dir)
            .field("metadata_ttl_secs", &self.config.metadata_ttl_secs)
            .finish()
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}
