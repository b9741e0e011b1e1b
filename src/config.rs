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

//! # Crux Configuration
//!
//! Immutable configuration values injected into the cache, client and chunker
//! at construction time. Nothing here is process-global, so tests can build
//! components against local mirrors with their own settings.
//!
//! Configuration can be assembled three ways, and they compose:
//!
//! - builder-style setters on [`CruxConfig::default`]
//! - a YAML or JSON file via [`CruxConfig::from_path`]
//! - environment overrides via [`CruxConfig::apply_env`]

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{CruxError, Result};

/// Default remote base for raw artifact access.
pub const DEFAULT_BASE_URL: &str = "https://raw.githubusercontent.com/lonetis/crux-cache/main";

/// Default local cache root, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = ".crux";

/// One day.
pub const DEFAULT_METADATA_TTL_SECS: u64 = 86_400;

/// Rank thresholds accepted as a ceiling (log10 scale with half steps).
pub const DEFAULT_VALID_RANKS: [u64; 10] = [
    1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000, 5_000_000, 10_000_000, 50_000_000,
];

/// 25 MiB, below common static hosting single-file limits.
pub const TARGET_CHUNK_BYTES: usize = 25 * 1024 * 1024;

const DATASET_PLACEHOLDER: &str = "{dataset}";
const FILENAME_PLACEHOLDER: &str = "{filename}";

/// Read-side configuration: remote layout, cache location and freshness.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CruxConfig {
    /// Base URL every relative artifact path is resolved against.
    pub base_url: String,
    /// Relative path of the datasets index.
    pub datasets_path: String,
    /// Relative path template of a dataset manifest (`{dataset}`).
    pub manifest_path: String,
    /// Relative path template of a chunk artifact (`{dataset}`, `{filename}`).
    pub chunk_path: String,
    /// Local cache root.
    pub cache_dir: PathBuf,
    /// Lifetime of cached metadata artifacts in seconds.
    pub metadata_ttl_secs: u64,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Accepted rank ceilings, ascending.
    pub valid_ranks: Vec<u64>,
}

impl Default for CruxConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            datasets_path: "data/datasets.json".to_string(),
            manifest_path: "data/{dataset}/manifest.json".to_string(),
            chunk_path: "data/{dataset}/{filename}".to_string(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            metadata_ttl_secs: DEFAULT_METADATA_TTL_SECS,
            request_timeout_secs: 30,
            valid_ranks: DEFAULT_VALID_RANKS.to_vec(),
        }
    }
}

impl CruxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn metadata_ttl(mut self, ttl: Duration) -> Self {
        self.metadata_ttl_secs = ttl.as_secs();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    pub fn valid_ranks(mut self, ranks: Vec<u64>) -> Self {
        self.valid_ranks = ranks;
        self
    }

    pub fn metadata_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.metadata_ttl_secs)
    }

    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Relative path of the manifest for `dataset`.
    pub fn manifest_path_for(&self, dataset: &str) -> String {
        self.manifest_path.replace(DATASET_PLACEHOLDER, dataset)
    }

    /// Relative path of a chunk artifact of `dataset`.
    pub fn chunk_path_for(&self, dataset: &str, filename: &str) -> String {
        self.chunk_path
            .replace(DATASET_PLACEHOLDER, dataset)
            .replace(FILENAME_PLACEHOLDER, filename)
    }

    /// Loads a configuration file, picking the parser from the extension.
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let config: CruxConfig = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            other => {
                return Err(CruxError::config(format!(
                    "unsupported config extension '{}' for {}",
                    other,
                    path.display()
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Overlays `CRUX_BASE_URL`, `CRUX_CACHE_DIR` and `CRUX_METADATA_TTL`.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CRUX_BASE_URL") {
            self = self.base_url(&url);
        }
        if let Some(dir) = lookup("CRUX_CACHE_DIR") {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(ttl) = lookup("CRUX_METADATA_TTL") {
            self.metadata_ttl_secs = ttl.trim().parse().map_err(|_| {
                CruxError::config(format!("CRUX_METADATA_TTL must be seconds, got '{}'", ttl))
            })?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.valid_ranks.is_empty() {
            return Err(CruxError::config("valid_ranks cannot be empty"));
        }
        if self.valid_ranks.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CruxError::config("valid_ranks must be strictly ascending"));
        }
        if !self.manifest_path.contains(DATASET_PLACEHOLDER) {
            return Err(CruxError::config("manifest_path must contain {dataset}"));
        }
        if !self.chunk_path.contains(DATASET_PLACEHOLDER)
            || !self.chunk_path.contains(FILENAME_PLACEHOLDER)
        {
            return Err(CruxError::config(
                "chunk_path must contain {dataset} and {filename}",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(CruxError::config("request_timeout_secs must be positive"));
        }
        Ok(())
    }
}

/// Write-side configuration for splitting rows into chunk artifacts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CruxChunkerConfig {
    /// Target serialized size of one chunk.
    pub target_chunk_bytes: usize,
    /// Number of leading rows used to estimate the average row size.
    pub sample_rows: usize,
    /// Rows per chunk when the estimate is degenerate.
    pub fallback_rows_per_chunk: usize,
    /// Header line written at the top of chunk 1 only.
    pub header: String,
}

impl Default for CruxChunkerConfig {
    fn default() -> Self {
        Self {
            target_chunk_bytes: TARGET_CHUNK_BYTES,
            sample_rows: 1000,
            fallback_rows_per_chunk: 1000,
            header: "origin,rank".to_string(),
        }
    }
}

impl CruxChunkerConfig {
    pub fn target_chunk_bytes(mut self, bytes: usize) -> Self {
        self.target_chunk_bytes = bytes;
        self
    }

    pub fn sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }
}
