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

//! # Client Module
//!
//! Read side of Crux: resolve a dataset and month through the cached
//! metadata, then stream its ranked origins.
//!
//! ## Usage
//!
//! ```rust
//! use crux_cache::client::CruxClient;
//! use crux_cache::config::CruxConfig;
//!
//! let client = CruxClient::new(CruxConfig::default())?;
//! let dataset = client.get_dataset("global", None, Some(1_000))?;
//! for row in &dataset {
//!     let (origin, rank) = row?;
//!     println!("{} {}", rank, origin);
//! }
//! ```

pub mod dataset;

pub use dataset::{validate_max_rank, CruxDataset, CruxRankIter};

use std::fmt;

use crate::cache::{CruxCache, CruxClock, CruxFetcher};
use crate::config::CruxConfig;
use crate::errors::{CruxError, Result};
use crate::record::{CruxDatasetManifest, CruxDatasetSummary};

/// Entry point for listing and reading published datasets.
#[derive(Debug)]
pub struct CruxClient {
    cache: CruxCache,
}

impl CruxClient {
    /// Client over HTTP against `config.base_url`.
    #[cfg(feature = "http")]
    pub fn new(config: CruxConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = crate::cache::CruxHttpFetcher::from_config(&config)?;
        Ok(Self {
            cache: CruxCache::new(config, fetcher),
        })
    }

    /// Client over an arbitrary transport.
    pub fn with_fetcher(config: CruxConfig, fetcher: impl CruxFetcher + 'static) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cache: CruxCache::new(config, fetcher),
        })
    }

    pub fn from_cache(cache: CruxCache) -> Self {
        Self { cache }
    }

    pub fn with_clock(self, clock: impl CruxClock + 'static) -> Self {
        Self {
            cache: self.cache.with_clock(clock),
        }
    }

    pub fn cache(&self) -> &CruxCache {
        &self.cache
    }

    pub fn list_datasets(&self) -> Result<Vec<CruxDatasetSummary>> {
        Ok(self.cache.datasets_index()?.datasets)
    }

    /// Month keys of `dataset_id`, oldest first.
    pub fn list_months(&self, dataset_id: &str) -> Result<Vec<String>> {
        Ok(self.resolve_manifest(dataset_id)?.month_keys())
    }

    /// Resolves one month of a dataset; `None` picks the latest month.
    ///
    /// `max_rank` is checked before anything is fetched.
    pub fn get_dataset(
        &self,
        dataset_id: &str,
        month: Option<&str>,
        max_rank: Option<u64>,
    ) -> Result<CruxDataset<'_>> {
        validate_max_rank(&self.cache.config().valid_ranks, max_rank)?;

        let mut manifest = self.resolve_manifest(dataset_id)?;
        let key = match month {
            Some(key) => key.to_string(),
            None => manifest
                .latest_month()
                .map(str::to_string)
                .ok_or_else(|| CruxError::not_found("Month", "latest", Vec::new()))?,
        };
        let Some(entry) = manifest.months.remove(&key) else {
            return Err(CruxError::not_found("Month", key, manifest.month_keys()));
        };

        CruxDataset::new(&self.cache, dataset_id, key, entry, max_rank)
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear()
    }

    fn resolve_manifest(&self, dataset_id: &str) -> Result<CruxDatasetManifest> {
        let index = self.cache.datasets_index()?;
        if index.get(dataset_id).is_none() {
            return Err(CruxError::not_found("Dataset", dataset_id, index.ids()));
        }
        self.cache.manifest(dataset_id)
    }
}

impl fmt::Display for CruxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CruxClient(cache_dir='{}')", self.cache.cache_dir().display())
    }
}
