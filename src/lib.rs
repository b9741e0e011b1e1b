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

//! # Crux Core Library
//!
//! Crux redistributes the Chrome User Experience Report popularity rankings
//! as static files. The write side turns each month of `(origin, rank)` rows
//! into size-bounded CSV chunks and derives JSON manifests from whatever
//! chunks are on disk. The read side resolves those manifests through a local
//! cache and streams a month back lazily, optionally capped at a rank ceiling.
//!
//! ## Module Overview
//!
//! - **errors**: `CruxError` and the crate `Result`
//! - **config**: Injected configuration for the cache, client and chunker
//! - **record**: Rows, periods, chunk names, manifests and the datasets index
//! - **export**: Row chunker, manifest reconciler, datasets index reconciler
//! - **ingest**: Upstream row sources and the existing-period scan
//! - **collector**: One collection run over a dataset directory
//! - **cache**: Local content cache with metadata TTL and forever-cached chunks
//! - **client**: Dataset and month resolution, lazy ranked iteration
//! - **logging**: `log` backend with text/JSON console and file output
//!
//! ## Feature Flags
//!
//! - `http` (default): blocking HTTPS transport for the remote cache
//!
//! ## Quick Start
//!
//! ```rust
//! use crux_cache::{CruxClient, CruxConfig};
//!
//! let client = CruxClient::new(CruxConfig::default())?;
//! for summary in client.list_datasets()? {
//!     println!("{} ({} months)", summary.id, summary.total_months);
//! }
//!
//! let dataset = client.get_dataset("global", Some("202501"), Some(10_000))?;
//! println!("{}", dataset);
//! for row in &dataset {
//!     let (origin, rank) = row?;
//!     println!("{},{}", origin, rank);
//! }
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, CruxError>`. Malformed data rows and
//! broken manifests met while building the datasets index are skipped where
//! they occur; every other failure reaches the caller.

pub mod errors;
pub mod config;
pub mod record;

pub mod export;
pub mod ingest;
pub mod collector;

pub mod cache;
pub mod client;

pub mod logging;

pub use errors::{CruxError, Result};
pub use config::{CruxChunkerConfig, CruxConfig, DEFAULT_VALID_RANKS, TARGET_CHUNK_BYTES};
pub use record::{
    CruxChunkName, CruxChunkRecord, CruxDatasetManifest, CruxDatasetSummary, CruxDatasetsIndex,
    CruxManifestSummary, CruxMonthEntry, CruxPeriod, CruxRankedRow,
};

pub use export::{
    CruxChunkPlan, CruxChunkWriteResult, CruxDatasetsIndexReconciler, CruxManifestReconciler,
    CruxRowChunker, CruxUpdateMode,
};
pub use ingest::{existing_periods, CruxCsvExportSource, CruxDatasetScope, CruxRowSource};
pub use collector::{CruxCollectOptions, CruxCollectReport, CruxCollector};

#[cfg(feature = "http")]
pub use cache::CruxHttpFetcher;
pub use cache::{CruxCache, CruxClock, CruxDirectoryFetcher, CruxFetcher, CruxSystemClock};
pub use client::{CruxClient, CruxDataset, CruxRankIter};

pub use logging::{CruxLogConfig, CruxLogConfigBuilder, CruxLogger};
