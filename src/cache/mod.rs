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

//! # Cache Module
//!
//! Local content cache for the published artifacts. The cache root mirrors
//! the remote relative layout:
//!
//! ```text
//! <cache_dir>/data/datasets.json
//! <cache_dir>/data/<dataset>/manifest.json
//! <cache_dir>/data/<dataset>/<YYYYMM>_<n>.csv
//! ```
//!
//! ## Module Components
//!
//! - **Fetcher** ([fetcher.rs](fetcher/index.html)): transports (HTTP, local
//!   mirror directory) and the clock seam
//! - **Store** ([store.rs](store/index.html)): [`CruxCache`] with the two
//!   freshness policies
//!
//! ## Freshness
//!
//! | Artifact | Valid while |
//! |----------|-------------|
//! | metadata (index, manifests) | `now - mtime < metadata_ttl` |
//! | chunk | it exists |
//!
//! A stale metadata artifact is re-downloaded in full. Fetches are blocking
//! and happen on the caller's thread, one at a time.

pub mod fetcher;
pub mod store;

#[cfg(feature = "http")]
pub use fetcher::CruxHttpFetcher;
pub use fetcher::{CruxClock, CruxDirectoryFetcher, CruxFetcher, CruxSystemClock};
pub use store::CruxCache;
