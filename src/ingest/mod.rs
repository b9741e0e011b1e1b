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

//! # Data Ingestion Module
//!
//! This module covers where monthly rankings come from before they are
//! chunked, and what a dataset directory already holds.
//!
//! ## Module Components
//!
//! - **Source** ([source.rs](source/index.html)): the [`CruxRowSource`] seam,
//!   dataset scopes, and a CSV export implementation
//!
//! ## Existing Periods
//!
//! [`existing_periods`] lists the months that already have chunk artifacts,
//! which is how incremental collection decides what to skip.

pub mod source;

pub use source::{CruxCsvExportSource, CruxDatasetScope, CruxRowSource, CruxRowStream};

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::errors::Result;
use crate::record::{CruxChunkName, CruxPeriod};

/// Periods with at least one chunk artifact in `dataset_dir`.
///
/// A missing directory holds nothing.
pub fn existing_periods(dataset_dir: impl AsRef<Path>) -> Result<BTreeSet<CruxPeriod>> {
    let dir = dataset_dir.as_ref();
    let mut periods = BTreeSet::new();
    if !dir.exists() {
        return Ok(periods);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str().and_then(CruxChunkName::parse) {
            periods.insert(name.period);
        }
    }
    Ok(periods)
}
