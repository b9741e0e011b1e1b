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

//! # Crux Record Module
//!
//! Core data structures shared by the write side and the read side:
//!
//! - [`CruxRankedRow`]: one `(origin, rank)` row of the popularity dataset
//! - [`CruxPeriod`]: a `YYYYMM` month key
//! - [`CruxChunkName`]: the `<YYYYMM>_<chunk>.csv` artifact filename grammar
//! - [`CruxChunkRecord`], [`CruxMonthEntry`], [`CruxDatasetManifest`]: the
//!   per-dataset manifest
//! - [`CruxDatasetSummary`], [`CruxDatasetsIndex`]: the root datasets index
//!
//! ## JSON Shape
//!
//! The serde field names match the published layout:
//!
//! ```json
//! {
//!   "name": "Cached Chrome User Experience Report - global",
//!   "months": {
//!     "202501": {
//!       "year": 2025, "month": 1,
//!       "chunks": [{"chunk": 1, "filename": "202501_1.csv", "size": 120, "origins": 4}],
//!       "total_chunks": 1, "total_size": 120, "origins": 4
//!     }
//!   },
//!   "summary": {"total_months": 1, "total_size": 120,
//!               "earliest_month": "202501", "latest_month": "202501"}
//! }
//! ```
//!
//! Month keys are zero-padded `YYYYMM` strings, so lexicographic order is
//! chronological order and a `BTreeMap` keeps them sorted on output.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{CruxError, Result};

/// One ranked origin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CruxRankedRow {
    pub origin: String,
    pub rank: u64,
}

impl CruxRankedRow {
    pub fn new(origin: impl Into<String>, rank: u64) -> Self {
        Self {
            origin: origin.into(),
            rank,
        }
    }
}

/// A calendar month, rendered as `YYYYMM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CruxPeriod {
    year: i32,
    month: u32,
}

impl CruxPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(0..=9999).contains(&year) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(CruxError::invalid_argument(format!(
                "invalid period {}-{:02}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Month key used in manifests and filenames.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CruxPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl FromStr for CruxPeriod {
    type Err = CruxError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CruxError::invalid_argument(format!(
                "period must be YYYYMM, got '{}'",
                s
            )));
        }
        let year: i32 = s[..4]
            .parse()
            .map_err(|_| CruxError::invalid_argument(format!("bad year in '{}'", s)))?;
        let month: u32 = s[4..]
            .parse()
            .map_err(|_| CruxError::invalid_argument(format!("bad month in '{}'", s)))?;
        CruxPeriod::new(year, month)
    }
}

fn chunk_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{6})_(\d+)\.csv$").expect("chunk filename pattern is valid")
    })
}

/// Parsed `<YYYYMM>_<chunk>.csv` filename.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CruxChunkName {
    pub period: CruxPeriod,
    pub chunk: u32,
}

impl CruxChunkName {
    pub fn new(period: CruxPeriod, chunk: u32) -> Self {
        Self { period, chunk }
    }

    /// Parses an artifact filename; `None` for anything off-grammar.
    pub fn parse(filename: &str) -> Option<Self> {
        let caps = chunk_name_pattern().captures(filename)?;
        let period: CruxPeriod = caps[1].parse().ok()?;
        let chunk: u32 = caps[2].parse().ok()?;
        if chunk == 0 {
            return None;
        }
        Some(Self { period, chunk })
    }

    pub fn filename(&self) -> String {
        format!("{}_{}.csv", self.period, self.chunk)
    }
}

/// One chunk artifact as listed in a manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CruxChunkRecord {
    #[serde(rename = "chunk")]
    pub chunk_number: u32,
    pub filename: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    #[serde(rename = "origins")]
    pub origin_count: u64,
}

/// All chunks of one month plus their aggregates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CruxMonthEntry {
    pub year: i32,
    pub month: u32,
    #[serde(default)]
    pub chunks: Vec<CruxChunkRecord>,
    #[serde(default)]
    pub total_chunks: usize,
    #[serde(default, rename = "total_size")]
    pub total_size_bytes: u64,
    #[serde(default, rename = "origins")]
    pub total_origins: u64,
}

impl CruxMonthEntry {
    /// Builds an entry, sorting chunks and deriving every aggregate from them.
    pub fn from_chunks(period: CruxPeriod, mut chunks: Vec<CruxChunkRecord>) -> Self {
        chunks.sort_by_key(|c| c.chunk_number);
        Self {
            year: period.year(),
            month: period.month(),
            total_chunks: chunks.len(),
            total_size_bytes: chunks.iter().map(|c| c.size_bytes).sum(),
            total_origins: chunks.iter().map(|c| c.origin_count).sum(),
            chunks,
        }
    }
}

/// Dataset-wide statistics. Month bounds are `None` when there are no months.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CruxManifestSummary {
    pub total_months: usize,
    #[serde(rename = "total_size")]
    pub total_size_bytes: u64,
    pub earliest_month: Option<String>,
    pub latest_month: Option<String>,
}

/// Derived description of every month and chunk of one dataset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CruxDatasetManifest {
    #[serde(rename = "name")]
    pub display_name: String,
    pub months: BTreeMap<String, CruxMonthEntry>,
    pub summary: CruxManifestSummary,
}

impl CruxDatasetManifest {
    /// Assembles a manifest and its summary from month entries.
    pub fn from_months(
        display_name: impl Into<String>,
        months: BTreeMap<String, CruxMonthEntry>,
    ) -> Self {
        let summary = CruxManifestSummary {
            total_months: months.len(),
            total_size_bytes: months.values().map(|m| m.total_size_bytes).sum(),
            earliest_month: months.keys().next().cloned(),
            latest_month: months.keys().next_back().cloned(),
        };
        Self {
            display_name: display_name.into(),
            months,
            summary,
        }
    }

    /// Month keys in chronological order.
    pub fn month_keys(&self) -> Vec<String> {
        self.months.keys().cloned().collect()
    }

    pub fn month(&self, key: &str) -> Option<&CruxMonthEntry> {
        self.months.get(key)
    }

    /// Latest month key present in `months`.
    pub fn latest_month(&self) -> Option<&str> {
        self.months.keys().next_back().map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One row of the datasets index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CruxDatasetSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub total_months: usize,
    #[serde(default)]
    pub earliest_month: Option<String>,
    #[serde(default)]
    pub latest_month: Option<String>,
    #[serde(default)]
    pub latest_origins: Option<u64>,
    #[serde(default, rename = "total_size")]
    pub total_size_bytes: u64,
}

impl CruxDatasetSummary {
    /// Projects a manifest onto its index row.
    ///
    /// `latest_origins` is taken from the month named by `summary.latest_month`
    /// and stays `None` when that month is missing.
    pub fn from_manifest(id: &str, manifest: &CruxDatasetManifest) -> Self {
        let latest_origins = manifest
            .summary
            .latest_month
            .as_deref()
            .and_then(|key| manifest.months.get(key))
            .map(|m| m.total_origins);
        Self::from_parts(id, &manifest.display_name, &manifest.summary, latest_origins)
    }

    /// Index row from a display name and summary; an empty name becomes
    /// `Unknown - <id>`.
    pub fn from_parts(
        id: &str,
        display_name: &str,
        summary: &CruxManifestSummary,
        latest_origins: Option<u64>,
    ) -> Self {
        let name = if display_name.is_empty() {
            format!("Unknown - {}", id)
        } else {
            display_name.to_string()
        };
        Self {
            id: id.to_string(),
            name,
            total_months: summary.total_months,
            earliest_month: summary.earliest_month.clone(),
            latest_month: summary.latest_month.clone(),
            latest_origins,
            total_size_bytes: summary.total_size_bytes,
        }
    }
}

/// Manifest of manifests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CruxDatasetsIndex {
    pub datasets: Vec<CruxDatasetSummary>,
    pub total_datasets: usize,
}

impl CruxDatasetsIndex {
    pub fn new(datasets: Vec<CruxDatasetSummary>) -> Self {
        Self {
            total_datasets: datasets.len(),
            datasets,
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.datasets.iter().map(|d| d.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&CruxDatasetSummary> {
        self.datasets.iter().find(|d| d.id == id)
    }
}
