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

use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::errors::{CruxError, Result};
use crate::record::{CruxPeriod, CruxRankedRow};

/// Fallible, lazily produced rows of one period.
pub type CruxRowStream<'a> = Box<dyn Iterator<Item = Result<CruxRankedRow>> + 'a>;

/// Which slice of the upstream rankings a dataset holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CruxDatasetScope {
    Global,
    Country(String),
}

impl CruxDatasetScope {
    /// Country scope; the code is stored lower-cased.
    pub fn country(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CruxError::invalid_argument(format!(
                "country code must be letters, got '{}'",
                code
            )));
        }
        Ok(CruxDatasetScope::Country(code.to_ascii_lowercase()))
    }

    /// Directory and index id of the dataset.
    pub fn dataset_id(&self) -> &str {
        match self {
            CruxDatasetScope::Global => "global",
            CruxDatasetScope::Country(code) => code,
        }
    }
}

impl fmt::Display for CruxDatasetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CruxDatasetScope::Global => write!(f, "global"),
            CruxDatasetScope::Country(code) => write!(f, "country ({})", code.to_ascii_uppercase()),
        }
    }
}

/// Upstream provider of monthly rankings.
///
/// The warehouse query client is one implementation; [`CruxCsvExportSource`]
/// serves exported query results from disk.
pub trait CruxRowSource {
    /// Periods available upstream at or after `start`, ascending.
    fn available_periods(&self, start: CruxPeriod) -> Result<Vec<CruxPeriod>>;

    /// Rows of one period, in upstream rank order.
    fn fetch_period(&self, period: CruxPeriod) -> Result<CruxRowStream<'_>>;
}

/// Reads `<root>/<dataset>/<YYYYMM>.csv` exports with an `origin,rank` header.
#[derive(Clone, Debug)]
pub struct CruxCsvExportSource {
    dir: PathBuf,
}

impl CruxCsvExportSource {
    pub fn new(root: impl AsRef<Path>, scope: &CruxDatasetScope) -> Result<Self> {
        let dir = root.as_ref().join(scope.dataset_id());
        if !dir.is_dir() {
            return Err(CruxError::Io(format!(
                "export directory {} does not exist",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }

    fn export_path(&self, period: CruxPeriod) -> PathBuf {
        self.dir.join(format!("{}.csv", period))
    }
}

impl CruxRowSource for CruxCsvExportSource {
    fn available_periods(&self, start: CruxPeriod) -> Result<Vec<CruxPeriod>> {
        let mut periods = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".csv")) else {
                continue;
            };
            if let Ok(period) = stem.parse::<CruxPeriod>() {
                if period >= start {
                    periods.push(period);
                }
            }
        }
        periods.sort();
        Ok(periods)
    }

    fn fetch_period(&self, period: CruxPeriod) -> Result<CruxRowStream<'_>> {
        let path = self.export_path(period);
        let file = File::open(&path)?;
        log::info!("Fetching {} from {}", period, path.display());

        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        Ok(Box::new(
            reader
                .into_deserialize::<CruxRankedRow>()
                .map(|row| row.map_err(CruxError::from)),
        ))
    }
}
