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

//! # Dataset Streaming
//!
//! [`CruxDataset`] is one resolved `(dataset, month, max_rank)` read request.
//! Iterating it pulls chunks through the cache one at a time, in chunk order,
//! and yields `(origin, rank)` pairs without holding more than one chunk
//! reader open.
//!
//! ## Row Handling
//!
//! - The header line is skipped in the first chunk of the month only.
//! - Rows with fewer than two fields, or whose rank is not an integer, are
//!   skipped silently. The origin field is passed through as written.
//! - `max_rank` is an inclusive ceiling: a row passes when `rank <= max_rank`.
//!
//! Download failures and unreadable cached chunks are yielded once as an
//! `Err`, after which the iterator is exhausted.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::iter::FusedIterator;
use std::path::PathBuf;
use std::slice;

use crate::cache::CruxCache;
use crate::errors::{CruxError, Result};
use crate::record::{CruxChunkRecord, CruxMonthEntry};

type CruxChunkRecords = csv::StringRecordsIntoIter<BufReader<File>>;

/// Checks a rank ceiling against the accepted thresholds.
pub fn validate_max_rank(valid_ranks: &[u64], max_rank: Option<u64>) -> Result<()> {
    match max_rank {
        Some(rank) if !valid_ranks.contains(&rank) => Err(CruxError::invalid_argument(format!(
            "max_rank must be one of {:?}, got {}",
            valid_ranks, rank
        ))),
        _ => Ok(()),
    }
}

/// One month of one dataset, optionally capped at a rank ceiling.
pub struct CruxDataset<'c> {
    cache: &'c CruxCache,
    dataset_id: String,
    month: String,
    entry: CruxMonthEntry,
    max_rank: Option<u64>,
}

impl<'c> CruxDataset<'c> {
    pub fn new(
        cache: &'c CruxCache,
        dataset_id: impl Into<String>,
        month: impl Into<String>,
        mut entry: CruxMonthEntry,
        max_rank: Option<u64>,
    ) -> Result<Self> {
        validate_max_rank(&cache.config().valid_ranks, max_rank)?;
        entry.chunks.sort_by_key(|c| c.chunk_number);
        Ok(Self {
            cache,
            dataset_id: dataset_id.into(),
            month: month.into(),
            entry,
            max_rank,
        })
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn max_rank(&self) -> Option<u64> {
        self.max_rank
    }

    pub fn entry(&self) -> &CruxMonthEntry {
        &self.entry
    }

    pub fn chunks(&self) -> &[CruxChunkRecord] {
        &self.entry.chunks
    }

    /// Origin count of the whole month from the manifest.
    ///
    /// This ignores `max_rank`; counting the filtered rows means iterating.
    pub fn len(&self) -> u64 {
        self.entry.total_origins
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts a fresh pass over the month. Earlier passes are unaffected.
    pub fn iter(&self) -> CruxRankIter<'_> {
        CruxRankIter::unchecked(self.cache, &self.dataset_id, &self.entry.chunks, self.max_rank)
    }
}

impl<'a, 'c> IntoIterator for &'a CruxDataset<'c> {
    type Item = Result<(String, i64)>;
    type IntoIter = CruxRankIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for CruxDataset<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CruxDataset(dataset='{}', month='{}', origins={}",
            self.dataset_id, self.month, self.entry.total_origins
        )?;
        if let Some(rank) = self.max_rank {
            write!(f, ", max_rank={}", rank)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for CruxDataset<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CruxDataset")
            .field("dataset_id", &self.dataset_id)
            .field("month", &self.month)
            .field("chunks", &self.entry.chunks.len())
            .field("max_rank", &self.max_rank)
            .finish()
    }
}

/// Pull-based stream of `(origin, rank)` pairs across a month's chunks.
pub struct CruxRankIter<'a> {
    cache: &'a CruxCache,
    dataset_id: &'a str,
    chunks: slice::Iter<'a, CruxChunkRecord>,
    max_rank: Option<u64>,
    current: Option<CruxChunkRecords>,
    current_path: Option<PathBuf>,
    opened: usize,
    skip_next: bool,
    finished: bool,
}

impl<'a> CruxRankIter<'a> {
    /// Builds an iterator over `chunks`, which must be in chunk order.
    pub fn new(
        cache: &'a CruxCache,
        dataset_id: &'a str,
        chunks: &'a [CruxChunkRecord],
        max_rank: Option<u64>,
    ) -> Result<Self> {
        validate_max_rank(&cache.config().valid_ranks, max_rank)?;
        Ok(Self::unchecked(cache, dataset_id, chunks, max_rank))
    }

    fn unchecked(
        cache: &'a CruxCache,
        dataset_id: &'a str,
        chunks: &'a [CruxChunkRecord],
        max_rank: Option<u64>,
    ) -> Self {
        Self {
            cache,
            dataset_id,
            chunks: chunks.iter(),
            max_rank,
            current: None,
            current_path: None,
            opened: 0,
            skip_next: false,
            finished: false,
        }
    }

    fn open(&mut self, chunk: &CruxChunkRecord) -> Result<CruxChunkRecords> {
        let path = self.cache.chunk_path(self.dataset_id, &chunk.filename)?;
        let file = File::open(&path)
            .map_err(|e| CruxError::corruption(path.display().to_string(), e.to_string()))?;
        log::debug!("Streaming {} ({} origins)", chunk.filename, chunk.origin_count);

        self.skip_next = self.opened == 0;
        self.opened += 1;
        self.current_path = Some(path);
        Ok(csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(BufReader::new(file))
            .into_records())
    }

    fn parse(&self, record: &csv::StringRecord) -> Option<(String, i64)> {
        if record.len() < 2 {
            return None;
        }
        let rank: i64 = record.get(1)?.trim().parse().ok()?;
        if self
            .max_rank
            .is_some_and(|max| i128::from(rank) > i128::from(max))
        {
            return None;
        }
        Some((record.get(0)?.to_string(), rank))
    }

    fn fail(&mut self, err: CruxError) -> Option<Result<(String, i64)>> {
        self.finished = true;
        self.current = None;
        self.current_path = None;
        Some(Err(err))
    }
}

impl Iterator for CruxRankIter<'_> {
    type Item = Result<(String, i64)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            let Some(records) = self.current.as_mut() else {
                let Some(chunk) = self.chunks.next() else {
                    self.finished = true;
                    return None;
                };
                match self.open(chunk) {
                    Ok(records) => self.current = Some(records),
                    Err(err) => return self.fail(err),
                }
                continue;
            };

            match records.next() {
                None => {
                    self.current = None;
                    self.current_path = None;
                }
                Some(_) if self.skip_next => self.skip_next = false,
                Some(Ok(record)) => {
                    if let Some(pair) = self.parse(&record) {
                        return Some(Ok(pair));
                    }
                }
                Some(Err(err)) if err.is_io_error() => {
                    let path = match &self.current_path {
                        Some(path) => path.display().to_string(),
                        None => self.dataset_id.to_string(),
                    };
                    return self.fail(CruxError::corruption(path, err.to_string()));
                }
                Some(Err(err)) => log::debug!("Skipping unreadable row: {}", err),
            }
        }
    }
}

impl FusedIterator for CruxRankIter<'_> {}
