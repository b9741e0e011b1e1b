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

//! # Row Chunker
//!
//! Splits one month of ranked rows into consecutively numbered CSV artifacts
//! of roughly [`TARGET_CHUNK_BYTES`](crate::config::TARGET_CHUNK_BYTES) each.
//!
//! The row size is estimated once from a leading sample, so the byte bound is
//! a target rather than a guarantee: widely varying origin lengths skew the
//! estimate and no rebalancing pass follows. Rows are streamed through, only
//! the sample is held in memory.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::CruxChunkerConfig;
use crate::errors::{CruxError, Result};
use crate::record::{CruxChunkName, CruxPeriod, CruxRankedRow};

/// Metadata of one written chunk artifact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CruxChunkWriteResult {
    pub chunk: u32,
    pub filename: String,
    pub size: u64,
    pub rows: usize,
    /// Offset of the first row in the input stream.
    pub start_row: usize,
    /// Offset one past the last row.
    pub end_row: usize,
}

/// Outcome of the sampling step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CruxChunkPlan {
    pub avg_bytes_per_row: f64,
    pub rows_per_chunk: usize,
}

struct OpenChunk {
    writer: csv::Writer<File>,
    path: PathBuf,
    filename: String,
    chunk: u32,
    start_row: usize,
    rows: usize,
}

/// Writes size-bounded chunk artifacts into one dataset directory.
#[derive(Debug)]
pub struct CruxRowChunker {
    output_dir: PathBuf,
    config: CruxChunkerConfig,
}

impl CruxRowChunker {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            config: CruxChunkerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CruxChunkerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Splits an infallible row sequence. See [`try_split`](Self::try_split).
    pub fn split<I>(&self, period: CruxPeriod, rows: I) -> Result<Vec<CruxChunkWriteResult>>
    where
        I: IntoIterator<Item = CruxRankedRow>,
    {
        self.try_split(period, rows.into_iter().map(Ok))
    }

    /// Splits a fallible row stream into `<period>_<n>.csv` artifacts.
    ///
    /// Only chunk 1 carries the header line. An empty stream writes nothing.
    /// If the stream or a write fails midway, the artifacts written by this
    /// call are removed before the error is returned.
    pub fn try_split<I>(&self, period: CruxPeriod, rows: I) -> Result<Vec<CruxChunkWriteResult>>
    where
        I: IntoIterator<Item = Result<CruxRankedRow>>,
    {
        let mut rows = rows.into_iter();
        let sample_size = self.config.sample_rows.max(1);
        let mut sample = Vec::with_capacity(sample_size);
        while sample.len() < sample_size {
            match rows.next() {
                Some(row) => sample.push(row?),
                None => break,
            }
        }

        if sample.is_empty() {
            log::info!("No rows for {}, nothing to chunk", period);
            return Ok(Vec::new());
        }

        log::info!("Chunking data for {}...", period);
        let plan = self.estimate(&sample)?;
        log::info!(
            "  Estimated {:.1} bytes/row -> {} rows/chunk",
            plan.avg_bytes_per_row,
            plan.rows_per_chunk
        );

        fs::create_dir_all(&self.output_dir)?;

        let mut created = Vec::new();
        let stream = sample.into_iter().map(Ok).chain(rows);
        match self.write_chunks(period, plan.rows_per_chunk, stream, &mut created) {
            Ok(results) => {
                let total: u64 = results.iter().map(|c| c.size).sum();
                log::info!(
                    "  -> Total: {} chunks, {:.2} MB",
                    results.len(),
                    total as f64 / (1024.0 * 1024.0)
                );
                Ok(results)
            }
            Err(err) => {
                for path in &created {
                    let _ = fs::remove_file(path);
                }
                Err(err)
            }
        }
    }

    /// Derives rows-per-chunk from a sample of serialized rows.
    ///
    /// The sample is serialized with the header, the way the whole month
    /// would be, and the header length is reserved from the byte target.
    pub fn estimate(&self, sample: &[CruxRankedRow]) -> Result<CruxChunkPlan> {
        if sample.is_empty() {
            return Ok(CruxChunkPlan {
                avg_bytes_per_row: 0.0,
                rows_per_chunk: self.config.fallback_rows_per_chunk.max(1),
            });
        }

        let mut writer = Self::writer_builder().from_writer(Vec::new());
        writer.write_record(self.config.header.split(','))?;
        for row in sample {
            writer.serialize(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| CruxError::internal(format!("sample serialization failed: {}", e)))?;

        let avg_bytes_per_row = bytes.len() as f64 / sample.len() as f64;
        let header_size = self.config.header.len() as f64 + 1.0;
        let computed = ((self.config.target_chunk_bytes as f64 - header_size) / avg_bytes_per_row)
            .floor();

        let rows_per_chunk = if computed >= 1.0 {
            computed as usize
        } else {
            self.config.fallback_rows_per_chunk.max(1)
        };

        Ok(CruxChunkPlan {
            avg_bytes_per_row,
            rows_per_chunk,
        })
    }

    /// Deletes every artifact of `period` in the output directory.
    pub fn clear_period(&self, period: CruxPeriod) -> Result<usize> {
        if !self.output_dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in fs::read_dir(&self.output_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let matches = name
                .to_str()
                .and_then(CruxChunkName::parse)
                .map_or(false, |n| n.period == period);
            if matches && entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        if removed > 0 {
            log::debug!("Removed {} stale chunks of {}", removed, period);
        }
        Ok(removed)
    }

    fn write_chunks<I>(
        &self,
        period: CruxPeriod,
        rows_per_chunk: usize,
        rows: I,
        created: &mut Vec<PathBuf>,
    ) -> Result<Vec<CruxChunkWriteResult>>
    where
        I: Iterator<Item = Result<CruxRankedRow>>,
    {
        let mut results = Vec::new();
        let mut open: Option<OpenChunk> = None;

        for (offset, row) in rows.enumerate() {
            let row = row?;
            if open.is_none() {
                let number = results.len() as u32 + 1;
                let chunk = self.open_chunk(period, number, offset)?;
                created.push(chunk.path.clone());
                open = Some(chunk);
            }

            let full = match open.as_mut() {
                Some(current) => {
                    current.writer.serialize(&row)?;
                    current.rows += 1;
                    current.rows == rows_per_chunk
                }
                None => false,
            };

            if full {
                if let Some(chunk) = open.take() {
                    results.push(Self::finish_chunk(chunk)?);
                }
            }
        }

        if let Some(chunk) = open.take() {
            results.push(Self::finish_chunk(chunk)?);
        }

        Ok(results)
    }

    fn open_chunk(&self, period: CruxPeriod, chunk: u32, start_row: usize) -> Result<OpenChunk> {
        let filename = CruxChunkName::new(period, chunk).filename();
        let path = self.output_dir.join(&filename);
        let mut writer = Self::writer_builder().from_path(&path)?;
        if chunk == 1 {
            writer.write_record(self.config.header.split(','))?;
        }
        Ok(OpenChunk {
            writer,
            path,
            filename,
            chunk,
            start_row,
            rows: 0,
        })
    }

    fn finish_chunk(mut chunk: OpenChunk) -> Result<CruxChunkWriteResult> {
        chunk.writer.flush()?;
        drop(chunk.writer);
        let size = fs::metadata(&chunk.path)?.len();

        log::info!(
            "  Chunk {}: {} ({:.2} MB, {} rows)",
            chunk.chunk,
            chunk.filename,
            size as f64 / (1024.0 * 1024.0),
            chunk.rows
        );

        Ok(CruxChunkWriteResult {
            chunk: chunk.chunk,
            filename: chunk.filename,
            size,
            rows: chunk.rows,
            start_row: chunk.start_row,
            end_row: chunk.start_row + chunk.rows,
        })
    }

    fn writer_builder() -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'));
        builder
    }
}
