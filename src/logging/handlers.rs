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

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::logging::core::CruxLogRecord;
use crate::logging::formatters::{CruxJsonFormatter, CruxTextFormatter};

pub trait CruxLogHandler {
    fn handle(&self, record: &CruxLogRecord);

    fn flush(&self) {}
}

fn render(record: &CruxLogRecord, json: bool) -> String {
    if json {
        CruxJsonFormatter::format(record)
    } else {
        CruxTextFormatter::format(record)
    }
}

/// Writes to stderr so that stdout stays free for streamed rows.
pub struct CruxConsoleHandler {
    json: bool,
}

impl CruxConsoleHandler {
    pub fn new(json: bool) -> Self {
        CruxConsoleHandler { json }
    }
}

impl CruxLogHandler for CruxConsoleHandler {
    fn handle(&self, record: &CruxLogRecord) {
        let line = render(record, self.json);
        let _ = writeln!(io::stderr().lock(), "{}", line);
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Append-only file handler with size-based rotation.
pub struct CruxFileHandler {
    path: PathBuf,
    json: bool,
    max_bytes: Option<u64>,
    backup_count: u32,
    lock: Mutex<()>,
}

impl CruxFileHandler {
    pub fn new(
        path: impl Into<PathBuf>,
        json: bool,
        max_bytes: Option<u64>,
        backup_count: Option<u32>,
    ) -> Self {
        CruxFileHandler {
            path: path.into(),
            json,
            max_bytes,
            backup_count: backup_count.unwrap_or(7),
            lock: Mutex::new(()),
        }
    }

    fn backup_path(&self, idx: u32) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}", idx));
        self.path.with_file_name(name)
    }

    /// `path.N -> path.(N+1)`, `path -> path.1`; the oldest falls off.
    fn rotate_if_needed(&self) {
        let Some(max_bytes) = self.max_bytes else {
            return;
        };
        match fs::metadata(&self.path) {
            Ok(meta) if meta.len() > max_bytes => {}
            _ => return,
        }
        if self.backup_count == 0 {
            let _ = fs::remove_file(&self.path);
            return;
        }
        for idx in (1..=self.backup_count).rev() {
            let from = if idx == 1 {
                self.path.clone()
            } else {
                self.backup_path(idx - 1)
            };
            if from.exists() {
                let _ = fs::rename(&from, self.backup_path(idx));
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CruxLogHandler for CruxFileHandler {
    fn handle(&self, record: &CruxLogRecord) {
        let Ok(_guard) = self.lock.lock() else {
            return;
        };
        self.rotate_if_needed();

        let line = render(record, self.json);
        if let Ok(mut f) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
        {
            let _ = writeln!(f, "{}", line);
        }
    }
}
