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

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration for the [`CruxLogger`](super::CruxLogger): threshold level,
/// console output format, and an optional size-rotated log file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CruxLogConfig {
    pub level: String,
    pub console_enabled: bool,
    pub json_format_console: bool,
    /// Whether file logging is enabled.
    pub file_enabled: bool,
    /// Log file path when file logging is enabled.
    pub file_path: Option<String>,
    /// JSON lines in the log file instead of text.
    pub json_format_file: bool,
    /// Rotate once the file grows past this many bytes.
    pub max_bytes: Option<u64>,
    /// Number of rotated files to keep.
    pub backup_count: Option<u32>,
}

impl Default for CruxLogConfig {
    fn default() -> Self {
        CruxLogConfig {
            level: "INFO".to_string(),
            console_enabled: true,
            json_format_console: false,
            file_enabled: false,
            file_path: None,
            json_format_file: true,
            max_bytes: Some(10 * 1024 * 1024),
            backup_count: Some(7),
        }
    }
}

impl CruxLogConfig {
    /// Threshold as a `log` filter. Unknown names fall back to `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.to_ascii_uppercase().as_str() {
            "OFF" => LevelFilter::Off,
            "ERROR" => LevelFilter::Error,
            "WARN" | "WARNING" => LevelFilter::Warn,
            "DEBUG" => LevelFilter::Debug,
            "TRACE" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        }
    }

    pub fn should_log(&self, level: log::Level) -> bool {
        level <= self.level_filter()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CruxLogConfigBuilder {
    pub level: Option<String>,
    pub console_enabled: Option<bool>,
    pub json_format_console: Option<bool>,
    pub file_enabled: Option<bool>,
    pub file_path: Option<String>,
    pub json_format_file: Option<bool>,
    pub max_bytes: Option<u64>,
    pub backup_count: Option<u32>,
}

impl CruxLogConfigBuilder {
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn json_console(mut self, json: bool) -> Self {
        self.json_format_console = Some(json);
        self
    }

    /// Enables file logging at `path`.
    pub fn file(mut self, path: impl Into<String>) -> Self {
        self.file_enabled = Some(true);
        self.file_path = Some(path.into());
        self
    }

    /// Fills every unset field from [`CruxLogConfig::default`].
    pub fn build(self) -> CruxLogConfig {
        let base = CruxLogConfig::default();
        CruxLogConfig {
            level: self.level.unwrap_or(base.level),
            console_enabled: self.console_enabled.unwrap_or(base.console_enabled),
            json_format_console: self.json_format_console.unwrap_or(base.json_format_console),
            file_enabled: self.file_enabled.unwrap_or(base.file_enabled),
            file_path: self.file_path.or(base.file_path),
            json_format_file: self.json_format_file.unwrap_or(base.json_format_file),
            max_bytes: self.max_bytes.or(base.max_bytes),
            backup_count: self.backup_count.or(base.backup_count),
        }
    }

    /// Builds from a JSON object; an unreadable value yields the defaults.
    pub fn from_json(value: &Value) -> CruxLogConfig {
        let builder: CruxLogConfigBuilder =
            serde_json::from_value(value.clone()).unwrap_or_default();
        builder.build()
    }
}
