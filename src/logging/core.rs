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

use chrono::{DateTime, SecondsFormat, Utc};
use log::{Level, Log, Metadata, Record};
use serde_json::{json, Map, Value};

use crate::logging::config::CruxLogConfig;
use crate::logging::handlers::{CruxConsoleHandler, CruxFileHandler, CruxLogHandler};

/// One captured log event.
#[derive(Clone, Debug)]
pub struct CruxLogRecord {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl CruxLogRecord {
    pub fn new(level: Level, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            target: target.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn to_json(&self) -> Value {
        let mut data = Map::new();
        data.insert("level".into(), json!(self.level.as_str()));
        data.insert("target".into(), json!(self.target));
        data.insert("message".into(), json!(self.message));
        data.insert("timestamp".into(), json!(self.timestamp_rfc3339()));
        Value::Object(data)
    }
}

/// `log` backend fanning records out to the configured handlers.
pub struct CruxLogger {
    config: CruxLogConfig,
    handlers: Vec<Box<dyn CruxLogHandler + Send + Sync>>,
}

impl CruxLogger {
    pub fn from_config(config: CruxLogConfig) -> Self {
        let mut handlers: Vec<Box<dyn CruxLogHandler + Send + Sync>> = Vec::new();
        if config.console_enabled {
            handlers.push(Box::new(CruxConsoleHandler::new(config.json_format_console)));
        }
        if config.file_enabled {
            if let Some(path) = &config.file_path {
                handlers.push(Box::new(CruxFileHandler::new(
                    path.clone(),
                    config.json_format_file,
                    config.max_bytes,
                    config.backup_count,
                )));
            }
        }
        Self { config, handlers }
    }

    /// Adds a handler after construction.
    pub fn with_handler(mut self, handler: impl CruxLogHandler + Send + Sync + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Installs the logger as the global `log` backend. Safe to call multiple
    /// times; the first call wins and later calls return `false`.
    pub fn init(config: CruxLogConfig) -> bool {
        let filter = config.level_filter();
        match log::set_boxed_logger(Box::new(Self::from_config(config))) {
            Ok(()) => {
                log::set_max_level(filter);
                true
            }
            Err(_) => false,
        }
    }

    pub fn config(&self) -> &CruxLogConfig {
        &self.config
    }

    pub fn emit(&self, record: &CruxLogRecord) {
        if !self.config.should_log(record.level) {
            return;
        }
        for handler in &self.handlers {
            handler.handle(record);
        }
    }
}

impl Log for CruxLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.config.should_log(metadata.level())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.emit(&CruxLogRecord::new(
            record.level(),
            record.target(),
            record.args().to_string(),
        ));
    }

    fn flush(&self) {
        for handler in &self.handlers {
            handler.flush();
        }
    }
}
