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

//! # Logging Module
//!
//! Library code logs through the `log` facade macros. This module provides
//! the backend the binary installs.
//!
//! ## Module Components
//!
//! - **Config** ([config.rs](config/index.html)): level, console format, log file
//! - **Core** ([core.rs](core/index.html)): [`CruxLogRecord`] and the [`CruxLogger`] backend
//! - **Formatters** ([formatters.rs](formatters/index.html)): JSON lines and text
//! - **Handlers** ([handlers.rs](handlers/index.html)): stderr and rotating file sinks
//!
//! ## Usage
//!
//! ```rust
//! use crux_cache::logging::{CruxLogConfigBuilder, CruxLogger};
//!
//! CruxLogger::init(CruxLogConfigBuilder::default().level("debug").build());
//! log::info!("ready");
//! ```

pub mod config;
pub mod core;
pub mod formatters;
pub mod handlers;

pub use self::config::{CruxLogConfig, CruxLogConfigBuilder};
pub use self::core::{CruxLogRecord, CruxLogger};
pub use formatters::{CruxJsonFormatter, CruxTextFormatter};
pub use handlers::{CruxConsoleHandler, CruxFileHandler, CruxLogHandler};
