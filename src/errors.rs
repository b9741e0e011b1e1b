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

//! # Crux Error Module
//!
//! This module defines the error types used throughout Crux for consistent
//! error handling and reporting on both the write side (chunking, manifest
//! reconciliation) and the read side (cache, dataset streaming).
//!
//! ## Error Categories
//!
//! - **Io**: Filesystem failures while scanning or writing artifacts
//! - **NotFound**: Unknown dataset id or month, with the valid options attached
//! - **InvalidArgument**: Rank ceilings outside the enumerated set, unsafe paths
//! - **Download**: Transport or HTTP failure while fetching a remote artifact
//! - **CacheCorruption**: A cached artifact exists but cannot be read or parsed
//! - **Serde / Csv**: Encoding failures outside of the cache
//! - **Config**: Invalid configuration values
//! - **Internal**: Unexpected internal failures
//!
//! ## Propagation
//!
//! Malformed data rows and broken manifests found while building the datasets
//! index are skipped where they occur and never surface here. Everything else
//! is returned to the caller; nothing in the crate retries on its own.
//!
//! ## Usage
//!
//! ```rust
//! use crux_cache::errors::{Result, CruxError};
//!
//! fn pick(max_rank: u64, valid: &[u64]) -> Result<u64> {
//!     if !valid.contains(&max_rank) {
//!         return Err(CruxError::invalid_argument(format!(
//!             "max_rank must be one of {:?}, got {}",
//!             valid, max_rank
//!         )));
//!     }
//!     Ok(max_rank)
//! }
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Crux.
pub type Result<T> = std::result::Result<T, CruxError>;

/// Canonical error enumeration for Crux.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum CruxError {
    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// A requested resource does not exist; `available` lists what does.
    #[error("{resource} '{requested}' not found. Available: {}", .available.join(", "))]
    NotFound {
        resource: String,
        requested: String,
        available: Vec<String>,
    },

    /// Caller supplied a value outside of the accepted domain.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Fetching a remote artifact failed.
    #[error("failed to download {url}: {message}")]
    Download { url: String, message: String },

    /// A cached artifact exists locally but could not be read or parsed.
    #[error("cache corruption at {path}: {message}")]
    CacheCorruption { path: String, message: String },

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Errors raised by the CSV reader or writer.
    #[error("csv error: {0}")]
    Csv(String),

    /// Invalid configuration.
    #[error("config error: {message}")]
    Config { message: String },

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for CruxError {
    fn from(err: io::Error) -> Self {
        CruxError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CruxError {
    fn from(err: serde_json::Error) -> Self {
        CruxError::Serde(err.to_string())
    }
}

impl From<serde_yaml::Error> for CruxError {
    fn from(err: serde_yaml::Error) -> Self {
        CruxError::Serde(err.to_string())
    }
}

impl From<csv::Error> for CruxError {
    fn from(err: csv::Error) -> Self {
        CruxError::Csv(err.to_string())
    }
}

impl CruxError {
    /// Helper to construct invalid-argument errors.
    pub fn invalid_argument<T: Into<String>>(message: T) -> Self {
        CruxError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Helper to construct not-found errors carrying the valid options.
    pub fn not_found(
        resource: impl Into<String>,
        requested: impl Into<String>,
        available: Vec<String>,
    ) -> Self {
        CruxError::NotFound {
            resource: resource.into(),
            requested: requested.into(),
            available,
        }
    }

    /// Helper to construct download errors.
    pub fn download(url: impl Into<String>, message: impl Into<String>) -> Self {
        CruxError::Download {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Helper to construct cache corruption errors.
    pub fn corruption(path: impl Into<String>, message: impl Into<String>) -> Self {
        CruxError::CacheCorruption {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Helper to construct configuration errors.
    pub fn config<T: Into<String>>(message: T) -> Self {
        CruxError::Config {
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        CruxError::Internal(message.into())
    }

    /// Valid options attached to a not-found error, empty for other variants.
    pub fn available(&self) -> &[String] {
        match self {
            CruxError::NotFound { available, .. } => available,
            _ => &[],
        }
    }
}
