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

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::SystemTime;

use crate::errors::{CruxError, Result};

/// Transport that copies a remote artifact into a local writer.
///
/// Every failure is reported as [`CruxError::Download`].
pub trait CruxFetcher: Send + Sync {
    /// Human-readable location of `rel`, used in errors and logs.
    fn locate(&self, rel: &str) -> String;

    /// Streams the artifact at `rel` into `out`, returning the bytes copied.
    fn fetch(&self, rel: &str, out: &mut dyn Write) -> Result<u64>;
}

/// Blocking HTTPS GETs against a static file host.
#[cfg(feature = "http")]
pub struct CruxHttpFetcher {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl CruxHttpFetcher {
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("crux-cache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CruxError::internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &crate::config::CruxConfig) -> Result<Self> {
        Self::new(&config.base_url, config.request_timeout_duration())
    }
}

#[cfg(feature = "http")]
impl CruxFetcher for CruxHttpFetcher {
    fn locate(&self, rel: &str) -> String {
        format!("{}/{}", self.base_url, rel.trim_start_matches('/'))
    }

    fn fetch(&self, rel: &str, out: &mut dyn Write) -> Result<u64> {
        let url = self.locate(rel);
        let mut response = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| CruxError::download(&url, e.to_string()))?;

        response
            .copy_to(out)
            .map_err(|e| CruxError::download(&url, e.to_string()))
    }
}

/// Serves artifacts from a local mirror of the remote layout.
#[derive(Clone, Debug)]
pub struct CruxDirectoryFetcher {
    root: PathBuf,
}

impl CruxDirectoryFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl CruxFetcher for CruxDirectoryFetcher {
    fn locate(&self, rel: &str) -> String {
        self.root.join(rel).display().to_string()
    }

    fn fetch(&self, rel: &str, out: &mut dyn Write) -> Result<u64> {
        let location = self.locate(rel);
        let mut file =
            File::open(self.root.join(rel)).map_err(|e| CruxError::download(&location, e.to_string()))?;
        io::copy(&mut file, out).map_err(|e| CruxError::download(&location, e.to_string()))
    }
}

/// Source of "now" for metadata freshness checks.
pub trait CruxClock: Send + Sync {
    fn now(&self) -> SystemTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CruxSystemClock;

impl CruxClock for CruxSystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
