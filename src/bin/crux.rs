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

//! # crux-cache
//!
//! Command-line entry point.
//!
//! ## Commands
//!
//! - `crux-cache collect <data_dir>` - chunk upstream months and rebuild manifests
//! - `crux-cache list` - list published datasets
//! - `crux-cache months <dataset>` - list a dataset's months
//! - `crux-cache stream <dataset>` - print `origin,rank` rows of one month
//! - `crux-cache clear-cache` - drop the local cache
//!
//! ## Configuration
//!
//! Settings come from `--config` (YAML or JSON), then `CRUX_BASE_URL`,
//! `CRUX_CACHE_DIR` and `CRUX_METADATA_TTL`, then the flags below.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};

use crux_cache::{
    CruxClient, CruxCollectOptions, CruxCollector, CruxConfig, CruxCsvExportSource,
    CruxDatasetScope, CruxLogConfigBuilder, CruxLogger, CruxPeriod,
};

/// Chunked CrUX popularity rankings: collect, publish and read.
#[derive(Debug, Parser)]
#[command(name = "crux-cache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (.yaml, .yml or .json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Local cache root.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Metadata cache lifetime in seconds.
    #[arg(long, global = true)]
    metadata_ttl: Option<u64>,

    /// Base URL of the published artifacts.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, env = "CRUX_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Also append logs to this file.
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download and chunk upstream months, then rebuild manifests.
    Collect(CollectArgs),
    /// List published datasets.
    List,
    /// List the months of a dataset.
    Months {
        dataset: String,
    },
    /// Print `origin,rank` rows of one month.
    Stream(StreamArgs),
    /// Delete the local cache.
    ClearCache,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DatasetType {
    Global,
    Country,
}

#[derive(Debug, Args)]
struct CollectArgs {
    /// Dataset directory, e.g. data/global or data/us.
    data_dir: PathBuf,

    /// Root of upstream exports laid out as <dataset>/<YYYYMM>.csv.
    #[arg(long)]
    source: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "global")]
    dataset_type: DatasetType,

    /// Two-letter country code, required with --dataset-type country.
    #[arg(long)]
    country_code: Option<String>,

    #[arg(long, default_value_t = 2025)]
    start_year: i32,

    #[arg(long, default_value_t = 1)]
    start_month: u32,

    /// Only download months that have no artifacts yet.
    #[arg(long)]
    incremental: bool,

    /// Only rebuild manifest.json and datasets.json.
    #[arg(long)]
    manifest_only: bool,

    /// Rebuild the manifest from scratch.
    #[arg(long)]
    regenerate: bool,
}

#[derive(Debug, Args)]
struct StreamArgs {
    dataset: String,

    /// Month key (YYYYMM); defaults to the latest month.
    #[arg(long)]
    month: Option<String>,

    /// Inclusive rank ceiling.
    #[arg(long)]
    max_rank: Option<u64>,

    /// Stop after this many rows.
    #[arg(long)]
    limit: Option<usize>,
}

impl Cli {
    fn crux_config(&self) -> Result<CruxConfig> {
        let mut config = match &self.config {
            Some(path) => CruxConfig::from_path(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => CruxConfig::default(),
        }
        .apply_env()?;

        if let Some(dir) = &self.cache_dir {
            config = config.cache_dir(dir);
        }
        if let Some(ttl) = self.metadata_ttl {
            config = config.metadata_ttl(Duration::from_secs(ttl));
        }
        if let Some(url) = &self.base_url {
            config = config.base_url(url);
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut logging = CruxLogConfigBuilder::default()
        .level(cli.log_level.clone())
        .json_console(cli.log_json);
    if let Some(path) = &cli.log_file {
        logging = logging.file(path.clone());
    }
    CruxLogger::init(logging.build());

    match &cli.command {
        Commands::Collect(args) => collect(args),
        Commands::List => {
            let client = CruxClient::new(cli.crux_config()?)?;
            list(&client)
        }
        Commands::Months { dataset } => {
            let client = CruxClient::new(cli.crux_config()?)?;
            for month in client.list_months(dataset)? {
                println!("{}", month);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Stream(args) => {
            let client = CruxClient::new(cli.crux_config()?)?;
            stream(&client, args)
        }
        Commands::ClearCache => {
            let client = CruxClient::new(cli.crux_config()?)?;
            client.clear_cache()?;
            println!("Cleared {}", client);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn collect(args: &CollectArgs) -> Result<ExitCode> {
    let scope = match (args.dataset_type, args.country_code.as_deref()) {
        (DatasetType::Global, _) => CruxDatasetScope::Global,
        (DatasetType::Country, Some(code)) => CruxDatasetScope::country(code)?,
        (DatasetType::Country, None) => Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "--country-code is required when --dataset-type is 'country'",
            )
            .exit(),
    };
    let start = CruxPeriod::new(args.start_year, args.start_month)?;

    let options = CruxCollectOptions::new(&args.data_dir, scope.clone(), start)
        .incremental(args.incremental)
        .manifest_only(args.manifest_only)
        .regenerate(args.regenerate);
    let collector = CruxCollector::new(options);

    log::info!("Dataset: {}", scope);
    log::info!("Data directory: {}", args.data_dir.display());

    if args.manifest_only {
        collector.refresh_manifests()?;
        log::info!("Done");
        return Ok(ExitCode::SUCCESS);
    }

    let source = match args.source.as_deref().map(|root| CruxCsvExportSource::new(root, &scope)) {
        Some(Ok(source)) => source,
        Some(Err(err)) => {
            log::error!("Initialization error: {}", err);
            return Ok(ExitCode::FAILURE);
        }
        None => {
            log::error!("Initialization error: --source is required unless --manifest-only is set");
            return Ok(ExitCode::FAILURE);
        }
    };

    let report = collector.run(&source)?;
    if report.nothing_available() {
        log::error!("No months found upstream");
        return Ok(ExitCode::FAILURE);
    }

    log::info!(
        "Processed {} months ({} chunks), {} empty, {} failed",
        report.processed.len(),
        report.chunks_written,
        report.empty.len(),
        report.failed.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn list(client: &CruxClient) -> Result<ExitCode> {
    for summary in client.list_datasets()? {
        println!(
            "{:<8} {:>3} months  {} .. {}  {}",
            summary.id,
            summary.total_months,
            summary.earliest_month.as_deref().unwrap_or("-"),
            summary.latest_month.as_deref().unwrap_or("-"),
            summary.name
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn stream(client: &CruxClient, args: &StreamArgs) -> Result<ExitCode> {
    let dataset = client.get_dataset(&args.dataset, args.month.as_deref(), args.max_rank)?;
    log::info!("{}", dataset);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let limit = args.limit.unwrap_or(usize::MAX);
    for row in dataset.iter().take(limit) {
        let (origin, rank) = row?;
        writeln!(out, "{},{}", origin, rank)?;
    }
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}
