//! Split the lines of many inputs across a fixed number of output shards.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use clap::builder::RangedU64ValueParser;
use log::{debug, info};

use shardsplit_lib::logging::log_split_summary;
use shardsplit_lib::splitter::DEFAULT_MAX_LINE_LENGTH;
use shardsplit_lib::{CancellationToken, SplitConfig, Splitter};

use crate::commands::command::Command;
use crate::commands::common::CompressionOptions;

/// Split input lines across output shards.
#[derive(Debug, Parser)]
#[command(name = "split")]
pub struct Split {
    /// Input files; `-` reads standard input, `.gz` and `.bz2` inputs are decompressed
    #[arg(value_name = "INPUT", required = true, num_args = 1..)]
    pub inputs: Vec<String>,

    /// Write per-file progress to standard error
    #[arg(short = 'v', long = "verbose", default_value = "false")]
    pub verbose: bool,

    /// Number of output shards
    #[arg(
        short = 's',
        long = "split",
        default_value_t = 8,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub shards: usize,

    /// Output path prefix; may include directories, which are created
    #[arg(short = 'p', long = "prefix", default_value = "out-")]
    pub prefix: String,

    /// Compression options for output shards.
    #[command(flatten)]
    pub compression: CompressionOptions,

    /// Number of input files read concurrently
    #[arg(
        short = 'j',
        long = "parallelism",
        default_value_t = 4,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub parallelism: usize,

    /// Longest accepted input line in bytes; a longer line fails the run
    #[arg(
        long = "max-line-length",
        default_value_t = DEFAULT_MAX_LINE_LENGTH,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_line_length: usize,

    /// Cancel the run if it has not finished after this many seconds
    #[arg(long = "timeout", value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

impl Split {
    /// Builds the run configuration; numeric bounds were already enforced by the parser.
    fn to_config(&self) -> Result<SplitConfig> {
        let compression = self.compression.validate()?;

        Ok(SplitConfig {
            verbose: self.verbose,
            shards: self.shards,
            parallelism: self.parallelism,
            prefix: self.prefix.clone(),
            compression: compression.name().to_string(),
            compression_level: self.compression.compression_level,
            max_line_length: self.max_line_length,
        })
    }
}

impl Command for Split {
    fn execute(&self, command_line: &str) -> Result<()> {
        let config = self.to_config()?;

        debug!("Command line: {command_line}");
        info!("Starting Split");
        info!("Inputs: {}", self.inputs.len());
        info!("Shards: {} with prefix '{}'", config.shards, config.prefix);
        info!("Compression: {}", config.compression);
        info!("Parallelism: {}", config.parallelism);

        let cancel = CancellationToken::new();
        if let Some(secs) = self.timeout {
            info!("Timeout: {secs}s");
            cancel.cancel_after(Duration::from_secs(secs));
        }

        info!("Splitting lines ...");
        let started = Instant::now();
        let summary = Splitter::new()
            .run(&self.inputs, &config, &cancel)
            .with_context(|| format!("Failed to split {} input file(s)", self.inputs.len()))?;

        log_split_summary(&summary, config.shards, started.elapsed());
        Ok(())
    }
}
