//! Common CLI options.
//!
//! Shared argument structures composed into command structs using `#[command(flatten)]`.

use anyhow::Result;
use clap::Args;

use shardsplit_lib::compression::{Compression, DEFAULT_COMPRESSION_LEVEL};

/// Compression options for output shards.
#[derive(Debug, Clone, Args)]
pub struct CompressionOptions {
    /// Shard compression: `gzip` (or `gz`) or `none`.
    #[arg(short = 'c', long = "compress", default_value = "none", value_parser = ["gzip", "gz", "none"])]
    pub compress: String,

    /// Gzip compression level for shards (1-9).
    ///
    /// Level 1 is fastest with larger files.
    /// Level 9 produces smallest files but is slowest.
    #[arg(
        long,
        default_value_t = DEFAULT_COMPRESSION_LEVEL,
        value_parser = clap::value_parser!(u32).range(1..=9)
    )]
    pub compression_level: u32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self { compress: "none".to_string(), compression_level: DEFAULT_COMPRESSION_LEVEL }
    }
}

impl CompressionOptions {
    /// Resolves the compression mode.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown mode.
    pub fn validate(&self) -> Result<Compression> {
        Ok(self.compress.parse()?)
    }
}
