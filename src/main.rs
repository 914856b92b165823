#![deny(unsafe_code)]
pub mod commands;
mod version;

use anyhow::Result;
use clap::Parser;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use env_logger::Env;
use log::info;

use commands::command::Command;
use commands::split::Split;

/// Custom styles for CLI help output
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(
    name = "shardsplit",
    styles = STYLES,
    version = version::VERSION.as_str(),
    about = "Split the lines of many input files across a fixed number of output shards",
    long_about = r#"
Split the lines of many input files across a fixed number of output shards.

Inputs are read concurrently; `.gz` and `.bz2` inputs are decompressed and `-` reads standard
input. Every line is written to exactly one shard named <prefix><index:03>, with a `.gz` suffix
when shards are gzip-compressed. Which shard a line lands in is not deterministic.

Example usage:
  shardsplit -s 16 -p out/part- in/*.txt
  shardsplit -c gzip --compression-level 9 -j 8 reads1.txt.gz reads2.txt.bz2
  zcat big.txt.gz | shardsplit -v -s 4 -
"#
)]
struct Args {
    #[command(flatten)]
    split: Split,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let command_line = std::env::args().collect::<Vec<_>>().join(" ");
    let args = Args::parse();

    info!("Running shardsplit version {}", version::VERSION.as_str());
    args.split.execute(&command_line)
}
