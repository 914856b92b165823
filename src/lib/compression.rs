//! Compression decorators for shard writers and input readers.
//!
//! The two sides are independent: the writer side is chosen by the configured mode name,
//! while the reader side is inferred from each input's filename, so one run may mix plain,
//! gzip and bzip2 inputs regardless of how the shards are written.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;
use std::str::FromStr;

use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::errors::{Result, SplitError};

/// Default gzip compression level for shards.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Output compression applied to every shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Shards are written as plain text.
    #[default]
    None,
    /// Shards are written as gzip streams.
    Gzip,
}

impl Compression {
    /// Filename suffix appended to shard paths.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Gzip => ".gz",
        }
    }

    /// Canonical mode name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
        }
    }
}

impl FromStr for Compression {
    type Err = SplitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "none" => Ok(Self::None),
            "gzip" | "gz" => Ok(Self::Gzip),
            other => Err(SplitError::UnknownCompression(other.to_string())),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A writer whose output is only complete once it has been finished.
///
/// For gzip this writes the stream trailer; for plain output it flushes.
pub trait FinishWrite: Write + Send {
    /// Completes the stream and flushes everything to the destination.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// Plain passthrough that only adds [`FinishWrite`].
#[derive(Debug)]
pub struct Passthrough<W>(pub W);

impl<W: Write> Write for Passthrough<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.0.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<W: Write + Send> FinishWrite for Passthrough<W> {
    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.0.flush()
    }
}

impl<W: Write + Send> FinishWrite for GzEncoder<W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let mut inner = GzEncoder::finish(*self)?;
        inner.flush()
    }
}

/// Wraps `inner` according to the compression mode name.
///
/// # Errors
///
/// Returns [`SplitError::UnknownCompression`] for an unrecognised mode; `inner` is dropped
/// and nothing is returned that would need releasing.
pub fn decorate_writer<W>(mode: &str, inner: W, level: u32) -> Result<Box<dyn FinishWrite>>
where
    W: Write + Send + 'static,
{
    let writer: Box<dyn FinishWrite> = match mode.parse::<Compression>()? {
        Compression::None => Box::new(Passthrough(inner)),
        Compression::Gzip => Box::new(GzEncoder::new(inner, flate2::Compression::new(level))),
    };
    Ok(writer)
}

/// Input decoding inferred from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCompression {
    Plain,
    Gzip,
    Bzip2,
}

impl InputCompression {
    /// Infers the decoding from the filename suffix (`.gz`, `.bz2`, anything else is plain).
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let name = path.as_ref().to_string_lossy();
        if name.ends_with(".gz") {
            Self::Gzip
        } else if name.ends_with(".bz2") {
            Self::Bzip2
        } else {
            Self::Plain
        }
    }
}

/// Wraps `inner` in the decoder implied by `path`'s suffix.
///
/// Concatenated gzip members and bzip2 streams are decoded as one stream.
pub fn decorate_reader<P, R>(path: P, inner: R) -> Box<dyn Read + Send>
where
    P: AsRef<Path>,
    R: Read + Send + 'static,
{
    match InputCompression::from_path(path) {
        InputCompression::Plain => Box::new(inner),
        InputCompression::Gzip => Box::new(MultiGzDecoder::new(inner)),
        InputCompression::Bzip2 => Box::new(MultiBzDecoder::new(inner)),
    }
}
