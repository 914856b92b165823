//! The scan pool: turns read targets into lines.

use std::io::{self, BufRead, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, select};

use super::{Line, ReadTarget, SplitConfig, cancelled};
use crate::cancel::CancellationToken;
use crate::errors::{Result, SplitError};
use crate::fs::FileSystem;
use crate::progress::{Diagnostics, LineProgress};
use crate::stage::StageHandle;

/// Starts `config.parallelism` scan workers sharing the target and line queues.
///
/// A worker ends successfully when the target queue is closed and drained. Any open, decode
/// or read failure, or a line longer than `config.max_line_length`, ends the worker with an
/// error and cancels the pipeline.
pub(super) fn start_scan_stage(
    fs: Arc<dyn FileSystem>,
    config: &SplitConfig,
    diagnostics: Diagnostics,
    token: CancellationToken,
    targets: Receiver<ReadTarget>,
    lines: Sender<Line>,
) -> Result<StageHandle<u64>> {
    let mut stage = StageHandle::new("scan", token.clone(), |lines| lines);
    for _ in 0..config.parallelism {
        let worker = ScanWorker {
            fs: Arc::clone(&fs),
            max_line_length: config.max_line_length,
            diagnostics: diagnostics.clone(),
            token: token.clone(),
            targets: targets.clone(),
            lines: lines.clone(),
        };
        if let Err(e) = stage.spawn(move |scanned| worker.run(scanned)) {
            return Err(stage.abort(e));
        }
    }
    Ok(stage)
}

struct ScanWorker {
    fs: Arc<dyn FileSystem>,
    max_line_length: usize,
    diagnostics: Diagnostics,
    token: CancellationToken,
    targets: Receiver<ReadTarget>,
    lines: Sender<Line>,
}

impl ScanWorker {
    fn run(self, scanned: &AtomicU64) -> Result<()> {
        loop {
            if self.token.is_cancelled() {
                return Err(cancelled(&self.token));
            }
            let target = select! {
                recv(self.token.done()) -> _ => return Err(cancelled(&self.token)),
                recv(self.targets) -> target => match target {
                    Ok(target) => target,
                    Err(_) => return Ok(()),
                },
            };
            let count = self.scan_target(&target)?;
            scanned.fetch_add(count, Ordering::SeqCst);
        }
    }

    /// Reads every line of one input onto the line queue; returns the number of lines.
    fn scan_target(&self, target: &ReadTarget) -> Result<u64> {
        let path = target.path();
        let mut reader = self.fs.create_reader(path)?;
        let mut progress = LineProgress::new(path, self.diagnostics.clone());

        loop {
            if self.token.is_cancelled() {
                return Err(cancelled(&self.token));
            }
            let bytes = match read_line(&mut *reader, self.max_line_length)
                .map_err(|e| SplitError::io("read", path, e))?
            {
                ScannedLine::Eof => break,
                ScannedLine::TooLong => {
                    return Err(SplitError::LineTooLong {
                        path: path.to_string(),
                        line: progress.count() + 1,
                        max: self.max_line_length,
                    });
                }
                ScannedLine::Line(bytes) => bytes,
            };

            select! {
                recv(self.token.done()) -> _ => return Err(cancelled(&self.token)),
                send(self.lines, Line(bytes)) -> sent => {
                    if sent.is_err() {
                        return Err(cancelled(&self.token));
                    }
                }
            }
            progress.record_line();
        }

        Ok(progress.finish())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ScannedLine {
    Line(Vec<u8>),
    TooLong,
    Eof,
}

/// Reads one line, stripping a trailing `\n` and then a trailing `\r`.
///
/// At most `max + 2` bytes are consumed, enough for a maximal line plus `\r\n`.
fn read_line<R: BufRead + ?Sized>(reader: &mut R, max: usize) -> io::Result<ScannedLine> {
    let limit = u64::try_from(max).unwrap_or(u64::MAX).saturating_add(2);
    let mut buf = Vec::new();
    if (&mut *reader).take(limit).read_until(b'\n', &mut buf)? == 0 {
        return Ok(ScannedLine::Eof);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    if buf.len() > max { Ok(ScannedLine::TooLong) } else { Ok(ScannedLine::Line(buf)) }
}
