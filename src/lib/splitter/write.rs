//! The write pool: one worker per output shard.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, select};

use super::{Line, SplitConfig, cancelled};
use crate::cancel::CancellationToken;
use crate::cleanup::CleanupStack;
use crate::compression::Compression;
use crate::errors::{ErrorList, Result, SplitError};
use crate::fs::{FileSystem, ShardWriter, shard_dir, shard_path};
use crate::stage::StageHandle;

/// Opens every shard, then starts one write worker per shard.
///
/// All shards are created before any worker starts. If one cannot be created, the shards
/// opened so far are closed again, newest first, and no worker is started.
pub(super) fn start_write_stage(
    fs: &dyn FileSystem,
    config: &SplitConfig,
    compression: Compression,
    token: CancellationToken,
    lines: Receiver<Line>,
) -> Result<StageHandle<u64>> {
    let shards = open_shards(fs, config, compression)?;

    let mut stage = StageHandle::new("write", token.clone(), |written| written);
    let mut pending = shards.into_iter();
    while let Some(shard) = pending.next() {
        let worker = WriteWorker { shard, token: token.clone(), lines: lines.clone() };
        if let Err(e) = stage.spawn(move |written| worker.run(written)) {
            // The shard moved into the failed closure was dropped unfinished.
            let mut errors = ErrorList::from(e);
            errors.record(release_shards(pending.collect()));
            return Err(stage.abort(errors.into_error()));
        }
    }
    Ok(stage)
}

/// Creates the directory and writer of every shard, in index order.
fn open_shards(
    fs: &dyn FileSystem,
    config: &SplitConfig,
    compression: Compression,
) -> Result<Vec<ShardWriter>> {
    let mut opened = Vec::with_capacity(config.shards);

    for index in 0..config.shards {
        let path = shard_path(&config.prefix, index, compression.extension());
        let dir = shard_dir(&path);
        let created = fs
            .mkdir_all(dir)
            .map_err(|source| SplitError::Resource {
                what: "directory",
                path: dir.to_path_buf(),
                source,
            })
            .and_then(|()| fs.create_writer(&path, compression.name(), config.compression_level));

        match created {
            Ok(shard) => opened.push(shard),
            Err(e) => {
                let mut errors = ErrorList::from(e);
                errors.record(release_shards(opened));
                return Err(errors.into_error());
            }
        }
    }

    Ok(opened)
}

/// Closes shards that never reached a worker, newest first.
fn release_shards(shards: Vec<ShardWriter>) -> Result<()> {
    log::debug!("Releasing {} opened shards after failure", shards.len());
    let mut release = CleanupStack::new();
    for shard in shards {
        release.add(move || shard.close());
    }
    release.run()
}

struct WriteWorker {
    shard: ShardWriter,
    token: CancellationToken,
    lines: Receiver<Line>,
}

impl WriteWorker {
    /// Drains the line queue into the shard, then closes the shard whatever the outcome.
    fn run(self, written: &AtomicU64) -> Result<()> {
        let Self { mut shard, token, lines } = self;
        let mut count = 0u64;
        let result = Self::drain(&mut shard, &token, &lines, &mut count);
        written.fetch_add(count, Ordering::SeqCst);

        let mut errors = ErrorList::new();
        errors.record(result);
        errors.record(shard.close());
        errors.drop_secondary_cancellations();
        errors.into_result()
    }

    fn drain(
        shard: &mut ShardWriter,
        token: &CancellationToken,
        lines: &Receiver<Line>,
        count: &mut u64,
    ) -> Result<()> {
        loop {
            if token.is_cancelled() {
                return Err(cancelled(token));
            }
            let line = select! {
                recv(token.done()) -> _ => return Err(cancelled(token)),
                recv(lines) -> line => match line {
                    Ok(line) => line,
                    Err(_) => return Ok(()),
                },
            };
            shard
                .write_line(line.as_bytes())
                .map_err(|e| SplitError::io("write", shard.path().display().to_string(), e))?;
            *count += 1;
        }
    }
}
