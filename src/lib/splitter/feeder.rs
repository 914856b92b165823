//! The file feeder: publishes every input path onto the read-target queue.

use std::sync::atomic::Ordering;

use crossbeam_channel::{Sender, select};

use super::{ReadTarget, cancelled};
use crate::cancel::CancellationToken;
use crate::errors::Result;
use crate::progress::Diagnostics;
use crate::stage::StageHandle;

/// Starts the single feeder worker.
///
/// Paths are published in order. The worker blocks while the queue is full and gives up
/// with a cancellation error if the token fires first. The queue itself is closed by the
/// caller once this stage has been joined.
pub(super) fn start_file_stage(
    inputs: Vec<String>,
    diagnostics: Diagnostics,
    token: CancellationToken,
    targets: Sender<ReadTarget>,
) -> Result<StageHandle<u64>> {
    let mut stage = StageHandle::new("file", token.clone(), |files| files);
    stage.spawn(move |published| {
        for path in inputs {
            diagnostics.emit(&path);
            let target = ReadTarget::new(path);
            select! {
                recv(token.done()) -> _ => return Err(cancelled(&token)),
                send(targets, target) -> sent => {
                    // Every scan worker is gone; the token says why.
                    if sent.is_err() {
                        return Err(cancelled(&token));
                    }
                }
            }
            published.fetch_add(1, Ordering::SeqCst);
        }
        log::debug!("Published {} inputs", published.load(Ordering::SeqCst));
        Ok(())
    })?;
    Ok(stage)
}
