//! Formatting helpers for log output.
//!
//! Counts are grouped with thousands separators everywhere they are shown to a user, both in
//! log records and in the verbose per-file diagnostics.

use std::time::Duration;

use crate::splitter::SplitSummary;

/// Formats a count with `,` thousands separators.
///
/// # Examples
///
/// ```
/// use shardsplit_lib::logging::format_count;
///
/// assert_eq!(format_count(3), "3");
/// assert_eq!(format_count(10_000), "10,000");
/// assert_eq!(format_count(1_234_567), "1,234,567");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i).is_multiple_of(3) {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Logs a summary of a completed run.
///
/// The last line reports the lines written, the wall time and the write rate, e.g.
/// `Split 2 inputs into 8 shards: 1,000,000 lines in 3.2s (312,500 lines/s)`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn log_split_summary(summary: &SplitSummary, shards: usize, elapsed: Duration) {
    log::info!("Input files: {}", format_count(summary.files));
    log::info!("Lines scanned: {}", format_count(summary.lines_scanned));

    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 { (summary.lines_written as f64 / secs) as u64 } else { 0 };
    log::info!(
        "Split {} inputs into {shards} shards: {} lines in {secs:.1}s ({} lines/s)",
        format_count(summary.files),
        format_count(summary.lines_written),
        format_count(rate)
    );
}
