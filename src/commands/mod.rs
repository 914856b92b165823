//! CLI command implementations for shardsplit.
//!
//! - [`split`] - Split input lines across output shards

#![allow(clippy::missing_errors_doc, clippy::must_use_candidate, clippy::uninlined_format_args)]

pub mod command;
pub mod common;
pub mod split;
