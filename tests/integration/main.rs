//! Integration tests for the shardsplit library and binary.
//!
//! These tests run whole splits, through the library API against in-memory and on-disk
//! file systems and through the compiled binary.

mod helpers;
mod test_split_command;
