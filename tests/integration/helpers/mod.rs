//! Helper utilities for integration tests.

pub mod assertions;
pub mod input_generator;
pub mod memory_fs;

pub use assertions::*;
pub use input_generator::*;
pub use memory_fs::*;
