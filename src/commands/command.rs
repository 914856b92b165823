//! Command trait definition for CLI commands.

use anyhow::Result;

/// Trait implemented by shardsplit CLI commands.
///
/// The `command_line` parameter contains the full invocation, logged for provenance.
pub trait Command {
    #[allow(clippy::missing_errors_doc)]
    fn execute(&self, command_line: &str) -> Result<()>;
}
