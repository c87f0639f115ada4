//! Chalk project pipeline: validate the project path, run chalk, relay output.
//!
//! `run` is the single path both MCP tools and the `call` subcommand go through.

pub mod error;
pub mod invoke;
pub mod operation;
pub mod project;

pub use error::{ErrorKind, ToolError};
pub use invoke::{ChalkCommand, InvocationResult};
pub use operation::Operation;
pub use project::{ProjectRequest, validate};

use tracing::{debug, instrument};

/// Validate `raw_path`, then run `op` against it. Validation failures return
/// before any process is started.
#[instrument(level = "debug", skip(command), fields(program = command.program()))]
pub async fn run(
    command: &ChalkCommand,
    op: Operation,
    raw_path: &str,
) -> Result<InvocationResult, ToolError> {
    let project = validate(raw_path).await?;
    debug!(project = %project, "project validated");
    command.invoke(&project, op).await
}
