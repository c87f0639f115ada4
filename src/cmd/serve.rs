/*!
`serve.rs`

Implements the `serve` subcommand (also the default when no subcommand is
given): runs the chalk MCP server on stdio until the client disconnects or
Ctrl-C.

stdout carries JSON-RPC frames only; all logging goes to stderr.
*/

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::cmd::shared::runtime;
use crate::config::Settings;
use crate::mcp::{ChalkServer, serve_stdio};

#[derive(Args, Debug, Default)]
pub struct ServeArgs {}

pub fn execute_serve(_args: ServeArgs, settings: &Settings) -> Result<()> {
    let command = settings.chalk_command()?;
    info!(
        chalk = %settings.chalk_command,
        config_dir = ?settings.config_dir,
        timeout_secs = ?settings.timeout_secs,
        "starting chalk MCP server"
    );
    let server = ChalkServer::new(command);
    runtime()?.block_on(serve_stdio(server))?;
    info!("server shutdown complete");
    Ok(())
}
