use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod chalk;
mod cmd;
mod config;
mod mcp;
mod utils;

use cmd::{CallArgs, CheckArgs, ServeArgs, ToolsArgs};
use config::{Settings, SettingsOverrides};

/// chalk-mcp - MCP server for chalk projects
///
/// Exposes two tools to MCP clients:
///   chalk_features  runs `chalk features --json` in a project
///   chalk_config    runs `chalk config --json` in a project
/// Both take `project_repository`, a directory containing chalk.yml.
///
/// Commands:
///   chalk-mcp [serve]                     MCP server on stdio (default)
///   chalk-mcp tools [--json]              List exposed tools
///   chalk-mcp call <TOOL> --param k=v     Run one tool without a transport
///   chalk-mcp check [PROJECT] [--json]    Round-trip self test over MCP
///
/// Settings (later wins): defaults, YAML file (--config / CHALK_MCP_CONFIG),
/// CHALK_MCP_* environment, flags.
///
/// Examples:
///   chalk-mcp --chalk-command ~/.chalk/bin/chalk-latest --config-dir ~/
///   chalk-mcp call chalk_features --param project_repository=./fraud-template
#[derive(Parser, Debug)]
#[command(
    name = "chalk-mcp",
    version,
    about = "MCP server exposing chalk project features and config",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Settings file (YAML); falls back to CHALK_MCP_CONFIG
    #[arg(long = "config", global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// chalk command line, e.g. "chalk" or "/opt/chalk/bin/chalk --no-color"
    #[arg(long = "chalk-command", global = true, value_name = "CMD")]
    chalk_command: Option<String>,

    /// Directory chalk reads its own settings from (sets XDG_CONFIG_HOME by default)
    #[arg(long = "config-dir", global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Kill chalk runs that take longer than this many seconds
    #[arg(long = "timeout", global = true, value_name = "SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the chalk tools over MCP on stdio
    Serve(ServeArgs),

    /// List the tools this server exposes
    Tools(ToolsArgs),

    /// Run one tool directly
    Call(CallArgs),

    /// Spawn the server as a child and talk MCP to it
    Check(CheckArgs),
}

impl Cli {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            config_file: self.config.clone(),
            chalk_command: self.chalk_command.clone(),
            config_dir: self.config_dir.clone(),
            timeout_secs: self.timeout,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    let settings = Settings::load(&cli.overrides())?;
    tracing::debug!(?settings, "settings resolved");

    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => cmd::execute_serve(args, &settings),
        Commands::Tools(args) => cmd::execute_tools(args, &settings),
        Commands::Call(args) => cmd::execute_call(args, &settings),
        Commands::Check(args) => cmd::execute_check(args, &settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["chalk-mcp"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "chalk-mcp",
            "call",
            "chalk_config",
            "--chalk-command",
            "chalk-latest",
            "--timeout",
            "30",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let o = cli.overrides();
        assert_eq!(o.chalk_command.as_deref(), Some("chalk-latest"));
        assert_eq!(o.timeout_secs, Some(30));
        assert!(matches!(cli.command, Some(Commands::Call(_))));
    }
}
