/*!
`call.rs`

Implements the `call` subcommand: runs one chalk tool through the exact
dispatch path an MCP `tools/call` request takes, without a transport.

Parameter injection:
  --param KEY=VALUE               (repeatable, always a string)
  --param-file params.(json|yaml) (values keep their type; --param overrides)

Success prints chalk's output unchanged on stdout. With --json:
{
  "status": "ok",
  "tool": "chalk_features",
  "elapsed_ms": 42,
  "arguments": { "project_repository": "..." },
  "output": "<chalk output>"
}

Errors (--json):
{
  "status": "error",
  "kind": "missing_config_file",
  "error": "project_repository must contain a chalk.yml file",
  "path": "<project_repository, validation failures only>",
  "output": "<captured chalk output, tool failures only>"
}
*/

use anyhow::{Context, Result, bail};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use crate::chalk::{Operation, ToolError};
use crate::cmd::shared::{load_param_file, merge_arguments, parse_params, runtime};
use crate::config::Settings;
use crate::mcp::ChalkServer;

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Tool to invoke (chalk_features | chalk_config)
    #[arg(value_name = "TOOL")]
    pub tool: String,

    /// Provide parameter (KEY=VALUE), repeatable
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Load parameters from file (JSON or YAML). CLI --param overrides file entries
    #[arg(long = "param-file", value_name = "PATH")]
    pub param_file: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute_call(args: CallArgs, settings: &Settings) -> Result<()> {
    let tool_name = args.tool.trim().to_string();
    if tool_name.is_empty() {
        return output_error(args.json, "tool name cannot be empty");
    }
    let Some(op) = Operation::from_tool_name(&tool_name) else {
        return output_error(args.json, &format!("tool '{tool_name}' not found"));
    };

    let params = match parse_params(&args.params) {
        Ok(p) => p,
        Err(e) => return output_error(args.json, &e.to_string()),
    };
    let file_args = match args.param_file.as_deref().map(load_param_file).transpose() {
        Ok(f) => f.unwrap_or_default(),
        Err(e) => return output_error(args.json, &format!("{e:#}")),
    };
    let arguments = merge_arguments(file_args, params);

    let server = ChalkServer::new(settings.chalk_command()?);
    let started = Instant::now();
    let result = runtime()?
        .block_on(server.call_by_name(op.tool_name(), Some(&arguments)))
        .context("tool vanished from router")?;
    let elapsed_ms = started.elapsed().as_millis();

    match result {
        Ok(text) if args.json => {
            let body = serde_json::json!({
                "status": "ok",
                "tool": op.tool_name(),
                "elapsed_ms": elapsed_ms,
                "arguments": arguments,
                "output": text,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Ok(text) => {
            let mut out = std::io::stdout().lock();
            out.write_all(text.as_bytes())?;
            out.flush()?;
            Ok(())
        }
        Err(e) => output_tool_error(args.json, &e),
    }
}

fn output_tool_error(json: bool, err: &ToolError) -> Result<()> {
    if json {
        let mut body = serde_json::json!({
            "status": "error",
            "kind": err.kind().as_str(),
            "error": err.to_string(),
        });
        if let Some(path) = err.path() {
            body["path"] = path.into();
        }
        if let Some(output) = err.output() {
            body["output"] = String::from_utf8_lossy(output).into_owned().into();
        }
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        eprintln!("[{}] {}", err.kind(), err);
    }
    bail!("{} failed: {}", err.kind(), err)
}

fn output_error(json: bool, msg: &str) -> Result<()> {
    if json {
        let err = serde_json::json!({"status": "error", "error": msg});
        println!(
            "{}",
            serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string())
        );
    }
    bail!(msg.to_string())
}
