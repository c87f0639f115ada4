/*!
`check.rs`

Implements the `check` subcommand: a round-trip self test over a real MCP
transport. Spawns this binary as `serve` in a child process (same settings,
passed through `CHALK_MCP_*` env), completes the handshake, lists the tools
and, when a project is given, calls `chalk_features` on it in the same session.

JSON Output Shape:
{
  "status": "ok",
  "server": { ...peer info... },
  "elapsed_ms": 12,
  "tools": ["chalk_features", "chalk_config"],
  "features": "<chalk output, only with PROJECT>"
}
*/

use anyhow::{Context, Result, bail};
use clap::Args;
use rmcp::RoleClient;
use rmcp::model::CallToolRequestParam;
use rmcp::service::RunningService;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::chalk::Operation;
use crate::cmd::shared::{extract_tool_array, runtime, spawn_child_service};
use crate::config::Settings;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Also call chalk_features on this project over the MCP session
    #[arg(value_name = "PROJECT")]
    pub project: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

/// What the child server reported.
#[derive(Debug)]
struct CheckReport {
    server_info: serde_json::Value,
    tools: Vec<String>,
    features: Option<String>,
    elapsed_ms: u128,
}

pub fn execute_check(args: CheckArgs, settings: &Settings) -> Result<()> {
    let exe = std::env::current_exe().context("Failed to locate own executable")?;
    let child_args = vec!["--quiet".to_string(), "serve".to_string()];
    let env = settings.to_env();

    let report = runtime()?.block_on(run_check(&exe, &child_args, &env, args.project.as_deref()))?;

    if args.json {
        let mut body = serde_json::json!({
            "status": "ok",
            "server": report.server_info,
            "elapsed_ms": report.elapsed_ms,
            "tools": report.tools,
        });
        if let Some(f) = &report.features {
            body["features"] = f.clone().into();
        }
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        let server_name = report
            .server_info
            .pointer("/serverInfo/name")
            .and_then(|v| v.as_str())
            .unwrap_or("<unknown>");
        println!(
            "ok: {server_name} answered in {} ms with {} tools ({})",
            report.elapsed_ms,
            report.tools.len(),
            report.tools.join(", ")
        );
        if let Some(f) = report.features {
            println!("{f}");
        }
    }
    Ok(())
}

async fn run_check(
    exe: &Path,
    child_args: &[String],
    env: &[(String, String)],
    project: Option<&Path>,
) -> Result<CheckReport> {
    let started = Instant::now();
    let service = spawn_child_service(exe, child_args, env).await?;
    let server_info = serde_json::to_value(service.peer_info()).unwrap_or_default();

    let outcome = session(&service, project).await;

    // Attempt graceful shutdown (ignore failure).
    let _ = service.cancel().await;
    let (tools, features) = outcome?;

    Ok(CheckReport {
        server_info,
        tools,
        features,
        elapsed_ms: started.elapsed().as_millis(),
    })
}

/// List tools, confirm both chalk tools are present, optionally call one.
async fn session(
    service: &RunningService<RoleClient, ()>,
    project: Option<&Path>,
) -> Result<(Vec<String>, Option<String>)> {
    let listed = service
        .list_tools(Default::default())
        .await
        .context("Failed to list tools from MCP service")?;
    let tools: Vec<String> = extract_tool_array(&serde_json::to_value(&listed)?)
        .iter()
        .filter_map(|t| t.get("name").and_then(|v| v.as_str()).map(str::to_string))
        .collect();
    for op in Operation::variants() {
        if !tools.iter().any(|n| n == op.tool_name()) {
            bail!("server did not advertise tool '{}'", op.tool_name());
        }
    }

    let Some(path) = project else {
        return Ok((tools, None));
    };
    let mut arguments = serde_json::Map::new();
    arguments.insert(
        "project_repository".to_string(),
        path.display().to_string().into(),
    );
    let result = service
        .call_tool(CallToolRequestParam {
            name: Operation::Features.tool_name().into(),
            arguments: Some(arguments),
        })
        .await
        .context("chalk_features call failed")?;
    Ok((tools, Some(content_text(&serde_json::to_value(&result)?))))
}

/// Concatenated text items of a serialized `CallToolResult`.
fn content_text(result: &serde_json::Value) -> String {
    result
        .get("content")
        .and_then(|c| c.as_array())
        .into_iter()
        .flatten()
        .filter_map(|c| c.get("text").and_then(|t| t.as_str()))
        .collect()
}
