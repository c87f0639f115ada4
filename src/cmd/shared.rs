/*!
shared.rs - shared helpers for subcommands.

Focus:
  - runtime(): Tokio runtime for the sync command entry points
  - parse_params / load_param_file / merge_arguments: build a tool argument object
  - spawn_child_service: spawn an MCP server process as a client session
*/

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/* ---- Runtime ---- */

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")
}

/* ---- Tool Arguments ---- */

/// Parse repeated `KEY=VALUE` flags. Values are trimmed; empty keys are rejected.
pub fn parse_params(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut provided = HashMap::new();
    for kv in raw {
        let Some((k, v)) = kv.split_once('=') else {
            bail!("invalid --param (expected KEY=VALUE): {kv}");
        };
        let key = k.trim();
        if key.is_empty() {
            bail!("invalid --param (empty key): {kv}");
        }
        provided.insert(key.to_string(), v.trim().to_string());
    }
    Ok(provided)
}

/// Read a JSON or YAML argument object. Values keep their parsed type, so a
/// non-string `project_repository` is reported by the tool like any other caller's.
pub fn load_param_file(path: &Path) -> Result<Map<String, Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read param file: {}", path.display()))?;
    // JSON documents are valid YAML.
    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse param file: {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => bail!("param file root must be an object"),
    }
}

/// File arguments overlaid with `--param` values, which are always strings.
pub fn merge_arguments(
    mut file: Map<String, Value>,
    params: HashMap<String, String>,
) -> Map<String, Value> {
    for (k, v) in params {
        file.insert(k, Value::String(v));
    }
    file
}

/* ---- Child MCP Server ---- */

/// Spawn `program args..` as an MCP server over stdio and complete the handshake.
pub async fn spawn_child_service(
    program: &Path,
    args: &[String],
    env: &[(String, String)],
) -> Result<rmcp::service::RunningService<rmcp::RoleClient, ()>> {
    use rmcp::ServiceExt;
    use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
    use tokio::process::Command;

    let service = ()
        .serve(TokioChildProcess::new(Command::new(program).configure(
            |c| {
                c.args(args);
                for (k, v) in env {
                    c.env(k, v);
                }
                // Child logs stay out of our output.
                c.stderr(std::process::Stdio::null());
            },
        ))?)
        .await
        .with_context(|| format!("Failed to spawn MCP process: {}", program.display()))?;
    Ok(service)
}

/// Return a cloned vector of tool objects from a JSON value containing a `tools` array.
pub fn extract_tool_array(value: &Value) -> Vec<Value> {
    value
        .get("tools")
        .and_then(|v| v.as_array())
        .map(|arr| arr.to_vec())
        .unwrap_or_default()
}

/// One-line `name:type` summary of a tool's input properties.
pub fn param_summary(tool: &Value) -> String {
    let mut pairs = Vec::new();
    if let Some(props) = tool
        .get("inputSchema")
        .and_then(|s| s.get("properties"))
        .and_then(|v| v.as_object())
    {
        for (pname, pobj) in props {
            let ptype = pobj.get("type").and_then(|v| v.as_str()).unwrap_or("any");
            pairs.push(format!("{pname}:{ptype}"));
        }
    }
    if pairs.is_empty() {
        "-".to_string()
    } else {
        pairs.join(", ")
    }
}
