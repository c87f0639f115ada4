/*!
`tools.rs`

Implements the `tools` subcommand: prints the tools this server exposes
(name, parameters, description) without opening a transport.

JSON Output Shape:
{
  "status": "ok",
  "count": 2,
  "tools": [
    { "name": "chalk_features", "description": "...", "inputSchema": { ... } }
  ]
}
*/

use anyhow::Result;
use clap::Args;

use crate::cmd::shared::param_summary;
use crate::config::Settings;
use crate::mcp::ChalkServer;

#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

pub fn execute_tools(args: ToolsArgs, settings: &Settings) -> Result<()> {
    let server = ChalkServer::new(settings.chalk_command()?);
    let tools: Vec<serde_json::Value> = server
        .tools()
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "status": "ok",
                "count": tools.len(),
                "tools": tools,
            }))?
        );
        return Ok(());
    }

    println!("Tools ({})", tools.len());
    for t in &tools {
        let name = t.get("name").and_then(|v| v.as_str()).unwrap_or("<unnamed>");
        let desc = t
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .replace('\n', " ");
        println!("  {name:<16} {:<28} {desc}", param_summary(t));
    }
    Ok(())
}
