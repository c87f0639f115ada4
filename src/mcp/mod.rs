//! MCP server exposing the chalk pipeline as two tools.
//!
//! chalk_features / chalk_config -> chalk::run(Operation, project_repository)
//! Served over stdio; `ToolError`s become JSON-RPC errors.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::{
        common::cached_schema_for_type, router::tool::ToolRouter, wrapper::Parameters,
    },
    model::{
        CallToolResult, Content, Implementation, JsonObject, ServerCapabilities, ServerInfo, Tool,
    },
    tool, tool_handler, tool_router,
    transport::stdio,
};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::chalk::project::PROJECT_ARG;
use crate::chalk::{self, ChalkCommand, ErrorKind, Operation, ProjectRequest, ToolError};

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let mut data = json!({ "kind": err.kind().as_str() });
        if let Some(path) = err.path() {
            data["path"] = Value::String(path.to_string());
        }
        if let Some(output) = err.output() {
            data["output"] = Value::String(String::from_utf8_lossy(output).into_owned());
        }
        match err.kind() {
            ErrorKind::ExternalToolFailure => McpError::internal_error(err.to_string(), Some(data)),
            _ => McpError::invalid_params(err.to_string(), Some(data)),
        }
    }
}

/// `ProjectRequest`'s schema with the argument described for `op`.
fn input_schema(op: Operation) -> Arc<JsonObject> {
    let mut schema = cached_schema_for_type::<ProjectRequest>().as_ref().clone();
    if let Some(prop) = schema
        .get_mut("properties")
        .and_then(|p| p.get_mut(PROJECT_ARG))
        .and_then(Value::as_object_mut)
    {
        prop.insert(
            "description".to_string(),
            Value::String(op.argument_description().to_string()),
        );
    }
    Arc::new(schema)
}

#[derive(Clone)]
pub struct ChalkServer {
    command: Arc<ChalkCommand>,
    tool_router: ToolRouter<ChalkServer>,
}

#[tool_router]
impl ChalkServer {
    pub fn new(command: ChalkCommand) -> Self {
        Self {
            command: Arc::new(command),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "chalk_features",
        description = "Get the list of features from a chalk project",
        input_schema = input_schema(Operation::Features)
    )]
    async fn chalk_features(
        &self,
        Parameters(args): Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(Operation::Features, &args).await
    }

    #[tool(
        name = "chalk_config",
        description = "Get the chalk config from a chalk project",
        input_schema = input_schema(Operation::Config)
    )]
    async fn chalk_config(
        &self,
        Parameters(args): Parameters<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(Operation::Config, &args).await
    }
}

impl ChalkServer {
    /// Tools advertised to clients, in registration order.
    pub fn tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    /// Run the pipeline for an already extracted request.
    pub async fn run_tool(
        &self,
        op: Operation,
        request: &ProjectRequest,
    ) -> Result<String, ToolError> {
        let result = chalk::run(&self.command, op, &request.project_repository).await?;
        debug!(
            tool = op.tool_name(),
            status = %result.status,
            bytes = result.output.len(),
            "chalk finished"
        );
        Ok(result.text())
    }

    /// Invoke a tool by name with an untyped argument object, the way a
    /// `tools/call` request arrives. `None` means no such tool.
    pub async fn call_by_name(
        &self,
        name: &str,
        arguments: Option<&Map<String, Value>>,
    ) -> Option<Result<String, ToolError>> {
        let op = Operation::from_tool_name(name)?;
        Some(self.execute(op, arguments).await)
    }

    async fn execute(
        &self,
        op: Operation,
        arguments: Option<&Map<String, Value>>,
    ) -> Result<String, ToolError> {
        let request = ProjectRequest::from_arguments(arguments)?;
        info!(tool = op.tool_name(), project = %request.project_repository, "tool call");
        self.run_tool(op, &request).await
    }

    async fn dispatch(
        &self,
        op: Operation,
        args: &JsonObject,
    ) -> Result<CallToolResult, McpError> {
        match self.execute(op, Some(args)).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => {
                warn!(tool = op.tool_name(), kind = %e.kind(), "tool call failed");
                Err(e.into())
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for ChalkServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Chalk project tools. Pass project_repository, the path of a directory \
                 containing chalk.yml. chalk_features lists features, chalk_config \
                 returns the resolved config. Output is chalk's JSON, unmodified."
                    .into(),
            ),
            ..Default::default()
        }
    }
}

/// Serve on stdin/stdout until the client disconnects or Ctrl-C.
pub async fn serve_stdio(server: ChalkServer) -> Result<()> {
    info!("chalk MCP server listening on stdio");
    let service = server
        .serve(stdio())
        .await
        .context("Failed to initialize MCP session on stdio")?;

    tokio::select! {
        quit = service.waiting() => {
            let reason = quit.context("MCP service task failed")?;
            info!(?reason, "MCP session ended");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;

    fn server() -> ChalkServer {
        ChalkServer::new(ChalkCommand::new("/definitely/not/a/chalk/binary"))
    }

    fn arguments(value: Value) -> Parameters<JsonObject> {
        Parameters(value.as_object().cloned().unwrap())
    }

    fn request(path: &str) -> Parameters<JsonObject> {
        arguments(json!({ "project_repository": path }))
    }

    /// Text of the first content item, read through the wire JSON.
    fn result_text(result: &CallToolResult) -> String {
        let v = serde_json::to_value(result).unwrap();
        v["content"][0]["text"].as_str().unwrap().to_string()
    }

    #[test]
    fn registers_both_tools_with_required_string_arg() {
        let tools = server().tools();
        let values: Vec<Value> = tools
            .iter()
            .map(|t| serde_json::to_value(t).unwrap())
            .collect();
        let mut names: Vec<&str> = values
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, ["chalk_config", "chalk_features"]);

        for t in &values {
            assert!(!t["description"].as_str().unwrap_or("").is_empty());
            let schema = &t["inputSchema"];
            assert_eq!(schema["properties"]["project_repository"]["type"], "string");
            assert_eq!(schema["required"], json!(["project_repository"]));
        }
    }

    #[test]
    fn argument_description_differs_per_tool() {
        let tools: Vec<Value> = server()
            .tools()
            .iter()
            .map(|t| serde_json::to_value(t).unwrap())
            .collect();
        let describe = |name: &str| {
            let tool = tools.iter().find(|t| t["name"] == name).unwrap();
            tool["inputSchema"]["properties"]["project_repository"]["description"]
                .as_str()
                .unwrap()
                .to_string()
        };
        assert!(describe("chalk_features").contains("to fetch features for"));
        assert_eq!(
            describe("chalk_config"),
            "Path to the root of the Chalk project on disk. Should contain a chalk.yml file."
        );
    }

    #[test]
    fn server_info_advertises_tools() {
        let info = server().get_info();
        assert_eq!(info.server_info.name, "chalk-mcp");
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.is_some());
    }

    #[tokio::test]
    async fn missing_project_is_invalid_params() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = server()
            .chalk_features(request(missing.to_str().unwrap()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(err.message, "project_repository must exist");
        let data = err.data.unwrap();
        assert_eq!(data["kind"], "project_not_found");
        assert_eq!(data["path"], missing.to_str().unwrap());
    }

    #[tokio::test]
    async fn malformed_arguments_are_invalid_argument() {
        let s = server();

        let err = s.chalk_features(arguments(json!({}))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(err.message, "missing required parameter: project_repository");
        assert_eq!(err.data.unwrap()["kind"], "invalid_argument");

        let err = s
            .chalk_config(arguments(json!({ "project_repository": 42 })))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(err.message, "project_repository must be a string");
        assert_eq!(err.data.unwrap()["kind"], "invalid_argument");
    }

    #[test]
    fn any_argument_object_reaches_the_handler() {
        // Decoding into the handler's parameter type never rejects an object.
        for raw in [json!({}), json!({ "project_repository": 42 })] {
            let Parameters(args): Parameters<JsonObject> =
                serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(Value::Object(args), raw);
        }
    }

    #[tokio::test]
    async fn project_without_marker_is_invalid_params() {
        let dir = tempfile::tempdir().unwrap();
        let err = server()
            .chalk_config(request(dir.path().to_str().unwrap()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(err.message, "project_repository must contain a chalk.yml file");
        assert_eq!(err.data.unwrap()["kind"], "missing_config_file");
    }

    #[tokio::test]
    async fn call_by_name_checks_arguments_first() {
        let s = server();
        assert!(s.call_by_name("chalk_deploy", None).await.is_none());

        let err = s.call_by_name("chalk_features", None).await.unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let args = json!({"project_repository": ["not", "a", "string"]});
        let err = s
            .call_by_name("CHALK_CONFIG", args.as_object())
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn invalid_argument_maps_to_invalid_params() {
        let err: McpError =
            ToolError::InvalidArgument("project_repository must be a string".into()).into();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        let data = err.data.unwrap();
        assert!(data.get("output").is_none());
        assert!(data.get("path").is_none());
    }

    #[cfg(unix)]
    mod with_fake_chalk {
        use super::*;
        use crate::chalk::invoke::tests::{fake_chalk, project_dir, sh_command};

        #[tokio::test]
        async fn success_relays_output_verbatim() {
            let bin = tempfile::tempdir().unwrap();
            let script = fake_chalk(bin.path(), r#"printf '{"ok":true}'"#);
            let proj = project_dir();
            let s = ChalkServer::new(sh_command(&script));

            let res = s
                .chalk_features(request(proj.path().to_str().unwrap()))
                .await
                .unwrap();
            assert_eq!(result_text(&res), r#"{"ok":true}"#);

            let args = json!({"project_repository": proj.path().to_str().unwrap()});
            let text = s
                .call_by_name("chalk_config", args.as_object())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(text, r#"{"ok":true}"#);
        }

        #[tokio::test]
        async fn failing_chalk_is_internal_error_with_output() {
            let bin = tempfile::tempdir().unwrap();
            let script = fake_chalk(bin.path(), "echo 'error: bad config' 1>&2; exit 1");
            let proj = project_dir();
            let s = ChalkServer::new(sh_command(&script));

            let err = s
                .chalk_config(request(proj.path().to_str().unwrap()))
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
            assert!(err.message.contains("error: bad config"));
            let data = err.data.unwrap();
            assert_eq!(data["kind"], "external_tool_failure");
            assert_eq!(data["output"], "error: bad config\n");
        }
    }
}
