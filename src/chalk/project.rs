//! Request validation: turns a caller-supplied path into a [`ProjectPath`].

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use super::error::ToolError;

/// Marker file every chalk project carries at its root.
pub const MARKER_FILE: &str = "chalk.yml";

/// Name of the single argument both tools accept.
pub const PROJECT_ARG: &str = "project_repository";

/// A directory that existed and contained `chalk.yml` when it was validated.
///
/// Holds the caller's string unmodified; it becomes the child's working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPath(String);

impl ProjectPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool arguments shared by `chalk_features` and `chalk_config`.
///
/// Built from the raw argument object so a missing or mistyped value becomes
/// [`ToolError::InvalidArgument`] rather than a transport decoding error.
#[derive(Debug, Clone, PartialEq, Eq, rmcp::schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct ProjectRequest {
    /// Path to the root of the Chalk project on disk. Should contain a chalk.yml file.
    pub project_repository: String,
}

impl ProjectRequest {
    /// Extract the project argument from an untyped argument object.
    /// Never touches the filesystem.
    pub fn from_arguments(args: Option<&Map<String, Value>>) -> Result<Self, ToolError> {
        match args.and_then(|a| a.get(PROJECT_ARG)) {
            Some(Value::String(s)) => Ok(ProjectRequest {
                project_repository: s.clone(),
            }),
            Some(_) => Err(ToolError::InvalidArgument(format!(
                "{PROJECT_ARG} must be a string"
            ))),
            None => Err(ToolError::InvalidArgument(format!(
                "missing required parameter: {PROJECT_ARG}"
            ))),
        }
    }
}

/// Check that `raw` names an existing entry containing `chalk.yml`.
///
/// An empty string is not special-cased: it fails the existence check like
/// any other unresolvable path. Any stat error counts as "does not exist".
pub async fn validate(raw: &str) -> Result<ProjectPath, ToolError> {
    if let Err(e) = tokio::fs::metadata(raw).await {
        debug!(path = raw, error = %e, "project path not found");
        return Err(ToolError::ProjectNotFound {
            path: raw.to_string(),
        });
    }

    let marker = Path::new(raw).join(MARKER_FILE);
    if let Err(e) = tokio::fs::metadata(&marker).await {
        debug!(path = %marker.display(), error = %e, "chalk.yml not found");
        return Err(ToolError::MissingConfigFile {
            path: raw.to_string(),
        });
    }

    Ok(ProjectPath(raw.to_string()))
}
