//! Typed failures of the validate → invoke pipeline.

use std::fmt;

use thiserror::Error;

/// Discriminant of a [`ToolError`], stable across message wording changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    ProjectNotFound,
    MissingConfigFile,
    ExternalToolFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::ProjectNotFound => "project_not_found",
            ErrorKind::MissingConfigFile => "missing_config_file",
            ErrorKind::ExternalToolFailure => "external_tool_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("project_repository must exist")]
    ProjectNotFound { path: String },

    #[error("project_repository must contain a chalk.yml file")]
    MissingConfigFile { path: String },

    /// The chalk process could not be started, timed out, or exited non-zero.
    /// `output` holds whatever it printed before that happened.
    #[error(
        "failed to run chalk command: {}; stderr: {}",
        .message,
        String::from_utf8_lossy(.output)
    )]
    ExternalToolFailure { message: String, output: Vec<u8> },
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ToolError::ProjectNotFound { .. } => ErrorKind::ProjectNotFound,
            ToolError::MissingConfigFile { .. } => ErrorKind::MissingConfigFile,
            ToolError::ExternalToolFailure { .. } => ErrorKind::ExternalToolFailure,
        }
    }

    /// Captured process output, if this failure carries any.
    pub fn output(&self) -> Option<&[u8]> {
        match self {
            ToolError::ExternalToolFailure { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Project path a validation failure refers to.
    pub fn path(&self) -> Option<&str> {
        match self {
            ToolError::ProjectNotFound { path } | ToolError::MissingConfigFile { path } => {
                Some(path)
            }
            _ => None,
        }
    }

    pub(crate) fn tool_failure(message: impl Into<String>, output: Vec<u8>) -> Self {
        ToolError::ExternalToolFailure {
            message: message.into(),
            output,
        }
    }
}
