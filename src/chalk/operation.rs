/*!
Operation enum: which chalk subcommand a tool call runs.

Variants:
  features (`chalk features --json`, tool `chalk_features`)
  config   (`chalk config --json`,   tool `chalk_config`)

Helpers:
  - variants()
  - from_tool_name()
  - tool_name() / args() / argument_description()
*/

use std::fmt;

/// Flag appended to every chalk invocation so the output is machine readable.
pub const JSON_FLAG: &str = "--json";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Operation {
    /// List the features defined in a chalk project
    Features,
    /// Dump the resolved chalk project config
    Config,
}

impl Operation {
    /// All variants, in tool listing order.
    pub const fn variants() -> &'static [Operation] {
        &[Operation::Features, Operation::Config]
    }

    /// Resolve an MCP tool name (`chalk_features`, `chalk_config`), ignoring case.
    pub fn from_tool_name(name: &str) -> Option<Self> {
        Self::variants()
            .iter()
            .copied()
            .find(|op| op.tool_name().eq_ignore_ascii_case(name.trim()))
    }

    /// The chalk subcommand.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Features => "features",
            Operation::Config => "config",
        }
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            Operation::Features => "chalk_features",
            Operation::Config => "chalk_config",
        }
    }

    /// Description of the `project_repository` argument in the tool schema.
    pub fn argument_description(&self) -> &'static str {
        match self {
            Operation::Features => {
                "Path to the root of the Chalk project on disk to fetch features for. \
                 Should contain a chalk.yml file."
            }
            Operation::Config => {
                "Path to the root of the Chalk project on disk. Should contain a chalk.yml file."
            }
        }
    }

    /// Arguments passed to the chalk binary for this operation.
    pub fn args(&self) -> [&'static str; 2] {
        [self.as_str(), JSON_FLAG]
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Operation;

    #[test]
    fn tool_names_round_trip() {
        for op in Operation::variants() {
            assert_eq!(Operation::from_tool_name(op.tool_name()), Some(*op));
        }
        assert_eq!(
            Operation::from_tool_name("CHALK_CONFIG"),
            Some(Operation::Config)
        );
        assert_eq!(Operation::from_tool_name("features"), None);
    }

    #[test]
    fn args_end_with_json_flag() {
        assert_eq!(Operation::Features.args(), ["features", "--json"]);
        assert_eq!(Operation::Config.args(), ["config", "--json"]);
    }
}
