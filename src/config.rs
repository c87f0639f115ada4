//! Runtime settings for locating and launching chalk.
//!
//! Resolution order (later wins): defaults → YAML file → `CHALK_MCP_*` env → CLI flags.
//! Resolved once at start-up into a [`ChalkCommand`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use shell_words::split as shell_split;

use crate::chalk::ChalkCommand;

/// Environment variable naming a settings file.
pub const CONFIG_FILE_ENV: &str = "CHALK_MCP_CONFIG";
pub const ENV_PREFIX: &str = "CHALK_MCP_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// chalk command line; may carry extra leading arguments (`chalk --no-color`).
    pub chalk_command: String,
    /// Directory chalk should read its own settings from.
    pub config_dir: Option<PathBuf>,
    /// Variable used to point chalk at `config_dir`.
    pub config_dir_var: String,
    /// Upper bound on one chalk run. Unset means wait indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chalk_command: "chalk".to_string(),
            config_dir: None,
            config_dir_var: "XDG_CONFIG_HOME".to_string(),
            timeout_secs: None,
        }
    }
}

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub config_file: Option<PathBuf>,
    pub chalk_command: Option<String>,
    pub config_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Resolve settings from the process environment and `overrides`.
    pub fn load(overrides: &SettingsOverrides) -> Result<Self> {
        let env = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();
        Self::load_with(overrides, env)
    }

    /// Same as [`Settings::load`] with an explicit environment.
    pub fn load_with(
        overrides: &SettingsOverrides,
        mut env: HashMap<String, String>,
    ) -> Result<Self> {
        // Names the file layer; not a setting itself.
        let file_from_env = env
            .remove(CONFIG_FILE_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let file = overrides.config_file.clone().or(file_from_env);

        let mut builder = Config::builder()
            .add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = &file {
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Yaml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX.trim_end_matches('_'))
                .ignore_empty(true)
                .source(Some(env)),
        );

        if let Some(c) = &overrides.chalk_command {
            builder = builder.set_override("chalk_command", c.clone())?;
        }
        if let Some(d) = &overrides.config_dir {
            builder = builder.set_override("config_dir", d.to_string_lossy().into_owned())?;
        }
        if let Some(t) = overrides.timeout_secs {
            builder = builder.set_override("timeout_secs", t)?;
        }

        let settings: Settings = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| match &file {
                Some(path) => format!("failed to resolve settings (file: {})", path.display()),
                None => "failed to resolve settings".to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.chalk_command.trim().is_empty() {
            bail!("chalk command is empty");
        }
        if self.config_dir.is_some() && self.config_dir_var.trim().is_empty() {
            bail!("config_dir is set but config_dir_var is empty");
        }
        if self.timeout_secs == Some(0) {
            bail!("timeout_secs must be greater than zero");
        }
        Ok(())
    }

    /// Environment for a child process that should resolve to these same settings.
    pub fn to_env(&self) -> Vec<(String, String)> {
        let mut vars = vec![
            (format!("{ENV_PREFIX}CHALK_COMMAND"), self.chalk_command.clone()),
            (format!("{ENV_PREFIX}CONFIG_DIR_VAR"), self.config_dir_var.clone()),
        ];
        if let Some(d) = &self.config_dir {
            vars.push((format!("{ENV_PREFIX}CONFIG_DIR"), d.display().to_string()));
        }
        if let Some(t) = self.timeout_secs {
            vars.push((format!("{ENV_PREFIX}TIMEOUT_SECS"), t.to_string()));
        }
        vars
    }

    /// Build the launcher used for every request.
    pub fn chalk_command(&self) -> Result<ChalkCommand> {
        let parts = shell_split(self.chalk_command.trim())
            .context("Failed to parse chalk command line (shell splitting)")?;
        let Some((program, args)) = parts.split_first() else {
            bail!("No tokens produced when parsing chalk command");
        };
        if program.is_empty() {
            bail!("Empty program name in chalk command");
        }

        let mut cmd = ChalkCommand::new(program.clone())
            .with_base_args(args.to_vec())
            .with_timeout(self.timeout_secs.map(Duration::from_secs));
        if let Some(dir) = &self.config_dir {
            cmd = cmd.with_env_override(self.config_dir_var.clone(), dir.clone());
        }
        Ok(cmd)
    }
}
