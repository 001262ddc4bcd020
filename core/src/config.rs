//! Player configuration
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. A TOML file: the explicit path, else `STAGEHAND_CONFIG_PATH`, else an
//!    optional `stagehand.toml` in the working directory
//! 3. `STAGEHAND_*` environment variables, with `__` between nested keys
//!    (`STAGEHAND_KEY__SPEED=2.0`), after `.env` has been loaded

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DemoError, DemoResult};
use crate::script::extract::{DEFAULT_DELIMITER, DEFAULT_IGNORE_NODE, DEFAULT_IGNORE_TREE};
use crate::script::ExtractOptions;

pub const ENV_PREFIX: &str = "STAGEHAND";
pub const CONFIG_PATH_VAR: &str = "STAGEHAND_CONFIG_PATH";
pub const DEFAULT_CONFIG_FILE: &str = "stagehand.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Line prefix that separates fragments
    pub delimiter: String,
    /// Headline prefix that excludes a node and its subtree
    pub ignore_tree_marker: String,
    /// Headline prefix that excludes a single node
    pub ignore_node_marker: String,
    /// Run every step without waiting for commands
    pub auto_run: bool,
    /// Report misuse such as `prev` on the first step
    pub trace: bool,
    /// Release non-retained widgets after every step
    pub step_cleanup: bool,
    pub key: KeyConfig,
    pub host: HostConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            ignore_tree_marker: DEFAULT_IGNORE_TREE.to_string(),
            ignore_node_marker: DEFAULT_IGNORE_NODE.to_string(),
            auto_run: false,
            trace: false,
            step_cleanup: false,
            key: KeyConfig::default(),
            host: HostConfig::default(),
        }
    }
}

/// Simulated typing speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Shortest delay between keys, in seconds
    pub min_delay: f64,
    /// Longest delay between keys, in seconds
    pub max_delay: f64,
    /// Multiplier applied to every delay
    pub speed: f64,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            min_delay: 0.02,
            max_delay: 0.175,
            speed: 1.0,
        }
    }
}

/// Settings for the headless host used by the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Actually sleep on waits instead of only recording them
    pub real_sleep: bool,
    /// Directory images are resolved against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_dir: Option<PathBuf>,
    pub pane_width: i32,
    pub pane_height: i32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            real_sleep: false,
            icon_dir: None,
            pane_width: 800,
            pane_height: 600,
        }
    }
}

impl DemoConfig {
    pub fn builder() -> DemoConfigBuilder {
        DemoConfigBuilder::default()
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            delimiter: self.delimiter.clone(),
            ignore_tree_marker: self.ignore_tree_marker.clone(),
            ignore_node_marker: self.ignore_node_marker.clone(),
        }
    }

    pub fn validate(&self) -> DemoResult<()> {
        if self.delimiter.is_empty() {
            return Err(DemoError::Config("delimiter must not be empty".into()));
        }
        if self.ignore_tree_marker.is_empty() || self.ignore_node_marker.is_empty() {
            return Err(DemoError::Config("ignore markers must not be empty".into()));
        }
        let key = &self.key;
        if !(key.speed > 0.0) {
            return Err(DemoError::Config(format!(
                "key.speed must be positive, got {}",
                key.speed
            )));
        }
        if key.min_delay > 0.0 && key.max_delay > 0.0 && key.min_delay > key.max_delay {
            return Err(DemoError::Config(format!(
                "key.min_delay ({}) exceeds key.max_delay ({})",
                key.min_delay, key.max_delay
            )));
        }
        if self.host.pane_width <= 0 || self.host.pane_height <= 0 {
            return Err(DemoError::Config("host pane size must be positive".into()));
        }
        Ok(())
    }

    /// The effective configuration as a TOML document
    pub fn to_toml(&self) -> DemoResult<String> {
        toml::to_string_pretty(self).map_err(|e| DemoError::Config(e.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct DemoConfigBuilder {
    config_path: Option<PathBuf>,
    env_vars: Option<HashMap<String, String>>,
    skip_dotenv: bool,
}

impl DemoConfigBuilder {
    /// Config file to load; it must exist when given
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Read `STAGEHAND_*` variables from `vars` instead of the process
    /// environment. Also skips `.env`.
    pub fn env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env_vars = Some(vars);
        self.skip_dotenv = true;
        self
    }

    pub fn build(self) -> DemoResult<DemoConfig> {
        if !self.skip_dotenv {
            // A missing .env is normal
            if let Ok(path) = dotenvy::dotenv() {
                debug!(path = %path.display(), "loaded .env");
            }
        }

        let explicit = self.config_path.or_else(|| match &self.env_vars {
            Some(vars) => vars.get(CONFIG_PATH_VAR).map(PathBuf::from),
            None => env::var_os(CONFIG_PATH_VAR).map(PathBuf::from),
        });

        let file = match &explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(DemoError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                debug!(path = %path.display(), "loading config file");
                config::File::from(path.as_path()).required(true)
            }
            None => config::File::with_name(DEFAULT_CONFIG_FILE)
                .format(config::FileFormat::Toml)
                .required(false),
        };

        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(self.env_vars);

        let config: DemoConfig = config::Config::builder()
            .add_source(config::Config::try_from(&DemoConfig::default())?)
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}
