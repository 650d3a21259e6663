// Process-wide configuration, built once at startup

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::utils::error::{Result, ScaffoldError};

/// Directory under the user's home used when `CLI_HOME` is unset
pub const DEFAULT_CLI_HOME: &str = ".scaffold-cli";

/// Registry used when neither the command line nor config.toml names one
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// Name of the optional settings file inside the CLI home
pub const CONFIG_FILE_NAME: &str = "config.toml";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Values supplied on the command line (or through their env fallbacks)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub debug: bool,
    pub target_path: Option<PathBuf>,
    pub cli_home: Option<String>,
    pub registry: Option<String>,
    pub node_bin: Option<PathBuf>,
    pub no_update_check: bool,
}

/// Contents of `<cli home>/config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub registry: Option<String>,
    pub log_level: Option<String>,
    pub node: Option<PathBuf>,
    pub update_check: Option<bool>,
    pub http_timeout_secs: Option<u64>,
}

/// Explicit configuration handed to every component that needs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The user's home directory
    pub home: PathBuf,
    /// Root of everything scaffold keeps on disk
    pub cli_home: PathBuf,
    /// Operator-supplied local package, bypassing the cache entirely
    pub target_path: Option<PathBuf>,
    pub registry: String,
    pub node_bin: PathBuf,
    pub log_level: String,
    pub update_check: bool,
    pub http_timeout: Duration,
}

impl Config {
    /// Build the configuration from the real home directory
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            ScaffoldError::ConfigError("Cannot determine the current user's home directory".to_string())
        })?;
        Self::load_from_home(&home, overrides)
    }

    /// Build the configuration rooted at an explicit home directory
    pub fn load_from_home(home: &Path, overrides: ConfigOverrides) -> Result<Self> {
        if !home.is_dir() {
            return Err(ScaffoldError::ConfigError(format!(
                "Home directory of the current user does not exist: {}",
                home.display()
            )));
        }

        let cli_home = home.join(
            overrides
                .cli_home
                .as_deref()
                .filter(|name| !name.is_empty())
                .unwrap_or(DEFAULT_CLI_HOME),
        );

        let file = ConfigParser::load_config_file(&cli_home.join(CONFIG_FILE_NAME))?;

        let log_level = if overrides.debug {
            "debug".to_string()
        } else {
            file.log_level.clone().unwrap_or_else(|| "info".to_string())
        };

        let config = Self {
            home: home.to_path_buf(),
            cli_home,
            target_path: overrides.target_path.filter(|p| !p.as_os_str().is_empty()),
            registry: overrides
                .registry
                .or(file.registry)
                .unwrap_or_else(|| DEFAULT_REGISTRY.to_string())
                .trim_end_matches('/')
                .to_string(),
            node_bin: overrides
                .node_bin
                .or(file.node)
                .unwrap_or_else(|| PathBuf::from("node")),
            log_level,
            update_check: !overrides.no_update_check && file.update_check.unwrap_or(true),
            http_timeout: Duration::from_secs(
                file.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
        };

        Ok(config)
    }

    /// `<cli home>/dependencies`, the install root of the shared cache
    pub fn dependencies_dir(&self) -> PathBuf {
        self.cli_home.join("dependencies")
    }

    /// `<cli home>/dependencies/node_modules`, the shared store directory
    pub fn store_dir(&self) -> PathBuf {
        self.dependencies_dir().join("node_modules")
    }
}

/// Settings file parsing
pub struct ConfigParser;

impl ConfigParser {
    /// Read config.toml if it exists; a missing file yields defaults
    pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(ConfigFile::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ScaffoldError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_config_file(&content).map_err(|e| match e {
            ScaffoldError::ConfigError(msg) => {
                ScaffoldError::ConfigError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn parse_config_file(content: &str) -> Result<ConfigFile> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| ScaffoldError::ConfigError(format!("Invalid TOML syntax: {e}")))?;

        if let Some(registry) = &file.registry {
            if !(registry.starts_with("http://") || registry.starts_with("https://")) {
                return Err(ScaffoldError::ConfigError(format!(
                    "registry must be an http(s) URL, got '{registry}'"
                )));
            }
        }

        Ok(file)
    }
}
