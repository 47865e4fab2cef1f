//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/foundry-agent/config.toml`
//! 3. Environment variables (after `.env` loading): `PROJECT_ENDPOINT`,
//!    `AGENT_NAME`, `FOUNDRY_*`

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment as EnvSource};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::expand_env_vars;
use crate::infrastructure::traits::Environment;

pub const DEFAULT_AGENT_NAME: &str = "ratemytask";
pub const DEFAULT_API_VERSION: &str = "2025-11-15-preview";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Scope checked by the authentication gate.
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";
/// Scope for calls to the agent service.
pub const AGENT_SCOPE: &str = "https://ai.azure.com/.default";
/// Maximum number of agents shown by `--list`.
pub const LIST_LIMIT: u32 = 50;

/// Timeouts for external processes.
pub mod timeouts {
    use std::time::Duration;

    /// `az --version`
    pub const VERSION_CHECK: Duration = Duration::from_secs(10);
    /// `az account show`
    pub const ACCOUNT_CHECK: Duration = Duration::from_secs(30);
    /// `az account get-access-token`
    pub const TOKEN_FETCH: Duration = Duration::from_secs(60);
    /// `az login` (browser flow)
    pub const INTERACTIVE_LOGIN: Duration = Duration::from_secs(300);
}

/// Environment variable names.
pub mod vars {
    pub const PROJECT_ENDPOINT: &str = "PROJECT_ENDPOINT";
    pub const AGENT_NAME: &str = "AGENT_NAME";
    pub const API_VERSION: &str = "FOUNDRY_API_VERSION";
    pub const TIMEOUT_SECS: &str = "FOUNDRY_TIMEOUT_SECS";
    pub const AZ_PATH: &str = "FOUNDRY_AZ_PATH";
}

/// Raw settings for intermediate parsing (all optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub endpoint: Option<String>,
    pub agent_name: Option<String>,
    pub api_version: Option<String>,
    pub timeout_secs: Option<u64>,
    pub az_path: Option<String>,
}

/// Unified configuration, built once at startup and passed by reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Foundry project endpoint (required before any remote call)
    pub endpoint: Option<String>,
    /// Agent used when `--agent` is not given
    pub agent_name: String,
    /// `api-version` query parameter
    pub api_version: String,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    /// Azure CLI executable
    pub az_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: None,
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            az_path: "az".to_string(),
        }
    }
}

/// Get the XDG config directory for foundry-agent. Also the "tool root" `.env` location.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "foundry-agent").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load a TOML file into RawSettings.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Trim, drop empty, and strip trailing slashes from an endpoint.
fn normalize_endpoint(raw: Option<String>) -> Option<String> {
    raw.map(|e| e.trim().trim_end_matches('/').to_string())
        .filter(|e| !e.is_empty())
}

impl Settings {
    /// Endpoint, or `MissingEndpoint` if absent.
    pub fn endpoint(&self) -> Result<&str, ApplicationError> {
        self.endpoint
            .as_deref()
            .ok_or(ApplicationError::MissingEndpoint)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Expand `~` and `$VAR` in path-like fields.
    fn expand_paths(&mut self) {
        self.az_path = expand_env_vars(&self.az_path);
    }

    /// Overlay a raw config onto self; fields present in the overlay win.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            endpoint: overlay.endpoint.clone().or_else(|| self.endpoint.clone()),
            agent_name: overlay
                .agent_name
                .clone()
                .unwrap_or_else(|| self.agent_name.clone()),
            api_version: overlay
                .api_version
                .clone()
                .unwrap_or_else(|| self.api_version.clone()),
            timeout_secs: overlay.timeout_secs.unwrap_or(self.timeout_secs),
            az_path: overlay.az_path.clone().unwrap_or_else(|| self.az_path.clone()),
        }
    }

    /// Load settings from defaults, the global config file and the process environment.
    pub fn load(env: &dyn Environment) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), env.vars())
    }

    /// Load settings with an explicit global config path and variable snapshot.
    pub fn load_from(
        global_config: Option<&Path>,
        env_vars: HashMap<String, String>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(path) = global_config {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current, env_vars)?;
        current.endpoint = normalize_endpoint(current.endpoint.take());
        current.expand_paths();

        Ok(current)
    }

    /// Apply environment variables as explicit overrides. Empty values are ignored.
    fn apply_env_overrides(
        settings: Self,
        env_vars: HashMap<String, String>,
    ) -> Result<Self, ApplicationError> {
        let source: config::Map<String, String> = env_vars
            .into_iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();

        // Keys are lowercased by the config crate
        let config = Config::builder()
            .add_source(EnvSource::default().source(Some(source)))
            .build()
            .map_err(config_err)?;

        let lookup = |name: &str| config.get_string(&name.to_lowercase()).ok();

        let timeout_secs = match lookup(vars::TIMEOUT_SECS) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|e| ApplicationError::Config {
                message: format!("{}={}: {}", vars::TIMEOUT_SECS, raw, e),
            })?),
            None => None,
        };

        let overlay = RawSettings {
            endpoint: lookup(vars::PROJECT_ENDPOINT),
            agent_name: lookup(vars::AGENT_NAME),
            api_version: lookup(vars::API_VERSION),
            timeout_secs,
            az_path: lookup(vars::AZ_PATH),
        };
        Ok(settings.merge_with(&overlay))
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
