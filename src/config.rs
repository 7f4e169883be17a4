use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result, anyhow};

use crate::endpoint::{BackendEndpoint, BACKEND_PORT};

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// On-disk settings, `<config dir>/chefbot/config.json`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::get_config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)
            .with_context(|| format!("writing config file {}", path.display()))?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("chefbot"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

/// Values given on the command line (clap also folds in `CHEFBOT_*` env vars).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend_url: Option<String>,
    pub host: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: BackendEndpoint,
    pub request_timeout: Duration,
}

impl Settings {
    /// Layer overrides over the config file. `env` looks up process
    /// environment variables and is only consulted for the Codespaces host hint.
    pub fn resolve<F>(config: &Config, overrides: &Overrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = overrides
            .backend_url
            .as_deref()
            .or(config.backend_url.as_deref())
            .filter(|u| !u.trim().is_empty());

        let endpoint = match (explicit, overrides.host.as_deref()) {
            (None, None) => match codespaces_host(&env) {
                Some(forwarded) => BackendEndpoint::forwarded(&forwarded)?,
                None => BackendEndpoint::resolve(None, None)?,
            },
            (explicit, host) => BackendEndpoint::resolve(explicit, host)?,
        };

        let timeout_secs = overrides
            .timeout_secs
            .or(config.request_timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(anyhow!("request timeout must be at least one second"));
        }

        Ok(Self {
            endpoint,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Inside a GitHub Codespace the backend is forwarded at
/// `<name>-<port>.<domain>`. The name is kept whole, digits included.
fn codespaces_host<F>(env: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let name = env("CODESPACE_NAME").filter(|s| !s.is_empty())?;
    let domain = env("GITHUB_CODESPACES_PORT_FORWARDING_DOMAIN").filter(|s| !s.is_empty())?;
    Some(format!("{}-{}.{}", name, BACKEND_PORT, domain))
}
