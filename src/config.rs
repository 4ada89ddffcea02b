use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Saved connection defaults. Flags and environment variables always win
/// over these.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub local_addr: Option<String>,
    pub token: Option<String>,
    pub remote_port: Option<u16>,
}

/// Effective connection settings after applying precedence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub local_addr: String,
    pub token: String,
    pub remote_port: u16,
}

impl Config {
    /// Resolve the effective settings: an explicit flag or environment value
    /// wins over the saved default, which wins over the builtin.
    pub fn resolve(
        &self,
        local_addr: Option<String>,
        token: Option<String>,
        remote_port: Option<u16>,
        builtin_remote_port: u16,
    ) -> Settings {
        Settings {
            local_addr: local_addr
                .or_else(|| self.local_addr.clone())
                .unwrap_or_default(),
            token: token.or_else(|| self.token.clone()).unwrap_or_default(),
            remote_port: remote_port
                .or(self.remote_port)
                .unwrap_or(builtin_remote_port),
        }
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().context("Could not find config directory")?;
        path.push("consul-zombie");
        path.push("config.toml");
        Ok(path)
    }
}
