use anyhow::{bail, Context, Result};
use feedsync_core::HooksConfig;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Directory under the user config dir holding `config.toml`.
const APP_DIR: &str = "feeds-to-instapaper";

/// Configuration loaded from TOML, with credentials overridable from the
/// environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub instapaper: InstapaperConfig,

    #[serde(default)]
    pub feeds: FeedsConfig,

    #[serde(default)]
    pub hooks: HooksConfig,

    /// Timeout for feed downloads and Instapaper requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstapaperConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedsConfig {
    #[serde(default)]
    pub urls: Vec<String>,
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// XDG config base dir. Relative `XDG_CONFIG_HOME` values are ignored.
fn xdg_config_home(xdg_config_home: Option<OsString>, home: Option<PathBuf>) -> Option<PathBuf> {
    xdg_config_home
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .or_else(|| home.map(|home| home.join(".config")))
}

impl Config {
    /// Return the default config file path:
    /// `$XDG_CONFIG_HOME/feeds-to-instapaper/config.toml`, falling back to
    /// `~/.config/feeds-to-instapaper/config.toml` on every platform.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = xdg_config_home(std::env::var_os("XDG_CONFIG_HOME"), dirs::home_dir())
            .context("could not determine user config directory")?
            .join(APP_DIR);
        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the given path, or the default path, then apply
    /// environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        debug!(?config_path, "Loading config");
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config: {}", config_path.display()))?;
        let mut config = Self::from_toml(&content)
            .with_context(|| format!("failed to parse config: {}", config_path.display()))?;

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override credentials from `lookup`, which maps a variable name to its
    /// value. Empty values are ignored.
    /// Priority: environment > config file.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(username) = lookup("INSTAPAPER_USERNAME") {
            self.instapaper.username = username;
        }
        if let Some(password) = lookup("INSTAPAPER_PASSWORD") {
            self.instapaper.password = password;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.instapaper.username.is_empty() {
            bail!("instapaper username is required (config or INSTAPAPER_USERNAME)");
        }
        if self.instapaper.password.is_empty() {
            bail!("instapaper password is required (config or INSTAPAPER_PASSWORD)");
        }
        if self.feeds.urls.is_empty() {
            bail!("at least one feed url is required in [feeds] urls");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
