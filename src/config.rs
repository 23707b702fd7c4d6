//! Layered configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. a TOML file (`--config`, or `dockwatch.toml` in the working directory if present)
//! 3. `DOCKWATCH_*` environment variables (e.g. `DOCKWATCH_REFRESH_SECS=10`)
//! 4. command-line flags
//!
//! ```toml
//! backend_url = "http://monitoring.local:5000/dashboard/"
//! refresh_secs = 30
//! timeout_secs = 15
//! log_file = "dockwatch.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, Map};
use reqwest::Url;
use serde::Deserialize;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000/dashboard/";
pub const DEFAULT_CONFIG_FILE: &str = "dockwatch.toml";
const ENV_PREFIX: &str = "DOCKWATCH";

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub backend_url: String,
    /// Replaces the port of `backend_url` when set.
    #[serde(default)]
    pub port_override: Option<u16>,
    pub refresh_secs: u64,
    pub timeout_secs: u64,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// Values given on the command line; `None` leaves lower layers in effect.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend_url: Option<String>,
    pub port_override: Option<u16>,
    pub refresh_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from all layers.
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(config_file, overrides, None)
    }

    /// Like [`Settings::load`], reading environment variables from `env`
    /// instead of the process environment when given.
    fn load_with_env(
        config_file: Option<&Path>,
        overrides: &Overrides,
        env: Option<Map<String, String>>,
    ) -> Result<Self> {
        let file = match config_file {
            Some(path) => File::from(path),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = Config::builder()
            .set_default("backend_url", DEFAULT_BACKEND_URL)?
            .set_default("refresh_secs", 30)?
            .set_default("timeout_secs", 15)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true).source(env))
            .set_override_option("backend_url", overrides.backend_url.clone())?
            .set_override_option("port_override", overrides.port_override.map(i64::from))?
            .set_override_option("refresh_secs", overrides.refresh_secs.map(|v| v.to_string()))?
            .set_override_option("timeout_secs", overrides.timeout_secs.map(|v| v.to_string()))?
            .set_override_option(
                "log_file",
                overrides.log_file.as_ref().map(|p| p.display().to_string()),
            )?
            .build()
            .context("failed to read configuration")?;

        let settings: Settings = config
            .try_deserialize()
            .context("invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.refresh_secs == 0 {
            bail!("refresh_secs must be at least 1");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be at least 1");
        }
        self.base_url()?;
        Ok(())
    }

    /// Backend base URL with the port override applied and a trailing slash.
    pub fn base_url(&self) -> Result<String> {
        let mut url = Url::parse(&self.backend_url)
            .with_context(|| format!("invalid backend URL {:?}", self.backend_url))?;

        if let Some(port) = self.port_override {
            if url.set_port(Some(port)).is_err() {
                bail!("cannot set a port on {}", self.backend_url);
            }
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url.to_string())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// UI version shown on the About tab.
///
/// Taken from `DOCKWATCH_VERSION_LABEL` and `DOCKWATCH_COMMIT_ID` at build time.
pub fn version_label() -> String {
    let version = option_env!("DOCKWATCH_VERSION_LABEL").unwrap_or(env!("CARGO_PKG_VERSION"));
    match option_env!("DOCKWATCH_COMMIT_ID") {
        Some(commit) if !commit.is_empty() => format!("{} ({})", version, commit),
        _ => version.to_string(),
    }
}
