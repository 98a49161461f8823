use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::mindicador_client::DEFAULT_BASE_URL;

pub const API_URL_ENV: &str = "MINDICADOR_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub output_dir: PathBuf,
    pub chart_width: u32,
    pub chart_height: u32,
    /// Unset means requests never time out.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from("output"),
            chart_width: 1200,
            chart_height: 600,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }
        self
    }
}

fn get_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}

pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    let config_str = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
}

/// `config.toml` in the working directory when present, defaults otherwise;
/// `MINDICADOR_API_URL` wins over both.
pub fn load_config() -> anyhow::Result<Config> {
    let path = get_config_path();
    let config = if path.exists() {
        load_config_from(&path)?
    } else {
        log::debug!("No {} found, using defaults", path.display());
        Config::default()
    };
    Ok(config.apply_env())
}
