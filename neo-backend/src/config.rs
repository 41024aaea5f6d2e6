use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Raw payload log, CSV exports and rendered charts live here
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Empty the raw store before each fetch
    #[serde(default = "default_clear_before_fetch")]
    pub clear_before_fetch: bool,

    #[serde(default)]
    pub nasa: NasaConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// NeoWs feed endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NasaConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Window used when a fetch request names no dates
    #[serde(default = "default_start_date")]
    pub start_date: String,

    #[serde(default = "default_end_date")]
    pub end_date: String,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_cluster_count")]
    pub cluster_count: usize,

    #[serde(default = "default_cluster_seed")]
    pub cluster_seed: u64,

    #[serde(default = "default_forecast_horizon_seconds")]
    pub forecast_horizon_seconds: i64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_clear_before_fetch() -> bool {
    true
}

fn default_base_url() -> String {
    "https://api.nasa.gov/neo/rest/v1/feed".to_string()
}

fn default_api_key() -> String {
    "DEMO_KEY".to_string()
}

fn default_start_date() -> String {
    "2015-09-07".to_string()
}

fn default_end_date() -> String {
    "2015-09-08".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_cluster_count() -> usize {
    neo_core::DEFAULT_CLUSTER_COUNT
}

fn default_cluster_seed() -> u64 {
    neo_core::DEFAULT_SEED
}

fn default_forecast_horizon_seconds() -> i64 {
    neo_core::DEFAULT_HORIZON_SECONDS
}

impl Default for NasaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: default_api_key(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cluster_count: default_cluster_count(),
            cluster_seed: default_cluster_seed(),
            forecast_horizon_seconds: default_forecast_horizon_seconds(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            data_dir: default_data_dir(),
            clear_before_fetch: default_clear_before_fetch(),
            nasa: NasaConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl BackendConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: BackendConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn raw_store_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("raw_payloads.jsonl")
    }

    pub fn export_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("transformed_data.csv")
    }

    pub fn image_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("image_cache")
    }
}

pub static CONFIG: OnceLock<BackendConfig> = OnceLock::new();

/// Load the config file once. A missing file falls back to defaults.
pub fn read_config(path: impl AsRef<Path>) -> anyhow::Result<&'static BackendConfig> {
    let path = path.as_ref();
    let config = if path.exists() {
        BackendConfig::from_file(path)?
    } else {
        BackendConfig::default()
    };

    Ok(CONFIG.get_or_init(|| config))
}
