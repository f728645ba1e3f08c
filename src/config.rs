use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api-test.lime-crm.com/api-test/api/v1/";

const API_KEY_VAR: &str = "PROJECT_API_KEY";
const BASE_URL_VAR: &str = "LIME_BASE_URL";
const BIND_ADDR_VAR: &str = "DASHBOARD_BIND_ADDR";
const DEFAULT_YEAR_VAR: &str = "DASHBOARD_DEFAULT_YEAR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("PROJECT_API_KEY is not set")]
    MissingApiKey,
    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub page_limit: u32,
    pub bind_addr: String,
    /// Year used by the monthly and customer-value pages when none is given in the path.
    /// `None` means the current calendar year.
    pub default_year: Option<i32>,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            page_limit: 50,
            bind_addr: "127.0.0.1:5000".to_string(),
            default_year: None,
            request_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("page_limit", &self.page_limit)
            .field("bind_addr", &self.bind_addr)
            .field("default_year", &self.default_year)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Applies environment overrides and checks that the API key is present.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_VAR) {
            self.api_key = key;
        }
        if let Some(url) = lookup(BASE_URL_VAR) {
            self.base_url = url;
        }
        if let Some(addr) = lookup(BIND_ADDR_VAR) {
            self.bind_addr = addr;
        }
        if let Some(year) = lookup(DEFAULT_YEAR_VAR) {
            let parsed = year.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: DEFAULT_YEAR_VAR,
                value: year.clone(),
            })?;
            self.default_year = Some(parsed);
        }

        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if !self.base_url.ends_with('/') {
            self.base_url.push('/');
        }
        Ok(self)
    }

    /// Joins a resource path onto the configured API base URL.
    pub fn resource_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Loads the config file (optional) and overlays `.env` and process environment values.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    dotenv::dotenv().ok();
    read_config_file(Path::new(path))?.with_overrides(|key| std::env::var(key).ok())
}

fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
