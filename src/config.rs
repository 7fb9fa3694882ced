use crate::api::ResilienceConfig;
use crate::api::resilience::DEFAULT_MAX_ATTEMPTS;
use crate::clone::CloneRequest;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ACCOUNT_ID: &str = "4131139637";
pub const DEFAULT_SOURCE_PUBLIC_ID: &str = "GTM-PR4BRDT";
pub const DEFAULT_DESTINATION_NAME: &str = "Onboarding Container - Ryan (Clone)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub clone: CloneSettings,
    #[serde(default)]
    pub api: ApiSettings,
}

/// Which container to copy and where
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneSettings {
    pub account_id: String,
    pub source_public_id: String,
    pub destination_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_account_id: Option<String>,
}

impl Default for CloneSettings {
    fn default() -> Self {
        Self {
            account_id: DEFAULT_ACCOUNT_ID.to_string(),
            source_public_id: DEFAULT_SOURCE_PUBLIC_ID.to_string(),
            destination_name: DEFAULT_DESTINATION_NAME.to_string(),
            destination_account_id: None,
        }
    }
}

/// Retry and throttling knobs for Tag Manager calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub rate_limit: bool,
    pub requests_per_minute: u32,
    pub burst_capacity: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: 500,
            max_delay_ms: 32_000,
            rate_limit: true,
            requests_per_minute: 15,
            burst_capacity: 5,
        }
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub account_id: Option<String>,
    pub source_public_id: Option<String>,
    pub destination_name: Option<String>,
    pub destination_account_id: Option<String>,
    pub max_attempts: Option<u32>,
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("gtm-clone")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".gtm-clone")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`. A missing
    /// file at the default location means defaults; an explicit path must
    /// exist. Nothing is ever written.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::get_config_path()?, false),
        };
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            if explicit {
                anyhow::bail!("Config file not found: {:?}", config_path);
            }
            info!("No config file at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", config_path))?;

        debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    /// A zero rate or burst would leave the limiter with no tokens to hand out
    pub fn validate(&self) -> Result<()> {
        if self.api.requests_per_minute == 0 {
            anyhow::bail!("[api] requests_per_minute must be at least 1");
        }
        if self.api.burst_capacity == 0 {
            anyhow::bail!("[api] burst_capacity must be at least 1");
        }
        if self.api.max_attempts == 0 {
            anyhow::bail!("[api] max_attempts must be at least 1");
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(account_id) = overrides.account_id {
            self.clone.account_id = account_id;
        }
        if let Some(public_id) = overrides.source_public_id {
            self.clone.source_public_id = public_id;
        }
        if let Some(name) = overrides.destination_name {
            self.clone.destination_name = name;
        }
        if overrides.destination_account_id.is_some() {
            self.clone.destination_account_id = overrides.destination_account_id;
        }
        if let Some(attempts) = overrides.max_attempts {
            self.api.max_attempts = attempts;
        }
    }

    pub fn clone_request(&self) -> CloneRequest {
        CloneRequest {
            account_id: self.clone.account_id.clone(),
            source_public_id: self.clone.source_public_id.clone(),
            destination_name: self.clone.destination_name.clone(),
            destination_account_id: self.clone.destination_account_id.clone(),
        }
    }

    pub fn to_resilience(&self) -> ResilienceConfig {
        ResilienceConfig::builder()
            .max_attempts(self.api.max_attempts)
            .base_delay(Duration::from_millis(self.api.base_delay_ms))
            .max_delay(Duration::from_millis(self.api.max_delay_ms))
            .enable_rate_limiting(self.api.rate_limit)
            .requests_per_minute(self.api.requests_per_minute)
            .burst_capacity(self.api.burst_capacity)
            .build()
    }
}
