use std::path::Path;

use chrono::TimeDelta;
use serde::Deserialize;
use tracing::info;

use capsule_core::app::CapsuleServiceBuilder;

use crate::error::ServerError;

/// Top-level configuration, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct CapsuleConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Capsule rules.
    #[serde(default)]
    pub capsules: CapsulesConfig,
}

/// Configuration for the HTTP listener.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory with the frontend. Unknown paths fall back to its
    /// `index.html`.
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    5000
}

#[derive(Debug, Deserialize)]
pub struct CapsulesConfig {
    /// Minimum minutes between creation and unlock.
    #[serde(default = "default_min_lead_minutes")]
    pub min_lead_minutes: i64,
    /// Seed for fragment placement. Unset means OS entropy.
    pub placement_seed: Option<u64>,
}

impl Default for CapsulesConfig {
    fn default() -> Self {
        Self {
            min_lead_minutes: default_min_lead_minutes(),
            placement_seed: None,
        }
    }
}

fn default_min_lead_minutes() -> i64 {
    5
}

impl CapsuleConfig {
    /// Read `path`, or fall back to defaults if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Service builder with the `[capsules]` section applied.
    pub fn service_builder(&self) -> Result<CapsuleServiceBuilder, ServerError> {
        let minutes = self.capsules.min_lead_minutes;
        let min_lead = TimeDelta::try_minutes(minutes).ok_or_else(|| {
            ServerError::Config(format!("capsules.min_lead_minutes out of range: {minutes}"))
        })?;
        let builder = CapsuleServiceBuilder::new().min_lead(min_lead);
        Ok(match self.capsules.placement_seed {
            Some(seed) => builder.rng_seed(seed),
            None => builder,
        })
    }
}
