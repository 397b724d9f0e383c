// config.rs

use crate::midi::{midir_engine::sanitize_port_name, EventKind};
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CLIENT_NAME: &str = "midiroute";
pub const ENV_PREFIX: &str = "MIDIROUTE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid target '{name}': {reason}")]
    InvalidTarget { name: String, reason: String },

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// How a target coerces its shaped value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    Float,
    Int,
    Bool,
}

fn default_min() -> f32 {
    0.0
}

fn default_max() -> f32 {
    1.0
}

/// One mapping target: a device key routed to a named value
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub device: String,
    pub key: u8,
    /// Only events of this kind are accepted when set
    #[serde(default)]
    pub kind: Option<EventKind>,
    #[serde(default, rename = "type")]
    pub value_type: ValueType,
    #[serde(default = "default_min")]
    pub min: f32,
    #[serde(default = "default_max")]
    pub max: f32,
}

fn default_client_name() -> String {
    DEFAULT_CLIENT_NAME.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Device names to bind at startup
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            log_level: default_log_level(),
            devices: Vec::new(),
            targets: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads settings from an optional file, then `MIDIROUTE_*` environment
    /// overrides. The file format follows its extension (toml, yaml, json).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("devices"),
        );

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.normalize_device_names();
        settings.validate()?;

        debug!(
            "Loaded {} target(s) for {} device(s)",
            settings.targets.len(),
            settings.devices.len()
        );
        Ok(settings)
    }

    /// Rewrites device names the way bound port names are written, so
    /// `nano KONTROL` and `nano_KONTROL` refer to the same device
    pub fn normalize_device_names(&mut self) {
        for device in &mut self.devices {
            *device = sanitize_port_name(device);
        }
        for target in &mut self.targets {
            target.device = sanitize_port_name(&target.device);
        }
    }

    /// Target devices that none of the `bound` device names will route to
    pub fn unbound_target_devices(&self, bound: &[String]) -> Vec<String> {
        let mut unbound: Vec<String> = self
            .targets
            .iter()
            .map(|t| t.device.clone())
            .filter(|device| !bound.contains(device))
            .collect();
        unbound.sort();
        unbound.dedup();
        unbound
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.value_type != ValueType::Bool && target.min == target.max {
                return Err(ConfigError::InvalidTarget {
                    name: target.name.clone(),
                    reason: "min and max must differ".to_string(),
                });
            }
            if !seen.insert((target.device.as_str(), target.key)) {
                return Err(ConfigError::InvalidTarget {
                    name: target.name.clone(),
                    reason: format!(
                        "device '{}' key {} is already mapped",
                        target.device, target.key
                    ),
                });
            }
        }
        self.log_level_filter().map(|_| ())
    }

    pub fn log_level_filter(&self) -> Result<log::LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }
}
