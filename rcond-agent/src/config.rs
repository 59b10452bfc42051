//! Agent configuration.
//!
//! Loaded from a YAML file, then overridden by a fixed set of environment
//! variables (`HOSTNAME`, `RCOND_ADDR`, `RCOND_API_TOKEN`, `CLUSTER_*`).

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Format, Serialized, Yaml},
};
use rcond::{ConnectionSpec, WifiCredentials};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rcond/config.yaml";

/// How an environment override is turned into a configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvKind {
    /// Taken verbatim, even when it looks like a number.
    Text,
    Flag,
    Port,
    /// Comma separated addresses.
    List,
}

/// Environment variables and the configuration keys they override.
const ENV_OVERRIDES: &[(&str, &str, EnvKind)] = &[
    ("HOSTNAME", "hostname", EnvKind::Text),
    ("RCOND_ADDR", "rcond.addr", EnvKind::Text),
    ("RCOND_API_TOKEN", "rcond.api_token", EnvKind::Text),
    ("CLUSTER_ENABLED", "cluster.enabled", EnvKind::Flag),
    ("CLUSTER_NODE_NAME", "cluster.node_name", EnvKind::Text),
    ("CLUSTER_SECRET_KEY", "cluster.secret_key", EnvKind::Text),
    ("CLUSTER_JOIN", "cluster.join", EnvKind::List),
    ("CLUSTER_ADVERTISE_ADDR", "cluster.advertise_addr", EnvKind::Text),
    ("CLUSTER_ADVERTISE_PORT", "cluster.advertise_port", EnvKind::Port),
    ("CLUSTER_BIND_ADDR", "cluster.bind_addr", EnvKind::Text),
    ("CLUSTER_BIND_PORT", "cluster.bind_port", EnvKind::Port),
    ("CLUSTER_LOG_LEVEL", "cluster.log_level", EnvKind::Text),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} not found", .0.display())]
    NotFound(PathBuf),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var}={value:?} is not a valid {expected}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Static hostname applied at startup. Empty leaves it alone.
    pub hostname: String,
    pub rcond: RcondConfig,
    pub network: NetworkConfig,
    pub cluster: ClusterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcondConfig {
    /// Listen address, e.g. `0.0.0.0:8080`.
    pub addr: String,
    /// Value every request must carry in `X-API-Token`.
    pub api_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// SSID and password used when a request leaves them out.
    pub defaults: WifiCredentials,
    /// Profiles synced into NetworkManager at startup.
    pub connections: Vec<ConnectionSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub enabled: bool,
    pub node_name: String,
    pub secret_key: String,
    /// Addresses to join at startup. Accepts a list or a comma separated
    /// string.
    #[serde(deserialize_with = "list_or_csv")]
    pub join: Vec<String>,
    pub advertise_addr: String,
    pub advertise_port: u16,
    pub bind_addr: String,
    pub bind_port: u16,
    pub log_level: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            node_name: String::new(),
            secret_key: String::new(),
            join: Vec::new(),
            advertise_addr: String::new(),
            advertise_port: 0,
            bind_addr: "0.0.0.0".to_string(),
            bind_port: 7946,
            log_level: "INFO".to_string(),
        }
    }
}

fn list_or_csv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrCsv {
        List(Vec<String>),
        Csv(String),
    }

    let entries = match ListOrCsv::deserialize(deserializer)? {
        ListOrCsv::List(list) => list,
        ListOrCsv::Csv(csv) => vec![csv],
    };
    Ok(split_addresses(&entries))
}

/// Splits every entry on commas and drops blanks.
pub fn split_addresses(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(str::to_string)
        .collect()
}

/// Boolean spellings accepted for flags.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// The environment override layer.
///
/// Values are typed per key instead of guessed from their text, so a
/// numeric token or hostname stays a string.
pub fn env_overrides() -> Result<Figment, ConfigError> {
    let mut figment = Figment::new();
    for &(var, key, kind) in ENV_OVERRIDES {
        let Ok(value) = std::env::var(var) else {
            continue;
        };
        let invalid = |expected: &'static str| ConfigError::InvalidEnv {
            var,
            value: value.clone(),
            expected,
        };

        figment = match kind {
            EnvKind::Text => figment.merge(Serialized::default(key, &value)),
            EnvKind::Flag => {
                let flag = parse_flag(&value).ok_or_else(|| invalid("boolean"))?;
                figment.merge(Serialized::default(key, flag))
            }
            EnvKind::Port => {
                let port: u16 = value.trim().parse().map_err(|_| invalid("port"))?;
                figment.merge(Serialized::default(key, port))
            }
            EnvKind::List => {
                figment.merge(Serialized::default(key, split_addresses(&[value.clone()])))
            }
        };
    }
    Ok(figment)
}

impl Config {
    /// Loads `path` and applies the environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(path)?.merge(env_overrides()?))
    }

    /// The file layer on top of the defaults, without environment overrides.
    pub fn figment(path: impl AsRef<Path>) -> Result<Figment, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        Ok(Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path)))
    }

    /// Extracts and validates a configuration.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings the agent cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rcond.addr.trim().is_empty() {
            return Err(ConfigError::Missing("rcond.addr"));
        }
        if self.rcond.api_token.is_empty() {
            return Err(ConfigError::Missing("rcond.api_token"));
        }
        Ok(())
    }
}
