use std::time::Duration;

use clap::Parser;
use figment::{Figment, providers::{Env, Toml, Format, Serialized}};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::Level;

/// Command line flags. Anything set here wins over the environment and the
/// config file.
#[derive(Parser, Serialize, Debug, Default)]
#[command(version, about = "Tags Quay builds with their build name")]
pub struct Args {
    /// Quay API token. Must have repository read/write access.
    #[arg(long = "quay-token", env = "QUAY_TOKEN", hide_env_values = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quay_token: Option<String>,
    /// Quay API url.
    #[arg(long = "quay-url")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quay_url: Option<String>,
    #[arg(long = "listen-address")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_address: Option<String>,
    #[arg(long = "listen-port")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
    /// Path of an optional toml config file.
    #[arg(long = "config-path", env = "QUAY_TAGGER_CONFIG", default_value = "config.toml")]
    #[serde(skip)]
    pub config_path: String,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Human,
    #[default]
    Json,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RollPeriod {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LogConfig {
    /// The minimum level of logging
    #[serde(deserialize_with = "deserialize_log_level", default = "default_log_level")]
    pub level: Level,
    /// The path of the logging file. Logs only go to stdout if this is not set.
    pub path: Option<String>,
    /// The format of the produced logs
    #[serde(default)]
    pub format: LogFormat,
    /// The roll period of the file
    #[serde(default)]
    pub roll_period: RollPeriod,
    pub env_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            path: None,
            format: LogFormat::default(),
            roll_period: RollPeriod::default(),
            env_filter: None,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct TlsConfig {
    pub enable: bool,
    pub key: String,
    pub cert: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default)]
    pub quay_token: String,
    #[serde(default = "default_quay_url")]
    pub quay_url: String,
    /// Timeout for each call to the registry. No timeout when unset.
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub log: LogConfig,
    pub tls: Option<TlsConfig>,
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Result<Self, figment::Error> {
        let path = args.config_path.clone();

        // Merge the config sources, the first one to provide a value wins
        let figment = Figment::new()
            .join(Serialized::defaults(args))
            .join(Env::prefixed("QUAY_TAGGER_"))
            .join(Toml::file(path));

        Self::from_figment(figment)
    }

    fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        let mut config: Config = figment.extract()?;
        if config.quay_url.ends_with('/') {
            config.quay_url = config.quay_url.trim_end_matches('/').to_string();
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    3000
}

fn default_quay_url() -> String {
    "https://quay.io/api/v1".to_string()
}

fn default_log_level() -> Level {
    Level::INFO
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<Level, D::Error>
where D: Deserializer<'de> {
    let s = String::deserialize(deserializer)?.to_lowercase();
    let s = s.as_str();

    match s {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(serde::de::Error::custom(format!("Unknown log level: '{}'", s))),
    }
}
