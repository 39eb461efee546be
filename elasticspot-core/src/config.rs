//! Process-wide configuration
//!
//! Read once at startup and shared read-only by every invocation.

use std::env;
use std::net::Ipv4Addr;

use thiserror::Error;

/// Environment variable holding the elastic IP to keep associated
pub const ENV_ELASTIC_IP: &str = "ELASTIC_IP";
/// Environment variable holding the AWS region
pub const ENV_REGION: &str = "AWS_REGION";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was not set (or was empty)
    #[error("missing required environment variable: {name}")]
    MissingEnvVar { name: &'static str },

    /// The elastic IP is not an IPv4 literal
    #[error("invalid elastic ip '{value}'")]
    InvalidElasticIp {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Handler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The elastic IP to keep associated, as an IPv4 literal
    pub elastic_ip: String,
    /// AWS region; falls back to the SDK's default chain when unset
    pub region: Option<String>,
}

impl Config {
    /// Build a config from explicit values, validating the elastic IP
    pub fn new(elastic_ip: &str, region: Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            elastic_ip: parse_elastic_ip(elastic_ip)?,
            region: region.filter(|r| !r.is_empty()),
        })
    }

    /// Load configuration from `ELASTIC_IP` and `AWS_REGION`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let elastic_ip = lookup(ENV_ELASTIC_IP)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingEnvVar {
                name: ENV_ELASTIC_IP,
            })?;

        Self::new(&elastic_ip, lookup(ENV_REGION))
    }

    /// Replace the elastic IP
    pub fn with_elastic_ip(mut self, elastic_ip: &str) -> Result<Self, ConfigError> {
        self.elastic_ip = parse_elastic_ip(elastic_ip)?;
        Ok(self)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

fn parse_elastic_ip(value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    trimmed
        .parse::<Ipv4Addr>()
        .map(|_| trimmed.to_string())
        .map_err(|source| ConfigError::InvalidElasticIp {
            value: value.to_string(),
            source,
        })
}
