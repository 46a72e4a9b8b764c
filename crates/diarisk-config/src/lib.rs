use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const MODEL_PATH_VAR: &str = "DIARISK_MODEL_PATH";
pub const ENCODER_PATH_VAR: &str = "DIARISK_ENCODER_PATH";
pub const RESPONSE_MODE_VAR: &str = "DIARISK_RESPONSE_MODE";
pub const BIND_ADDR_VAR: &str = "DIARISK_BIND_ADDR";

const DEFAULT_MODEL_PATH: &str = "artifacts/diabetes_model.json";
const DEFAULT_ENCODER_PATH: &str = "artifacts/label_encoder.json";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Unknown response mode: {0} (expected 'probability' or 'classification')")]
    UnknownMode(String),

    #[error("Invalid bind address {value}: {reason}")]
    InvalidAddr { value: String, reason: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Response Mode
// ─────────────────────────────────────────────────────────────────────────────

/// Shape of a successful `/predict` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Positive-class percentage plus a recommendation block.
    #[default]
    Probability,
    /// Bare class label.
    Classification,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Probability => "probability",
            ResponseMode::Classification => "classification",
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "probability" => Ok(ResponseMode::Probability),
            "classification" => Ok(ResponseMode::Classification),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Config
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub model_path: PathBuf,
    pub encoder_path: PathBuf,
    pub response_mode: ResponseMode,
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`; missing keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let response_mode = match get(RESPONSE_MODE_VAR) {
            Some(v) => v.parse()?,
            None => ResponseMode::default(),
        };

        let addr = get(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = addr.parse::<SocketAddr>().map_err(|e: std::net::AddrParseError| ConfigError::InvalidAddr {
            value: addr.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            model_path: get(MODEL_PATH_VAR).unwrap_or_else(|| DEFAULT_MODEL_PATH.into()).into(),
            encoder_path: get(ENCODER_PATH_VAR).unwrap_or_else(|| DEFAULT_ENCODER_PATH.into()).into(),
            response_mode,
            bind_addr,
        })
    }
}
