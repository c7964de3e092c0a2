//! Runtime configuration for datastore construction and logging.
//!
//! # Responsibility
//! - Carry the tunables that used to be hard-coded in the store: list cap,
//!   id counter seed and log level.
//! - Load them from JSON and/or environment overrides.
//!
//! # Invariants
//! - Every field has a default, so an empty JSON object is a valid config.
//! - `log_level` is always one of `trace|debug|info|warn|error` after loading.

use crate::logging::{default_log_level, normalize_level};
use crate::repo::entity_store::{DEFAULT_ID_SEED, DEFAULT_LIST_LIMIT};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const ENV_LIST_LIMIT: &str = "TRAINHUB_LIST_LIMIT";
pub const ENV_ID_SEED: &str = "TRAINHUB_ID_SEED";
pub const ENV_LOG_LEVEL: &str = "TRAINHUB_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// JSON document could not be parsed.
    Parse(String),
    /// A setting holds a value outside its accepted range.
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid config document: {message}"),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for config key `{key}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Datastore settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Cap applied by `list` when the caller passes no limit. `0` disables it.
    pub list_limit: usize,
    /// Last id considered issued; the first generated id is `id_seed + 1`.
    pub id_seed: u64,
    pub log_level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            list_limit: DEFAULT_LIST_LIMIT,
            id_seed: DEFAULT_ID_SEED,
            log_level: default_log_level().to_string(),
        }
    }
}

impl StoreConfig {
    /// Parses a JSON config document; missing keys keep their defaults.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(document).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.normalized()
    }

    /// Defaults overridden by `TRAINHUB_*` process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_LIST_LIMIT) {
            self.list_limit = parse_setting(ENV_LIST_LIMIT, &value)?;
        }
        if let Some(value) = lookup(ENV_ID_SEED) {
            self.id_seed = parse_setting(ENV_ID_SEED, &value)?;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        self.normalized()
    }

    fn normalized(mut self) -> Result<Self, ConfigError> {
        self.log_level = normalize_level(&self.log_level)
            .map_err(|_| ConfigError::InvalidValue {
                key: "log_level",
                value: self.log_level.clone(),
            })?
            .to_string();
        Ok(self)
    }
}

fn parse_setting<N: std::str::FromStr>(key: &'static str, value: &str) -> Result<N, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, ENV_LIST_LIMIT, ENV_LOG_LEVEL};

    #[test]
    fn empty_document_uses_defaults() {
        let config = StoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.list_limit, 1000);
        assert_eq!(config.id_seed, 1000);
    }

    #[test]
    fn json_document_overrides_fields_and_normalizes_level() {
        let config =
            StoreConfig::from_json_str(r#"{"list_limit": 50, "log_level": "WARNING"}"#).unwrap();
        assert_eq!(config.list_limit, 50);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn overrides_reject_bad_values() {
        let err = StoreConfig::default()
            .with_overrides(|key| (key == ENV_LIST_LIMIT).then(|| "many".to_string()))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: ENV_LIST_LIMIT,
                value: "many".to_string()
            }
        );

        let err = StoreConfig::default()
            .with_overrides(|key| (key == ENV_LOG_LEVEL).then(|| "loud".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "log_level", .. }));
    }
}
