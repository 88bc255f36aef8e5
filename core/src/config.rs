//! Configuration supplied by the embedding block: which topic it shows and
//! the key it shares with the provider.

use serde::Deserialize;

use crate::errors::ConfigError;
use crate::types::{SharedSecret, TopicId};

pub const ENV_MODULE_ID: &str = "MASTERY_MODULE_ID";
pub const ENV_SHARED_KEY: &str = "MASTERY_SHARED_KEY";

/// Per-instance block configuration.
#[derive(Debug, Clone)]
pub struct BlockConfig {
    pub module_id: TopicId,
    pub shared_key: SharedSecret,
}

#[derive(Deserialize)]
struct RawBlockConfig {
    module_id: String,
    shared_key: String,
}

impl BlockConfig {
    pub fn new(module_id: impl Into<String>, shared_key: impl Into<String>) -> Result<Self, ConfigError> {
        let shared_key: String = shared_key.into();
        Ok(Self { module_id: TopicId::new(module_id)?, shared_key: SharedSecret::new(shared_key)? })
    }

    /// Parse `{"module_id": "...", "shared_key": "..."}`.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawBlockConfig = serde_json::from_str(json).map_err(|e| ConfigError::InvalidBlockConfig(e.to_string()))?;
        Self::new(raw.module_id, raw.shared_key)
    }

    /// Load from `MASTERY_MODULE_ID` and `MASTERY_SHARED_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let module_id = lookup(ENV_MODULE_ID).ok_or(ConfigError::MissingEnv(ENV_MODULE_ID))?;
        let shared_key = lookup(ENV_SHARED_KEY).ok_or(ConfigError::MissingEnv(ENV_SHARED_KEY))?;
        Self::new(module_id, shared_key)
    }
}
