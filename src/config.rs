//! Configuration management for TrinityChain primitives

use crate::error::ConfigError;
use crate::rlp::pool::{DEFAULT_ARENA_CAPACITY, DEFAULT_MAX_IDLE};
use crate::rlp::{DecodeOptions, DEFAULT_MAX_DEPTH};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub decoder: DecoderConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle: usize,
    #[serde(default = "default_arena_capacity")]
    pub arena_capacity: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub strict_lengths: bool,
}

impl DecoderConfig {
    pub fn options(&self) -> DecodeOptions {
        DecodeOptions {
            max_depth: self.max_depth,
            strict_lengths: self.strict_lengths,
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            pool_max_idle: default_pool_max_idle(),
            arena_capacity: default_arena_capacity(),
            max_depth: default_max_depth(),
            strict_lengths: false,
        }
    }
}

fn default_pool_max_idle() -> usize {
    DEFAULT_MAX_IDLE
}

fn default_arena_capacity() -> usize {
    DEFAULT_ARENA_CAPACITY
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Load configuration from a TOML file, falling back to defaults when the
/// file does not exist.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let config = match fs::read_to_string(path.as_ref()) {
        Ok(config_str) => toml::from_str(&config_str)?,
        Err(e) if e.kind() == ErrorKind::NotFound => Config::default(),
        Err(e) => return Err(e.into()),
    };

    // Validate critical values
    if config.decoder.pool_max_idle == 0 {
        return Err(ConfigError::Invalid(
            "decoder.pool_max_idle must be at least 1".to_string(),
        ));
    }

    if config.decoder.max_depth == 0 {
        return Err(ConfigError::Invalid(
            "decoder.max_depth must be at least 1".to_string(),
        ));
    }

    Ok(config)
}
