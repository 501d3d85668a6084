//! Client settings, loadable from TOML.
//!
//! ```toml
//! api_key = "0123abcd"
//! host = "api.themoviedb.org"
//! port = 80
//! language = "en-US"
//! ```
//!
//! Everything but `api_key` has a default.

use std::{fs, io, path::Path};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
  /// The account's v3 API key.
  pub api_key: String,
  /// Catalog host name or dotted-quad address.
  pub host: String,
  pub port: u16,
  /// Result language (`en-US`, `de-DE`, ...). Empty leaves it to the server.
  pub language: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api_key: String::new(),
      host: "api.themoviedb.org".to_owned(),
      port: 80,
      language: String::new(),
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("could not read {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: io::Error,
  },
  #[error("invalid config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("config has no api_key")]
  MissingApiKey,
}

impl Config {
  /// Returns the default settings with `api_key` filled in.
  pub fn with_api_key(api_key: impl Into<String>) -> Self {
    Self { api_key: api_key.into(), ..Self::default() }
  }

  /// Parses settings from TOML text.
  pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
    let config: Config = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
  }

  /// Reads and parses a TOML settings file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.display().to_string(),
      source,
    })?;
    Self::from_toml(&text)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.api_key.trim().is_empty() {
      return Err(ConfigError::MissingApiKey);
    }
    Ok(())
  }
}
