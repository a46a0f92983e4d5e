//! Server settings, layered from an optional TOML file and `KVSTORY_*`
//! environment variables.

use std::path::{Path, PathBuf};

use kvstory_core::DEFAULT_NAMESPACE;
use serde::Deserialize;

/// Runtime server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub namespace:  String,
}

impl ServerConfig {
  /// Load configuration from `path` (if it exists) overlaid with environment
  /// variables prefixed `KVSTORY_`.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    Self::builder()?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("KVSTORY"))
      .build()?
      .try_deserialize()
  }

  fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8787)?
      .set_default("store_path", "kvstory.db")?
      .set_default("namespace", DEFAULT_NAMESPACE)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
