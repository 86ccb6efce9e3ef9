//! Runtime configuration: an optional TOML file layered under `HIROBA_*`
//! environment variables.
//!
//! Nested keys use a double underscore, e.g.
//! `HIROBA_LIFECYCLE__CLOSE_AFTER_DAYS=14`.

use std::path::{Path, PathBuf};

use hiroba_core::lifecycle::LifecyclePolicy;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  #[serde(default = "default_sweep_interval")]
  pub sweep_interval_secs: u64,
  /// Take the client address from `X-Forwarded-For`. Enable only behind a
  /// reverse proxy that overwrites the header.
  #[serde(default)]
  pub trust_forwarded_for: bool,
  #[serde(default)]
  pub lifecycle:           LifecycleConfig,
}

/// Lifecycle thresholds in whole days.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
  pub close_after_days:   u32,
  pub archive_after_days: u32,
  pub purge_after_days:   u32,
}

impl Default for LifecycleConfig {
  fn default() -> Self {
    Self { close_after_days: 30, archive_after_days: 90, purge_after_days: 120 }
  }
}

impl LifecycleConfig {
  pub fn policy(&self) -> hiroba_core::Result<LifecyclePolicy> {
    LifecyclePolicy::from_days(
      self.close_after_days,
      self.archive_after_days,
      self.purge_after_days,
    )
  }
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("hiroba.db") }
fn default_sweep_interval() -> u64 { 3600 }

impl ServerConfig {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("HIROBA")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}
