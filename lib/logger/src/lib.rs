//! `tracing-subscriber` setup for the `ekara` binary. Grounded on the
//! teacher's logger crate, minus its OpenTelemetry/OTLP layer — this
//! engine has no metrics backend to export to (§9 ambient concerns still
//! get structured logging; they don't get a tracing exporter nobody
//! configured).

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Registry, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Error,
  Warn,
  Info,
  Debug,
  Trace,
}

impl From<Level> for tracing::Level {
  fn from(level: Level) -> Self {
    match level {
      Level::Error => tracing::Level::ERROR,
      Level::Warn => tracing::Level::WARN,
      Level::Info => tracing::Level::INFO,
      Level::Debug => tracing::Level::DEBUG,
      Level::Trace => tracing::Level::TRACE,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdioLogMode {
  Standard,
  Json,
  None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
  pub level: Level,
  pub stdio: StdioLogMode,
  pub pretty: bool,
}

impl Default for LogConfig {
  fn default() -> Self {
    LogConfig {
      level: Level::Info,
      stdio: StdioLogMode::Standard,
      pretty: false,
    }
  }
}

pub fn init(config: &LogConfig) -> anyhow::Result<()> {
  let log_level: tracing::Level = config.level.into();
  let registry = Registry::default().with(LevelFilter::from(log_level));

  match (config.stdio, config.pretty) {
    (StdioLogMode::Standard, true) => registry
      .with(
        tracing_subscriber::fmt::layer()
          .pretty()
          .with_file(false)
          .with_line_number(false),
      )
      .try_init(),
    (StdioLogMode::Standard, false) => registry
      .with(
        tracing_subscriber::fmt::layer()
          .with_file(false)
          .with_line_number(false),
      )
      .try_init(),
    (StdioLogMode::Json, _) => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
    (StdioLogMode::None, _) => Ok(()),
  }
  .context("failed to init logger")
}
