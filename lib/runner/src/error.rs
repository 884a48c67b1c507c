use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
  #[error("playbook not found: {0}")]
  PlaybookNotFound(PathBuf),

  #[error("failed to spawn {command}: {source}")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read subprocess output: {0}")]
  Io(#[from] std::io::Error),

  #[error("inventory tool exited with status {0}")]
  Exit(i32),

  #[error("failed to parse inventory JSON: {0}")]
  ParseJson(#[from] serde_json::Error),

  #[error("cancelled")]
  Cancelled,
}
