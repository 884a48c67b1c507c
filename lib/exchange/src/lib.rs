//! # Ekara Exchange
//!
//! The Exchange-Folder Manager (C1): a scoped directory with `input/`,
//! `output/`, `log/` children, created lazily and owned by the single
//! step that created it (§3, §6). Exchange folders are never reused
//! across steps and their contents are left on disk after completion for
//! inspection (or post-mortem on cancellation, §5).

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
  #[error("failed to create exchange folder at {path}: {source}")]
  Create {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to write {path}: {source}")]
  Write {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to serialize base params: {0}")]
  Serialize(#[from] serde_yaml_ng::Error),
}

/// A single step's scratch directory. `root` is `<launchRoot>/<stepName>`.
#[derive(Debug, Clone)]
pub struct ExchangeFolder {
  root: PathBuf,
}

impl ExchangeFolder {
  /// Creates `root/{input,output,log}` under `root`. Lazy: nothing on
  /// disk exists before this call.
  #[tracing::instrument(level = "debug", fields(root = %root.display()))]
  pub fn create(root: &Path) -> Result<Self, ExchangeError> {
    for child in ["input", "output", "log"] {
      std::fs::create_dir_all(root.join(child)).map_err(|source| {
        ExchangeError::Create {
          path: root.join(child).display().to_string(),
          source,
        }
      })?;
    }
    Ok(ExchangeFolder {
      root: root.to_path_buf(),
    })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn input(&self) -> PathBuf {
    self.root.join("input")
  }

  pub fn output(&self) -> PathBuf {
    self.root.join("output")
  }

  pub fn log(&self) -> PathBuf {
    self.root.join("log")
  }

  /// Serializes `value` as YAML and writes it to `input/params.yaml`
  /// (§6 base params schema).
  pub fn write_base_params<T: serde::Serialize>(
    &self,
    value: &T,
  ) -> Result<PathBuf, ExchangeError> {
    let path = self.input().join("params.yaml");
    let yaml = serde_yaml_ng::to_string(value)?;
    std::fs::write(&path, yaml).map_err(|source| ExchangeError::Write {
      path: path.display().to_string(),
      source,
    })?;
    Ok(path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::Serialize;

  #[derive(Serialize)]
  struct Dummy {
    name: String,
  }

  #[test]
  fn create_builds_all_three_children() {
    let tmp = tempfile::tempdir().unwrap();
    let step_root = tmp.path().join("providerSetup");
    let folder = ExchangeFolder::create(&step_root).unwrap();

    assert!(folder.input().is_dir());
    assert!(folder.output().is_dir());
    assert!(folder.log().is_dir());
  }

  #[test]
  fn write_base_params_serializes_to_input_params_yaml() {
    let tmp = tempfile::tempdir().unwrap();
    let folder = ExchangeFolder::create(&tmp.path().join("step")).unwrap();

    let path = folder
      .write_base_params(&Dummy {
        name: "prod".into(),
      })
      .unwrap();

    let content = std::fs::read_to_string(path).unwrap();
    assert!(content.contains("name: prod"));
  }
}
