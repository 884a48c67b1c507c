use std::path::PathBuf;
use std::process::Stdio;

use indexmap::IndexMap;
use tokio::process::Command;

use crate::error::RunnerError;

/// An opaque parsed `ansible-inventory --list` result (§4.7). Consumers
/// that need specific fields reach into the `serde_json::Value`
/// themselves; this crate makes no claim about inventory shape beyond
/// "valid JSON".
#[derive(Debug, Clone, PartialEq)]
pub struct Inventory(pub serde_json::Value);

#[derive(Debug, Clone)]
pub struct InventorySpec {
  pub executable: String,
  pub working_dir: PathBuf,
  pub inventory_paths: Vec<PathBuf>,
  pub env: IndexMap<String, String>,
}

/// Invokes the external inventory tool with the same `-i` discovery as
/// [`crate::playbook::play`], capturing full stdout and parsing it as
/// JSON. Idempotent: running it twice against the same inputs produces
/// the same `Inventory`.
#[tracing::instrument(level = "info", skip(spec))]
pub async fn build_inventory(spec: &InventorySpec) -> Result<Inventory, RunnerError> {
  let mut args = Vec::new();
  for inventory in &spec.inventory_paths {
    args.push("-i".to_string());
    args.push(inventory.display().to_string());
  }
  args.push("--list".to_string());

  let output = Command::new(&spec.executable)
    .args(&args)
    .current_dir(&spec.working_dir)
    .env_clear()
    .envs(&spec.env)
    .stdin(Stdio::null())
    .output()
    .await
    .map_err(|source| RunnerError::Spawn {
      command: spec.executable.clone(),
      source,
    })?;

  if !output.status.success() {
    return Err(RunnerError::Exit(output.status.code().unwrap_or(-1)));
  }

  let value = serde_json::from_slice(&output.stdout)?;
  Ok(Inventory(value))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn parses_stdout_json_from_a_real_subprocess() {
    let tmp = tempfile::tempdir().unwrap();
    let script = tmp.path().join("fake-ansible-inventory.sh");
    std::fs::write(&script, "#!/bin/sh\necho '{\"all\": {\"hosts\": [\"node1\"]}}'\n").unwrap();
    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      let mut perms = std::fs::metadata(&script).unwrap().permissions();
      perms.set_mode(0o755);
      std::fs::set_permissions(&script, perms).unwrap();
    }

    let spec = InventorySpec {
      executable: script.display().to_string(),
      working_dir: tmp.path().to_path_buf(),
      inventory_paths: vec![tmp.path().join("inventory")],
      env: IndexMap::new(),
    };

    let inventory = build_inventory(&spec).await.unwrap();
    assert_eq!(inventory.0["all"]["hosts"][0], "node1");
  }

  #[tokio::test]
  async fn nonzero_exit_is_reported_as_exit_error() {
    let tmp = tempfile::tempdir().unwrap();
    let script = tmp.path().join("fake-ansible-inventory.sh");
    std::fs::write(&script, "#!/bin/sh\nexit 7\n").unwrap();
    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      let mut perms = std::fs::metadata(&script).unwrap().permissions();
      perms.set_mode(0o755);
      std::fs::set_permissions(&script, perms).unwrap();
    }

    let spec = InventorySpec {
      executable: script.display().to_string(),
      working_dir: tmp.path().to_path_buf(),
      inventory_paths: vec![],
      env: IndexMap::new(),
    };

    let err = build_inventory(&spec).await.unwrap_err();
    assert!(matches!(err, RunnerError::Exit(7)));
  }
}
