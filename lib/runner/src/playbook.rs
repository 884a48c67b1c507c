use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use indexmap::IndexMap;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::RunnerError;
use crate::notifier::Notifier;

const TASK_PREFIX: &str = "TASK [";
const LINE_CHANNEL_CAPACITY: usize = 256;

/// Everything needed to spawn one `play()` invocation (§4.6). `module_paths`
/// and `inventory_paths` are expected to already be the full,
/// declaration-ordered results of walking `componentOrder` with
/// `find_all_in_components` — this crate has no notion of a platform or a
/// component order of its own.
#[derive(Debug, Clone)]
pub struct PlaybookSpec {
  pub executable: String,
  pub working_dir: PathBuf,
  pub playbook_path: PathBuf,
  pub module_paths: Vec<PathBuf>,
  pub inventory_paths: Vec<PathBuf>,
  pub extra_vars_literal: String,
  pub input_dir: PathBuf,
  pub output_dir: PathBuf,
  pub env: IndexMap<String, String>,
  pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayOutcome {
  pub exit_code: i32,
}

fn build_extra_vars(literal: &str, input: &Path, output: &Path) -> String {
  let buffer_id = uuid::Uuid::new_v4();
  let mut parts = Vec::new();
  if !literal.is_empty() {
    parts.push(literal.to_string());
  }
  parts.push(format!("ekara_input={}", input.display()));
  parts.push(format!("ekara_output={}", output.display()));
  parts.push(format!("ekara_buffer={buffer_id}"));
  parts.join(" ")
}

fn build_args(spec: &PlaybookSpec) -> Vec<String> {
  let mut args = Vec::new();

  if !spec.module_paths.is_empty() {
    let joined = spec
      .module_paths
      .iter()
      .map(|p| p.display().to_string())
      .collect::<Vec<_>>()
      .join(":");
    args.push("--module-path".to_string());
    args.push(joined);
  }

  for inventory in &spec.inventory_paths {
    args.push("-i".to_string());
    args.push(inventory.display().to_string());
  }

  args.push("--extra-vars".to_string());
  args.push(build_extra_vars(
    &spec.extra_vars_literal,
    &spec.input_dir,
    &spec.output_dir,
  ));

  args.push(spec.playbook_path.display().to_string());
  args
}

/// Runs `ansible-playbook` (or whatever `spec.executable` names), streaming
/// stdout/stderr and emitting `Detail` notifications on every `TASK [...]`
/// line, per §4.6. A non-zero exit is reported via `PlayOutcome`, not an
/// `Err` — only spawn/pipe failures and cancellation are errors.
#[tracing::instrument(level = "info", skip(notifier, cancel), fields(playbook = %spec.playbook_path.display()))]
pub async fn play(
  spec: &PlaybookSpec,
  notifier: &dyn Notifier,
  cancel: &CancellationToken,
) -> Result<PlayOutcome, RunnerError> {
  if !spec.playbook_path.is_file() {
    return Err(RunnerError::PlaybookNotFound(spec.playbook_path.clone()));
  }

  let args = build_args(spec);

  let mut command = Command::new(&spec.executable);
  command
    .args(&args)
    .current_dir(&spec.working_dir)
    .env_clear()
    .envs(&spec.env)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

  let mut child = command.spawn().map_err(|source| RunnerError::Spawn {
    command: spec.executable.clone(),
    source,
  })?;

  let stdout = child.stdout.take().expect("stdout was piped");
  let stderr = child.stderr.take().expect("stderr was piped");

  let (stdout_tx, mut stdout_rx) = mpsc::channel::<String>(LINE_CHANNEL_CAPACITY);
  let (stderr_tx, mut stderr_rx) = mpsc::channel::<String>(LINE_CHANNEL_CAPACITY);

  let stdout_task = tokio::spawn(drain_lines(stdout, stdout_tx));
  let stderr_task = tokio::spawn(drain_lines(stderr, stderr_tx));

  let deadline = spec.timeout.map(tokio::time::sleep);
  tokio::pin!(deadline);

  let exit_code = loop {
    tokio::select! {
      biased;

      _ = cancel.cancelled() => {
        kill_child(&mut child).await;
        return Err(RunnerError::Cancelled);
      }

      _ = async { deadline.as_mut().as_pin_mut().unwrap().await }, if deadline.is_some() => {
        kill_child(&mut child).await;
        return Err(RunnerError::Cancelled);
      }

      Some(line) = stdout_rx.recv() => {
        tracing::info!(target: "ekara_runner::stdout", "{line}");
        if let Some(rest) = line.strip_prefix(TASK_PREFIX) {
          notifier.detail(rest.trim_end_matches(']'));
        }
      }

      Some(line) = stderr_rx.recv() => {
        tracing::debug!(target: "ekara_runner::stderr", "{line}");
      }

      status = child.wait() => {
        let status = status?;
        break status.code().unwrap_or(-1);
      }
    }
  };

  // Drain whatever's left so no buffered line is lost once the child has
  // exited.
  while let Some(line) = stdout_rx.recv().await {
    tracing::info!(target: "ekara_runner::stdout", "{line}");
  }
  while let Some(line) = stderr_rx.recv().await {
    tracing::debug!(target: "ekara_runner::stderr", "{line}");
  }
  let _ = stdout_task.await;
  let _ = stderr_task.await;

  Ok(PlayOutcome { exit_code })
}

async fn kill_child(child: &mut tokio::process::Child) {
  let _ = child.start_kill();
  let _ = child.wait().await;
}

async fn drain_lines<R>(reader: R, tx: mpsc::Sender<String>)
where
  R: tokio::io::AsyncRead + Unpin,
{
  let mut lines = BufReader::new(reader).lines();
  while let Ok(Some(line)) = lines.next_line().await {
    if tx.send(line).await.is_err() {
      break;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn task_prefix_is_stripped_to_bare_name() {
    let line = "TASK [deploy stack]";
    let rest = line.strip_prefix(TASK_PREFIX).unwrap();
    assert_eq!(rest.trim_end_matches(']'), "deploy stack");
  }

  #[test]
  fn build_args_joins_module_paths_and_emits_one_dash_i_per_inventory() {
    let spec = PlaybookSpec {
      executable: "ansible-playbook".into(),
      working_dir: PathBuf::from("/tmp/usable"),
      playbook_path: PathBuf::from("/tmp/usable/create.yaml"),
      module_paths: vec![PathBuf::from("/a/modules"), PathBuf::from("/b/modules")],
      inventory_paths: vec![PathBuf::from("/a/inventory"), PathBuf::from("/b/inventory")],
      extra_vars_literal: "foo=bar".into(),
      input_dir: PathBuf::from("/tmp/exchange/input"),
      output_dir: PathBuf::from("/tmp/exchange/output"),
      env: IndexMap::new(),
      timeout: None,
    };

    let args = build_args(&spec);
    assert_eq!(args[0], "--module-path");
    assert_eq!(args[1], "/a/modules:/b/modules");
    assert_eq!(args[2], "-i");
    assert_eq!(args[3], "/a/inventory");
    assert_eq!(args[4], "-i");
    assert_eq!(args[5], "/b/inventory");
    assert_eq!(args[6], "--extra-vars");
    assert!(args[7].starts_with("foo=bar ekara_input="));
    assert!(args[7].contains("ekara_output="));
    assert!(args[7].contains("ekara_buffer="));
    assert_eq!(args[8], "/tmp/usable/create.yaml");
  }

  #[tokio::test]
  async fn missing_playbook_is_reported_before_spawning() {
    let tmp = tempfile::tempdir().unwrap();
    let spec = PlaybookSpec {
      executable: "ansible-playbook".into(),
      working_dir: tmp.path().to_path_buf(),
      playbook_path: tmp.path().join("missing.yaml"),
      module_paths: vec![],
      inventory_paths: vec![],
      extra_vars_literal: String::new(),
      input_dir: tmp.path().join("input"),
      output_dir: tmp.path().join("output"),
      env: IndexMap::new(),
      timeout: None,
    };

    let notifier = crate::notifier::NoopNotifier;
    let cancel = CancellationToken::new();
    let err = play(&spec, &notifier, &cancel).await.unwrap_err();
    assert!(matches!(err, RunnerError::PlaybookNotFound(_)));
  }

  #[tokio::test]
  async fn streams_task_lines_and_reports_exit_code_from_a_real_subprocess() {
    let tmp = tempfile::tempdir().unwrap();
    let playbook = tmp.path().join("create.yaml");
    std::fs::write(&playbook, "- hosts: all\n").unwrap();

    let script = tmp.path().join("fake-ansible-playbook.sh");
    std::fs::write(
      &script,
      "#!/bin/sh\necho 'TASK [say hello]'\necho 'oops' 1>&2\nexit 3\n",
    )
    .unwrap();
    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      let mut perms = std::fs::metadata(&script).unwrap().permissions();
      perms.set_mode(0o755);
      std::fs::set_permissions(&script, perms).unwrap();
    }

    let spec = PlaybookSpec {
      executable: script.display().to_string(),
      working_dir: tmp.path().to_path_buf(),
      playbook_path: playbook,
      module_paths: vec![],
      inventory_paths: vec![],
      extra_vars_literal: String::new(),
      input_dir: tmp.path().join("input"),
      output_dir: tmp.path().join("output"),
      env: IndexMap::new(),
      timeout: Some(Duration::from_secs(5)),
    };

    let notifier = crate::notifier::NoopNotifier;
    let cancel = CancellationToken::new();
    let outcome = play(&spec, &notifier, &cancel).await.unwrap();
    assert_eq!(outcome.exit_code, 3);
  }
}
