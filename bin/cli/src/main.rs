#[macro_use]
extern crate tracing;

use anyhow::Context;
use ekara_pipeline::{ActionResult, RuntimeContext, SshKeys, TracingNotifier, apply, check, destroy, validate};
use ekara_resolver::{ResolveInput, resolve};
use ekara_scm::{FetchRef, Fetcher};
use tokio_util::sync::CancellationToken;

mod config;

use config::{Command, OutputFormat};

fn log_config(cfg: &config::EngineConfig) -> ekara_logger::LogConfig {
  use ekara_logger::{Level, StdioLogMode};
  let level = match cfg.log_level.as_str() {
    "error" => Level::Error,
    "warn" => Level::Warn,
    "debug" => Level::Debug,
    "trace" => Level::Trace,
    _ => Level::Info,
  };
  let stdio = match cfg.log_stdio.as_str() {
    "json" => StdioLogMode::Json,
    "none" => StdioLogMode::None,
    _ => StdioLogMode::Standard,
  };
  ekara_logger::LogConfig { level, stdio, pretty: cfg.log_pretty }
}

fn read_key(path: &std::path::Path) -> anyhow::Result<String> {
  if path.as_os_str().is_empty() {
    return Ok(String::new());
  }
  std::fs::read_to_string(path).with_context(|| format!("failed to read SSH key at {path:?}"))
}

async fn app() -> anyhow::Result<()> {
  let args = config::cli_args();
  let cfg = config::engine_config();

  ekara_logger::init(&log_config(cfg)).context("failed to init logger")?;

  if cfg.repository.is_empty() {
    anyhow::bail!("no repository configured — pass --repository, set EKARA_REPOSITORY, or add it to a config file");
  }

  let external_vars = args
    .parsed_vars()?
    .into_iter()
    .map(|(k, v)| (k, serde_yaml_ng::Value::String(v)))
    .collect::<indexmap::IndexMap<_, _>>();

  let fetcher = Fetcher::new(cfg.base_dir.clone());
  let main_ref = FetchRef {
    id: "main".to_string(),
    repository: cfg.repository.clone(),
    version: cfg.version.clone(),
    token: cfg.token.clone(),
  };

  info!(repository = %main_ref.repository, "resolving environment");
  let resolved = resolve(&fetcher, ResolveInput { main_ref, external_vars: external_vars.clone() }).await.context("failed to resolve environment")?;

  let ctx = RuntimeContext {
    base_dir: cfg.base_dir.clone(),
    platform: resolved.platform,
    environment: resolved.environment,
    component_order: resolved.component_order,
    ssh: SshKeys { public: read_key(&cfg.ssh_public_key)?, private: read_key(&cfg.ssh_private_key)? },
    extra_vars_literal: String::new(),
    external_vars,
    ansible_playbook_bin: cfg.ansible_playbook_bin.clone(),
    ansible_inventory_bin: cfg.ansible_inventory_bin.clone(),
    timeout: cfg.timeout_secs.map(std::time::Duration::from_secs),
  };

  let notifier = TracingNotifier;
  let cancel = CancellationToken::new();

  let output = args.output.unwrap_or_default();

  match args.command {
    Command::Validate | Command::Check => {
      let mut result = if matches!(args.command, Command::Check) { check(&ctx) } else { validate(&ctx) };
      result.errors = {
        let mut errors = resolved.validation.errors;
        errors.extend(result.errors);
        errors
      };
      print_result(&result, output)?;
      if !result.is_success() {
        std::process::exit(1);
      }
    }
    Command::Apply => {
      if resolved.validation.has_errors() {
        let result = ekara_pipeline::ValidateResult { errors: resolved.validation.errors };
        print_result(&result, output)?;
        std::process::exit(1);
      }
      let result = apply(&ctx, &notifier, &cancel).await?;
      print_result(&result, output)?;
      if !result.is_success() {
        std::process::exit(1);
      }
    }
    Command::Destroy => {
      if resolved.validation.has_errors() {
        let result = ekara_pipeline::ValidateResult { errors: resolved.validation.errors };
        print_result(&result, output)?;
        std::process::exit(1);
      }
      let result = destroy(&ctx, &notifier, &cancel).await?;
      print_result(&result, output)?;
      if !result.is_success() {
        std::process::exit(1);
      }
    }
  }

  Ok(())
}

fn print_result<T: ActionResult + serde::Serialize>(result: &T, output: OutputFormat) -> anyhow::Result<()> {
  match output {
    OutputFormat::Json => println!("{}", result.as_json()?),
    OutputFormat::Yaml => println!("{}", result.as_yaml()?),
    OutputFormat::Text => print!("{}", result.as_plain_text()),
  }
  Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();
  let mut term_signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
  let result = tokio::select! {
    res = tokio::spawn(app()) => res?,
    _ = term_signal.recv() => Ok(()),
  };
  if let Err(err) = &result {
    eprintln!("{}", ekara_model::format_error(err));
  }
  result
}
