use std::{path::PathBuf, sync::OnceLock};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use ekara_config::ConfigLoader;
use serde::Deserialize;

pub fn cli_args() -> &'static CliArgs {
  static CLI_ARGS: OnceLock<CliArgs> = OnceLock::new();
  CLI_ARGS.get_or_init(CliArgs::parse)
}

pub fn cli_env() -> &'static Overrides {
  static CLI_ENV: OnceLock<Overrides> = OnceLock::new();
  CLI_ENV.get_or_init(|| match envy::prefixed("EKARA_").from_env().context("failed to parse ekara environment") {
    Ok(env) => env,
    Err(e) => panic!("{e:?}"),
  })
}

pub fn engine_config() -> &'static EngineConfig {
  static ENGINE_CONFIG: OnceLock<EngineConfig> = OnceLock::new();
  ENGINE_CONFIG.get_or_init(|| load_engine_config(cli_args(), cli_env()))
}

#[derive(Parser, Debug)]
#[command(name = "ekara", version, about = "Infrastructure-as-code orchestrator over Ansible")]
pub struct CliArgs {
  /// URL or local path of the environment's main component.
  #[arg(long)]
  pub repository: Option<String>,
  /// Version (branch/tag/ref) of the main component to resolve.
  #[arg(long)]
  pub version: Option<String>,
  /// Token credential used to fetch the main component.
  #[arg(long)]
  pub token: Option<String>,

  #[arg(long)]
  pub base_dir: Option<PathBuf>,
  #[arg(long)]
  pub ssh_public_key: Option<PathBuf>,
  #[arg(long)]
  pub ssh_private_key: Option<PathBuf>,

  /// Extra template variable, `KEY=VALUE`. May be repeated.
  #[arg(long = "var")]
  pub vars: Vec<String>,

  #[arg(long)]
  pub skip_level: Option<u8>,
  #[arg(short = 'v', long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  #[arg(long)]
  pub ansible_playbook_bin: Option<String>,
  #[arg(long)]
  pub ansible_inventory_bin: Option<String>,
  #[arg(long)]
  pub timeout_secs: Option<u64>,

  #[arg(long, value_enum)]
  pub output: Option<OutputFormat>,

  #[arg(long)]
  pub config_paths: Option<Vec<PathBuf>>,
  #[arg(long)]
  pub config_keywords: Option<Vec<String>>,
  #[arg(long)]
  pub debug_startup: Option<bool>,

  #[arg(long)]
  pub log_level: Option<String>,
  #[arg(long)]
  pub log_stdio: Option<String>,
  #[arg(long)]
  pub log_pretty: Option<bool>,

  #[command(subcommand)]
  pub command: Command,
}

impl CliArgs {
  /// `--var KEY=VALUE` pairs, parsed lazily (rather than via a clap
  /// `value_parser`) so a malformed one is reported as a normal startup
  /// error instead of a parse-time panic.
  pub fn parsed_vars(&self) -> anyhow::Result<Vec<(String, String)>> {
    self
      .vars
      .iter()
      .map(|raw| raw.split_once('=').map(|(k, v)| (k.to_string(), v.to_string())).context(format!("expected KEY=VALUE, got '{raw}'")))
      .collect()
  }
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
pub enum Command {
  /// Structural checks only, no subprocess launches.
  #[default]
  Validate,
  /// Same as `validate` today (no dry-run preflight is specified).
  Check,
  /// Provision, configure, and deploy the environment.
  Apply,
  /// Tear the environment's node sets back down.
  Destroy,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
  Yaml,
}

/// Shape shared by the environment layer (parsed by `envy`) and the
/// config-file layer (parsed by [`ekara_config::ConfigLoader`]) — both
/// are partial overrides over [`EngineConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Overrides {
  pub repository: Option<String>,
  pub version: Option<String>,
  pub token: Option<String>,
  pub base_dir: Option<PathBuf>,
  pub ssh_public_key: Option<PathBuf>,
  pub ssh_private_key: Option<PathBuf>,
  pub skip_level: Option<u8>,
  pub verbosity: Option<u8>,
  pub ansible_playbook_bin: Option<String>,
  pub ansible_inventory_bin: Option<String>,
  pub timeout_secs: Option<u64>,
  pub config_paths: Option<Vec<PathBuf>>,
  pub config_keywords: Option<Vec<String>>,
  pub debug_startup: Option<bool>,
  pub merge_nested_config: Option<bool>,
  pub extend_config_arrays: Option<bool>,
  pub log_level: Option<String>,
  pub log_stdio: Option<String>,
  pub log_pretty: Option<bool>,
}

/// The fully merged, final configuration: CLI flags win over environment
/// variables, which win over config file(s), which win over defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  pub repository: String,
  pub version: Option<String>,
  pub token: Option<String>,
  pub base_dir: PathBuf,
  pub ssh_public_key: PathBuf,
  pub ssh_private_key: PathBuf,
  pub skip_level: u8,
  pub verbosity: u8,
  pub ansible_playbook_bin: String,
  pub ansible_inventory_bin: String,
  pub timeout_secs: Option<u64>,
  pub log_level: String,
  pub log_stdio: String,
  pub log_pretty: bool,
}

fn default_config_paths() -> Vec<PathBuf> {
  vec![PathBuf::from("ekara.config.yaml")]
}

fn load_engine_config(args: &CliArgs, env: &Overrides) -> EngineConfig {
  let debug_startup = args.debug_startup.or(env.debug_startup).unwrap_or(false);
  let merge_nested = env.merge_nested_config.unwrap_or(true);
  let extend_array = env.extend_config_arrays.unwrap_or(false);

  let config_paths = args.config_paths.clone().or_else(|| env.config_paths.clone()).unwrap_or_else(default_config_paths);
  let config_keywords = args.config_keywords.clone().or_else(|| env.config_keywords.clone()).unwrap_or_default();

  if debug_startup {
    println!("{}: ekara version: {}", "DEBUG".cyan(), env!("CARGO_PKG_VERSION").blue().bold());
    println!("{}: {}: {config_paths:?}", "DEBUG".cyan(), "config paths".dimmed());
  }

  let file: Overrides = (ConfigLoader {
    paths: &config_paths.iter().map(PathBuf::as_path).collect::<Vec<_>>(),
    match_wildcards: &config_keywords.iter().map(String::as_str).collect::<Vec<_>>(),
    include_file_name: ".ekinclude",
    merge_nested,
    extend_array,
    debug_print: debug_startup,
  })
  .load()
  .unwrap_or_default();

  EngineConfig {
    repository: args.repository.clone().or_else(|| env.repository.clone()).or_else(|| file.repository.clone()).unwrap_or_default(),
    version: args.version.clone().or_else(|| env.version.clone()).or_else(|| file.version.clone()),
    token: args.token.clone().or_else(|| env.token.clone()).or_else(|| file.token.clone()),
    base_dir: args.base_dir.clone().or_else(|| env.base_dir.clone()).or_else(|| file.base_dir.clone()).unwrap_or_else(|| PathBuf::from(".")),
    ssh_public_key: args.ssh_public_key.clone().or_else(|| env.ssh_public_key.clone()).or_else(|| file.ssh_public_key.clone()).unwrap_or_default(),
    ssh_private_key: args.ssh_private_key.clone().or_else(|| env.ssh_private_key.clone()).or_else(|| file.ssh_private_key.clone()).unwrap_or_default(),
    skip_level: args.skip_level.or(env.skip_level).or(file.skip_level).unwrap_or(0),
    verbosity: if args.verbose > 0 { args.verbose } else { env.verbosity.or(file.verbosity).unwrap_or(0) },
    ansible_playbook_bin: args
      .ansible_playbook_bin
      .clone()
      .or_else(|| env.ansible_playbook_bin.clone())
      .or_else(|| file.ansible_playbook_bin.clone())
      .unwrap_or_else(|| "ansible-playbook".to_string()),
    ansible_inventory_bin: args
      .ansible_inventory_bin
      .clone()
      .or_else(|| env.ansible_inventory_bin.clone())
      .or_else(|| file.ansible_inventory_bin.clone())
      .unwrap_or_else(|| "ansible-inventory".to_string()),
    timeout_secs: args.timeout_secs.or(env.timeout_secs).or(file.timeout_secs),
    log_level: args.log_level.clone().or_else(|| env.log_level.clone()).or_else(|| file.log_level.clone()).unwrap_or_else(|| "info".to_string()),
    log_stdio: args.log_stdio.clone().or_else(|| env.log_stdio.clone()).or_else(|| file.log_stdio.clone()).unwrap_or_else(|| "standard".to_string()),
    log_pretty: args.log_pretty.or(env.log_pretty).or(file.log_pretty).unwrap_or(false),
  }
}
