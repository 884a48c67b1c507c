use std::path::PathBuf;
use std::time::Duration;

use ekara_model::{Environment, Params, Platform, Proxy};
use indexmap::IndexMap;
use serde::Serialize;

/// SSH keypair handed to every playbook invocation via `BaseParams` (§6).
#[derive(Debug, Clone, Default, Serialize)]
pub struct SshKeys {
  pub public: String,
  pub private: String,
}

/// Everything an [`crate::action`] needs that isn't already captured by the
/// resolved [`Environment`]/[`Platform`] themselves: where things live on
/// disk, which runner binaries to call, and launch-time extras.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
  pub base_dir: PathBuf,
  pub platform: Platform,
  pub environment: Environment,
  pub component_order: Vec<String>,
  pub ssh: SshKeys,
  pub extra_vars_literal: String,
  pub external_vars: Params,
  pub ansible_playbook_bin: String,
  pub ansible_inventory_bin: String,
  pub timeout: Option<Duration>,
}

impl RuntimeContext {
  /// Root under which every step's named [`ekara_exchange::ExchangeFolder`]
  /// is created (`<baseDir>/launch/<stepName>`, §6).
  pub fn launch_root(&self) -> PathBuf {
    self.base_dir.join("launch")
  }

  pub fn step_root(&self, step_name: &str) -> PathBuf {
    self.launch_root().join(step_name)
  }

  pub fn template_context(&self) -> ekara_model::TemplateContext {
    let mut ctx = ekara_model::TemplateContext::new(self.external_vars.clone());
    ctx.refresh(serde_json::to_value(&self.environment).unwrap_or(serde_json::Value::Null));
    ctx
  }
}

/// `params.yaml` schema (§6): environment metadata, SSH keys, the node
/// set name (empty string outside a node-set-scoped step), plus whatever
/// phase-specific extras the caller adds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BaseParams {
  pub environment: EnvMeta,
  pub nodeset: String,
  pub ssh: SshKeys,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub instances: Option<u32>,
  #[serde(skip_serializing_if = "IndexMap::is_empty")]
  pub labels: IndexMap<String, String>,
  #[serde(skip_serializing_if = "IndexMap::is_empty")]
  pub params: Params,
  #[serde(skip_serializing_if = "Proxy::is_empty")]
  pub proxy: Proxy,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnvMeta {
  pub name: String,
  pub qualifier: String,
}

impl BaseParams {
  pub fn for_environment(env: &Environment, ssh: SshKeys) -> Self {
    BaseParams {
      environment: EnvMeta {
        name: env.name.clone(),
        qualifier: env.qualifier.clone(),
      },
      nodeset: String::new(),
      ssh,
      instances: None,
      labels: IndexMap::new(),
      params: Params::default(),
      proxy: Proxy::default(),
    }
  }
}

/// Builds the env-var map handed verbatim to the runner process: a
/// minimal OS-default subset (so the child can still find binaries and a
/// home directory), the proxy trio, then the target's own declared `env`
/// last so it wins on collision (§6 "the engine's own environment is not
/// inherited").
pub fn build_env_vars(proxy: &Proxy, target_env: &indexmap::IndexMap<String, String>) -> IndexMap<String, String> {
  let mut vars = IndexMap::new();
  for key in ["PATH", "HOME"] {
    if let Ok(value) = std::env::var(key) {
      vars.insert(key.to_string(), value);
    }
  }
  if let Some(v) = &proxy.http_proxy {
    vars.insert("http_proxy".into(), v.clone());
  }
  if let Some(v) = &proxy.https_proxy {
    vars.insert("https_proxy".into(), v.clone());
  }
  if let Some(v) = &proxy.no_proxy {
    vars.insert("no_proxy".into(), v.clone());
  }
  for (k, v) in target_env {
    vars.insert(k.clone(), v.clone());
  }
  vars
}
