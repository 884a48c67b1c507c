use ekara_model::{ComponentRef, Params};
use indexmap::IndexMap;
use serde::Deserialize;

/// Mirrors the YAML shape exactly as written in a descriptor file (§6).
/// Every field is optional: a fragment is a *partial* view, not a complete
/// `Environment`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescriptorRaw {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub qualifier: Option<String>,
  #[serde(default)]
  pub ekara: Option<EkaraRaw>,
  #[serde(default)]
  pub providers: IndexMap<String, ProviderRaw>,
  #[serde(default)]
  pub orchestrator: Option<OrchestratorRaw>,
  #[serde(default)]
  pub nodes: IndexMap<String, NodeSetRaw>,
  #[serde(default)]
  pub stacks: IndexMap<String, StackRaw>,
  #[serde(default)]
  pub tasks: IndexMap<String, TaskRaw>,
  #[serde(default)]
  pub hooks: HooksRaw,
  #[serde(default)]
  pub templates: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EkaraRaw {
  #[serde(default)]
  pub parent: Option<ComponentRef>,
  #[serde(default)]
  pub components: IndexMap<String, ComponentRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderRaw {
  /// Absent when a fragment only overrides params/env/proxy for a
  /// provider that was already declared at a higher level of the parent
  /// chain (ground: `customization_provider_test.go`'s `comp1Content`,
  /// which overrides `providers.p1.params` without repeating
  /// `component:`).
  #[serde(default)]
  pub component: Option<String>,
  #[serde(default)]
  pub params: Params,
  #[serde(default)]
  pub env: ekara_model::EnvMap,
  #[serde(default)]
  pub proxy: ekara_model::Proxy,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrchestratorRaw {
  #[serde(default)]
  pub component: Option<String>,
  #[serde(default)]
  pub params: Params,
  #[serde(default)]
  pub env: ekara_model::EnvMap,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeSetRaw {
  #[serde(default)]
  pub instances: u32,
  #[serde(default)]
  pub labels: IndexMap<String, String>,
  pub provider: String,
  #[serde(default)]
  pub orchestrator: Option<String>,
  #[serde(default)]
  pub hooks: EntityHooksRaw,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StackRaw {
  #[serde(default)]
  pub component: Option<String>,
  #[serde(default)]
  pub params: Params,
  #[serde(default)]
  pub env: ekara_model::EnvMap,
  #[serde(default)]
  pub hooks: EntityHooksRaw,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskRaw {
  pub component: String,
  pub playbook: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HooksRaw {
  #[serde(default)]
  pub init: HookListRaw,
  #[serde(default)]
  pub create: HookListRaw,
  #[serde(default)]
  pub install: HookListRaw,
  #[serde(default)]
  pub deploy: HookListRaw,
  #[serde(default)]
  pub destroy: HookListRaw,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityHooksRaw {
  #[serde(default)]
  pub provision: HookListRaw,
  #[serde(default)]
  pub deploy: HookListRaw,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookListRaw {
  #[serde(default)]
  pub before: Vec<ekara_model::HookEntry>,
  #[serde(default)]
  pub after: Vec<ekara_model::HookEntry>,
}

impl From<HookListRaw> for ekara_model::HookList {
  fn from(raw: HookListRaw) -> Self {
    ekara_model::HookList {
      before: raw.before,
      after: raw.after,
    }
  }
}

impl From<HooksRaw> for ekara_model::GlobalHooks {
  fn from(raw: HooksRaw) -> Self {
    ekara_model::GlobalHooks {
      init: raw.init.into(),
      create: raw.create.into(),
      install: raw.install.into(),
      deploy: raw.deploy.into(),
      destroy: raw.destroy.into(),
    }
  }
}

impl From<EntityHooksRaw> for ekara_model::EntityHooks {
  fn from(raw: EntityHooksRaw) -> Self {
    ekara_model::EntityHooks {
      provision: raw.provision.into(),
      deploy: raw.deploy.into(),
    }
  }
}
