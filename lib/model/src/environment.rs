use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{EnvMap, EntityHooks, GlobalHooks, Params, Proxy, reference::ComponentReferencer};

/// The merged declarative model consumed read-only by the action pipeline,
/// once the component resolver closes (§3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Environment {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub qualifier: String,
  #[serde(default)]
  pub providers: IndexMap<String, Provider>,
  #[serde(default)]
  pub orchestrator: Option<Orchestrator>,
  #[serde(default)]
  pub node_sets: IndexMap<String, NodeSet>,
  #[serde(default)]
  pub stacks: IndexMap<String, Stack>,
  #[serde(default)]
  pub hooks: GlobalHooks,
  #[serde(default)]
  pub tasks: IndexMap<String, Task>,
}

impl Environment {
  pub fn new() -> Self {
    Environment::default()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provider {
  pub name: String,
  pub component: String,
  #[serde(default)]
  pub params: Params,
  #[serde(default)]
  pub env: EnvMap,
  #[serde(default)]
  pub proxy: Proxy,
}

impl ComponentReferencer for Provider {
  fn component_id(&self) -> &str {
    &self.component
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Orchestrator {
  pub component: String,
  #[serde(default)]
  pub params: Params,
  #[serde(default)]
  pub env: EnvMap,
}

impl ComponentReferencer for Orchestrator {
  fn component_id(&self) -> &str {
    &self.component
  }
}

/// A reference to the provider managing a node set, resolved through
/// [`crate::Platform`]'s `components`, never through a stored pointer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderRef {
  pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSet {
  pub name: String,
  #[serde(default)]
  pub instances: u32,
  #[serde(default)]
  pub labels: IndexMap<String, String>,
  pub provider: ProviderRef,
  #[serde(default)]
  pub orchestrator: Option<String>,
  #[serde(default)]
  pub hooks: EntityHooks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stack {
  pub name: String,
  #[serde(default)]
  pub component: Option<String>,
  #[serde(default)]
  pub params: Params,
  #[serde(default)]
  pub env: EnvMap,
  #[serde(default)]
  pub hooks: EntityHooks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub component: String,
  pub playbook: String,
}

impl ComponentReferencer for Task {
  fn component_id(&self) -> &str {
    &self.component
  }
}
