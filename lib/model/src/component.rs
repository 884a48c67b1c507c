use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{EnvMap, Proxy};

/// Free-form key/value parameters. Values are kept as YAML scalars/sequences
/// so a descriptor can pass through anything Ansible extra-vars can carry,
/// not just strings.
pub type Params = IndexMap<String, serde_yaml_ng::Value>;

/// A raw, unresolved reference to a component as written in a descriptor's
/// `ekara.components` (or `ekara.parent`) map: `{repository, ref?, auth?}`
/// per §6.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentRef {
  /// Stable id this reference is registered under. For `ekara.parent` this
  /// is synthesized by the resolver; for `ekara.components` entries it is
  /// the map key.
  #[serde(skip)]
  pub id: String,
  pub repository: String,
  #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub auth: Option<Auth>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auth {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub token: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
}

/// A fetchable, mergeable unit participating in the environment build.
///
/// Invariant: `id` is unique process-wide; two [`ComponentRef`]s resolving
/// to the same `id` collapse into one `Component` via [`Component::merge`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
  pub id: String,
  pub repository: String,
  pub version: Option<String>,
  /// Local filesystem root after a successful fetch. `None` until fetched.
  #[serde(skip)]
  pub local_path: Option<PathBuf>,
  pub has_descriptor: bool,
  /// Glob patterns declared under this component's `templates` key.
  /// Re-homed onto the component by the merger (§4.3) rather than merged
  /// into the `Environment`.
  pub templates: Vec<String>,
  pub playbooks: Vec<String>,
  pub params: Params,
  pub env: EnvMap,
  pub proxy: Proxy,
}

impl Component {
  pub fn new(id: impl Into<String>, repository: impl Into<String>) -> Self {
    Component {
      id: id.into(),
      repository: repository.into(),
      ..Default::default()
    }
  }

  pub fn is_templatable(&self) -> bool {
    !self.templates.is_empty()
  }

  /// Merges `other` onto `self` in place. `self` is assumed lower
  /// precedence (declared earlier in the parent-before-descendant walk);
  /// `other`'s scalar fields win, its params/env are layered key-wise on
  /// top, its proxy merges field-wise, and its templates/playbooks extend
  /// (order-preserving, not deduplicated) per §4.3.
  pub fn merge(&mut self, other: &Component) {
    debug_assert_eq!(
      self.id, other.id,
      "merging components with different ids"
    );
    if !other.repository.is_empty() {
      self.repository.clone_from(&other.repository);
    }
    if other.version.is_some() {
      self.version.clone_from(&other.version);
    }
    if other.has_descriptor {
      self.has_descriptor = true;
    }
    for (k, v) in &other.params {
      self.params.insert(k.clone(), v.clone());
    }
    for (k, v) in &other.env {
      self.env.insert(k.clone(), v.clone());
    }
    self.proxy.merge(&other.proxy);
    self.templates.extend(other.templates.iter().cloned());
    self.playbooks.extend(other.playbooks.iter().cloned());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn merge_is_key_wise_last_writer_wins() {
    let mut a = Component::new("comp1", "repo1");
    a.params.insert("k1".into(), "a".into());
    a.params.insert("k2".into(), "a".into());

    let mut b = Component::new("comp1", "repo1");
    b.params.insert("k2".into(), "b".into());
    b.params.insert("k3".into(), "b".into());

    a.merge(&b);

    assert_eq!(a.params["k1"], serde_yaml_ng::Value::from("a"));
    assert_eq!(a.params["k2"], serde_yaml_ng::Value::from("b"));
    assert_eq!(a.params["k3"], serde_yaml_ng::Value::from("b"));
  }

  #[test]
  fn templates_extend_without_dedup() {
    let mut a = Component::new("comp1", "repo1");
    a.templates.push("*.yaml".into());
    let mut b = Component::new("comp1", "repo1");
    b.templates.push("*.yaml".into());
    a.merge(&b);
    assert_eq!(a.templates, vec!["*.yaml", "*.yaml"]);
  }
}
