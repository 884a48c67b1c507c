use indexmap::IndexMap;

use crate::{Component, ModelError};

/// The registry of all resolved components. (a) `self_` is the component
/// whose descriptor is currently being processed, (b) `parents` is the
/// ordered chain of prior `self_`s, nearest parent first, and (c)
/// `components` maps every registered component id to its merged
/// [`Component`].
///
/// Invariant: after resolution closes, every reference in the
/// [`crate::Environment`] resolves to an entry in `components`
/// (*resolution closure*, §8).
#[derive(Debug, Clone, Default)]
pub struct Platform {
  pub self_: Component,
  pub parents: Vec<Component>,
  pub components: IndexMap<String, Component>,
}

impl Platform {
  pub fn new(self_: Component) -> Self {
    let mut components = IndexMap::new();
    components.insert(self_.id.clone(), self_.clone());
    Platform {
      self_,
      parents: Vec::new(),
      components,
    }
  }

  /// Registers `component`, merging into any existing entry with the same
  /// id (ground: `platform.go registerComponent`).
  pub fn register(&mut self, component: Component) {
    match self.components.get_mut(&component.id) {
      Some(existing) => existing.merge(&component),
      None => {
        self.components.insert(component.id.clone(), component);
      }
    }
  }

  pub fn get(&self, id: &str) -> Result<&Component, ModelError> {
    self
      .components
      .get(id)
      .ok_or_else(|| ModelError::UnknownComponent(id.to_string()))
  }

  /// Merges `with`, a platform built while parsing one more step up the
  /// parent chain, into `self`. The current `self_` is pushed to the front
  /// of `parents` before being replaced — so `parents` ends up ordered
  /// nearest-parent-first (ground: `platform.go Platform.merge`).
  pub fn merge(&mut self, with: Platform) {
    self.parents.insert(0, self.self_.clone());
    self.self_ = with.self_;
    for (id, component) in with.components {
      self.register_with_id(id, component);
    }
  }

  fn register_with_id(&mut self, id: String, component: Component) {
    match self.components.get_mut(&id) {
      Some(existing) => existing.merge(&component),
      None => {
        self.components.insert(id, component);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn merge_pushes_old_self_to_front_of_parents() {
    let mut platform = Platform::new(Component::new("desc", "repo"));
    let parent_platform = Platform::new(Component::new("parent1", "repo"));
    platform.merge(parent_platform);

    assert_eq!(platform.self_.id, "parent1");
    assert_eq!(platform.parents.len(), 1);
    assert_eq!(platform.parents[0].id, "desc");

    let grandparent_platform =
      Platform::new(Component::new("parent2", "repo"));
    platform.merge(grandparent_platform);
    assert_eq!(platform.self_.id, "parent2");
    assert_eq!(platform.parents[0].id, "parent1");
    assert_eq!(platform.parents[1].id, "desc");
  }

  #[test]
  fn register_merges_colliding_ids() {
    let mut platform = Platform::new(Component::new("main", "repo"));
    let mut c = Component::new("comp1", "repo1");
    c.params.insert("k".into(), "v1".into());
    platform.register(c);

    let mut c2 = Component::new("comp1", "repo1");
    c2.params.insert("k".into(), "v2".into());
    platform.register(c2);

    assert_eq!(
      platform.get("comp1").unwrap().params["k"],
      serde_yaml_ng::Value::from("v2")
    );
  }
}
