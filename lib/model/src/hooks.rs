use serde::{Deserialize, Serialize};

/// A single hook entry: `{task, prefix}` per §6. `task` names an entry in
/// the environment's `tasks` map, which resolves to a `(component,
/// playbook)` pair; `prefix` namespaces the hook's exchange folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookEntry {
  pub task: String,
  #[serde(default)]
  pub prefix: String,
}

/// Before/after task lists for one hook kind. Concatenation is the only
/// merge operation (§4.3): parents first, descriptor last, never
/// deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookList {
  #[serde(default)]
  pub before: Vec<HookEntry>,
  #[serde(default)]
  pub after: Vec<HookEntry>,
}

impl HookList {
  pub fn has_tasks(&self) -> bool {
    !self.before.is_empty() || !self.after.is_empty()
  }

  /// Appends `other`'s before/after lists onto `self`'s, in that order.
  /// `other` is assumed to come from a fragment parsed *later* in the
  /// parent-before-descendant walk, so its entries land after `self`'s.
  pub fn append(&mut self, other: &HookList) {
    self.before.extend(other.before.iter().cloned());
    self.after.extend(other.after.iter().cloned());
  }
}

/// Global hooks, one [`HookList`] per lifecycle kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalHooks {
  #[serde(default)]
  pub init: HookList,
  #[serde(default)]
  pub create: HookList,
  #[serde(default)]
  pub install: HookList,
  #[serde(default)]
  pub deploy: HookList,
  #[serde(default)]
  pub destroy: HookList,
}

impl GlobalHooks {
  pub fn append(&mut self, other: &GlobalHooks) {
    self.init.append(&other.init);
    self.create.append(&other.create);
    self.install.append(&other.install);
    self.deploy.append(&other.deploy);
    self.destroy.append(&other.destroy);
  }
}

/// Entity-scope hooks. A node set only ever has a `provision` kind (run
/// around `providerCreate`); a stack only ever has a `deploy` kind (run
/// around `stackDeploy`) — ground: `do_apply.go` `runHookBefore`/`After`
/// call sites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityHooks {
  #[serde(default)]
  pub provision: HookList,
  #[serde(default)]
  pub deploy: HookList,
}

impl EntityHooks {
  pub fn append(&mut self, other: &EntityHooks) {
    self.provision.append(&other.provision);
    self.deploy.append(&other.deploy);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hook_ordering_matches_parent_before_descriptor() {
    let mut global = GlobalHooks::default();
    global.create.before.push(HookEntry {
      task: "hook1".into(),
      prefix: "hook1Prefix".into(),
    });

    let descriptor_hooks = GlobalHooks {
      create: HookList {
        before: vec![HookEntry {
          task: "hook2".into(),
          prefix: "hook2Prefix".into(),
        }],
        after: vec![],
      },
      ..Default::default()
    };

    global.append(&descriptor_hooks);

    assert_eq!(global.create.before.len(), 2);
    assert_eq!(global.create.before[0].prefix, "hook1Prefix");
    assert_eq!(global.create.before[1].prefix, "hook2Prefix");
  }
}
