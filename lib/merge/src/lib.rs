//! # Ekara Merge
//!
//! The Model Merger (C5): folds a [`Fragment`] into an [`Environment`]
//! under the precedence rules of §4.3. Called once per successful parse
//! in the resolver's fixed-point loop (C6), always with the
//! currently-being-processed component as `owner` so the fragment's
//! `templates` patterns land on that component rather than the
//! environment.

use ekara_descriptor::Fragment;
use ekara_model::{Component, Environment, NodeSet, Orchestrator, Provider, Stack};

/// Folds `fragment` into `env` in place, and re-homes `fragment.templates`
/// onto `owner` (the component the fragment was parsed from). `owner` is
/// *not* registered into the platform here — that's the resolver's job.
#[tracing::instrument(level = "debug", skip(env, owner, fragment), fields(owner = %owner.id))]
pub fn merge_fragment(env: &mut Environment, owner: &mut Component, fragment: Fragment) {
  if let Some(name) = fragment.name {
    env.name = name;
  }
  if let Some(qualifier) = fragment.qualifier {
    env.qualifier = qualifier;
  }

  for (key, incoming) in fragment.providers {
    match env.providers.get_mut(&key) {
      Some(existing) => merge_provider(existing, incoming),
      None => {
        env.providers.insert(key, incoming);
      }
    }
  }

  if let Some(incoming) = fragment.orchestrator {
    match &mut env.orchestrator {
      Some(existing) => merge_orchestrator(existing, incoming),
      None => env.orchestrator = Some(incoming),
    }
  }

  for (key, incoming) in fragment.node_sets {
    match env.node_sets.get_mut(&key) {
      Some(existing) => merge_node_set(existing, incoming),
      None => {
        env.node_sets.insert(key, incoming);
      }
    }
  }

  for (key, incoming) in fragment.stacks {
    match env.stacks.get_mut(&key) {
      Some(existing) => merge_stack(existing, incoming),
      None => {
        env.stacks.insert(key, incoming);
      }
    }
  }

  // Tasks are a flat (component, playbook) pair: on collision the later
  // declaration simply replaces the earlier one, same as any other
  // scalar-only entity (§4.3).
  for (key, incoming) in fragment.tasks {
    env.tasks.insert(key, incoming);
  }

  env.hooks.append(&fragment.hooks);

  owner.templates.extend(fragment.templates);
}

fn merge_provider(existing: &mut Provider, incoming: Provider) {
  if !incoming.component.is_empty() {
    existing.component = incoming.component;
  }
  for (k, v) in incoming.params {
    existing.params.insert(k, v);
  }
  for (k, v) in incoming.env {
    existing.env.insert(k, v);
  }
  existing.proxy.merge(&incoming.proxy);
}

fn merge_orchestrator(existing: &mut Orchestrator, incoming: Orchestrator) {
  if !incoming.component.is_empty() {
    existing.component = incoming.component;
  }
  for (k, v) in incoming.params {
    existing.params.insert(k, v);
  }
  for (k, v) in incoming.env {
    existing.env.insert(k, v);
  }
}

fn merge_node_set(existing: &mut NodeSet, incoming: NodeSet) {
  existing.instances = incoming.instances;
  existing.provider = incoming.provider;
  if incoming.orchestrator.is_some() {
    existing.orchestrator = incoming.orchestrator;
  }
  for (k, v) in incoming.labels {
    existing.labels.insert(k, v);
  }
  existing.hooks.append(&incoming.hooks);
}

fn merge_stack(existing: &mut Stack, incoming: Stack) {
  if incoming.component.is_some() {
    existing.component = incoming.component;
  }
  for (k, v) in incoming.params {
    existing.params.insert(k, v);
  }
  for (k, v) in incoming.env {
    existing.env.insert(k, v);
  }
  existing.hooks.append(&incoming.hooks);
}

#[cfg(test)]
mod tests {
  use super::*;
  use ekara_model::HookEntry;

  fn provider(component: &str, key: &str, value: &str) -> Provider {
    let mut p = Provider {
      name: "p1".into(),
      component: component.into(),
      ..Default::default()
    };
    p.params.insert(key.into(), value.into());
    p
  }

  #[test]
  fn merge_is_associative_for_scalar_provider_component() {
    let mut owner = Component::new("main", "repo");

    let mut env_left = Environment::new();
    merge_fragment(
      &mut env_left,
      &mut owner.clone(),
      fragment_with_provider(provider("grandparent-comp", "k1", "A")),
    );
    merge_fragment(
      &mut env_left,
      &mut owner.clone(),
      fragment_with_provider(provider("parent-comp", "k1", "B")),
    );
    merge_fragment(
      &mut env_left,
      &mut owner.clone(),
      fragment_with_provider(provider("main-comp", "k1", "C")),
    );

    assert_eq!(env_left.providers["p1"].component, "main-comp");
    assert_eq!(
      env_left.providers["p1"].params["k1"],
      serde_yaml_ng::Value::from("C")
    );
  }

  #[test]
  fn hook_lists_concatenate_in_merge_order() {
    let mut env = Environment::new();
    let mut owner = Component::new("main", "repo");

    let mut parent_fragment = Fragment::default();
    parent_fragment.hooks.create.before.push(HookEntry {
      task: "hook1".into(),
      prefix: "H1".into(),
    });
    merge_fragment(&mut env, &mut owner, parent_fragment);

    let mut descriptor_fragment = Fragment::default();
    descriptor_fragment.hooks.create.before.push(HookEntry {
      task: "hook2".into(),
      prefix: "H2".into(),
    });
    merge_fragment(&mut env, &mut owner, descriptor_fragment);

    assert_eq!(env.hooks.create.before.len(), 2);
    assert_eq!(env.hooks.create.before[0].prefix, "H1");
    assert_eq!(env.hooks.create.before[1].prefix, "H2");
  }

  #[test]
  fn templates_re_home_onto_owner_not_environment() {
    let mut env = Environment::new();
    let mut owner = Component::new("comp1", "repo");

    let mut fragment = Fragment::default();
    fragment.templates.push("*.yaml".into());
    merge_fragment(&mut env, &mut owner, fragment);

    assert_eq!(owner.templates, vec!["*.yaml"]);
  }

  fn fragment_with_provider(provider: Provider) -> Fragment {
    let mut fragment = Fragment::default();
    fragment.providers.insert(provider.name.clone(), provider);
    fragment
  }
}
