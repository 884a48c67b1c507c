//! # Ekara Resolver
//!
//! The Component Resolver (C6): the fixed-point fetch/parse/merge loop
//! over the descriptor graph, plus the ordering function it depends on
//! (C6's `orderFromFragments`), the Usable-Component Factory (C7), and
//! the cross-component file lookup both of those lean on.

mod error;
mod find;
mod order;
mod usable;

use std::collections::{HashSet, VecDeque};

use ekara_model::{
  Component, ComponentRef, Environment, Params, Platform, TemplateContext,
  ValidationErrors,
};
use ekara_scm::{FetchRef, Fetcher};
use indexmap::IndexMap;

fn to_fetch_ref(id: String, component_ref: &ComponentRef) -> FetchRef {
  FetchRef {
    id,
    repository: component_ref.repository.clone(),
    version: component_ref.version.clone(),
    token: component_ref
      .auth
      .as_ref()
      .and_then(|auth| auth.token.clone()),
  }
}

pub use error::ResolverError;
pub use find::{find_all_in_components, find_in_components};
pub use order::{OrderNode, order_from_fragments};
pub use usable::{UsableComponent, use_component};

/// What the resolver needs to start: the main component reference (the
/// environment's own repository) and any externally-supplied template
/// variables (`--var`/params file, per `util/launch_context.go`).
#[derive(Debug, Clone)]
pub struct ResolveInput {
  pub main_ref: FetchRef,
  pub external_vars: Params,
}

/// Everything the action pipeline needs once resolution closes.
#[derive(Debug)]
pub struct ResolveOutput {
  pub platform: Platform,
  pub environment: Environment,
  pub component_order: Vec<String>,
  pub validation: ValidationErrors,
}

/// Runs the fixed-point loop of §4.4: fetch and parse every reachable
/// component (if it has a descriptor), discovering the parent/components
/// graph as it goes. `componentOrder` is computed afterward, as a pure
/// function over that graph (§9 REDESIGN FLAG) rather than as a side
/// effect of the fetch order itself — and the fragments collected during
/// the fetch are merged into the environment in *that* order, main
/// descriptor last, so descriptor precedence (§4.3) holds regardless of
/// the order components happened to be fetched in.
///
/// The active-parent-stack cycle guard lives here rather than only in
/// `order_from_fragments`: each parent hop gets a freshly synthesized
/// `~parent` id, so those ids never collide and `seen` alone would let a
/// genuinely cyclic `ekara.parent` chain keep growing ids forever instead
/// of terminating. Cycle membership is therefore tracked by *repository*
/// identity along the parent chain (component-ref branches reset the
/// stack — §4.4 only treats a parent loop as fatal, not a component
/// self-reference).
#[tracing::instrument(level = "info", skip(fetcher, input), fields(main = %input.main_ref.id))]
pub async fn resolve(
  fetcher: &Fetcher,
  input: ResolveInput,
) -> Result<ResolveOutput, ResolverError> {
  let mut queue: VecDeque<(FetchRef, Vec<String>)> = VecDeque::new();
  queue.push_back((input.main_ref.clone(), Vec::new()));

  let mut seen = HashSet::new();
  let mut validation = ValidationErrors::default();
  let mut order_nodes: IndexMap<String, OrderNode> = IndexMap::new();
  let mut fragments: IndexMap<String, ekara_descriptor::Fragment> = IndexMap::new();
  let ctx = TemplateContext::new(input.external_vars);
  let mut platform: Option<Platform> = None;

  while let Some((fetch_ref, parent_stack)) = queue.pop_front() {
    if seen.contains(&fetch_ref.id) {
      continue;
    }

    let fetched = fetcher.fetch(&fetch_ref).await?;
    seen.insert(fetch_ref.id.clone());

    let mut component = Component::new(fetch_ref.id.clone(), fetch_ref.repository.clone());
    component.version = fetch_ref.version.clone();
    component.local_path = Some(fetched.local_path.clone());
    component.has_descriptor = fetched.has_descriptor;

    let mut parent_stack = parent_stack;
    parent_stack.push(fetch_ref.repository.clone());

    let mut order_node = OrderNode::default();

    if let Some(descriptor_path) = &fetched.descriptor_path {
      let (fragment, frag_errors) = ekara_descriptor::parse(descriptor_path, &ctx)?;
      validation.extend(frag_errors);

      order_node.components = fragment.declared_components.keys().cloned().collect();
      // Pushing to the front of the queue with later calls landing
      // closer to the front, so to make the *parent* the very next
      // thing popped (parent-before-descendants), push the declared
      // components first, in reverse declaration order, then the
      // parent last. This only drives fetch/discovery order — the
      // final merge order is decided afterward from `order_nodes`.
      for component_ref in fragment.declared_components.values().rev() {
        queue.push_front((to_fetch_ref(component_ref.id.clone(), component_ref), Vec::new()));
      }
      if let Some(parent_ref) = &fragment.parent {
        if parent_stack.contains(&parent_ref.repository) {
          return Err(ResolverError::CyclicParent(parent_ref.repository.clone()));
        }
        let parent_id = format!("{}~parent", fetch_ref.id);
        order_node.parent = Some(parent_id.clone());
        queue.push_front((to_fetch_ref(parent_id, parent_ref), parent_stack.clone()));
      }

      fragments.insert(fetch_ref.id.clone(), fragment);
    }

    order_nodes.insert(fetch_ref.id.clone(), order_node);

    match &mut platform {
      None => platform = Some(Platform::new(component)),
      Some(p) => p.register(component),
    }
  }

  let mut platform = platform.ok_or(ResolverError::NoMainComponent)?;
  let component_order = order_from_fragments(&input.main_ref.id, &order_nodes)?;

  let mut environment = Environment::new();
  for id in &component_order {
    let Some(fragment) = fragments.shift_remove(id) else {
      continue;
    };
    let Some(owner) = platform.components.get_mut(id) else {
      continue;
    };
    ekara_merge::merge_fragment(&mut environment, owner, fragment);
  }

  Ok(ResolveOutput {
    platform,
    environment,
    component_order,
    validation,
  })
}
