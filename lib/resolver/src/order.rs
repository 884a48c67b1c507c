use std::collections::HashSet;

use indexmap::IndexMap;

use crate::ResolverError;

/// The shape `order_from_fragments` needs from each node in the descriptor
/// graph: its parent (if any) and the ids of the components it declares,
/// in declaration order. Kept separate from [`ekara_descriptor::Fragment`]
/// so this function stays a pure, fetcher/parser-free computation over
/// plain data (§9 REDESIGN FLAG).
#[derive(Debug, Clone, Default)]
pub struct OrderNode {
  pub parent: Option<String>,
  pub components: Vec<String>,
}

/// Computes the final `componentOrder`: a postorder walk where a node's
/// parent (and the parent's own ancestry) is fully ordered before the
/// node itself, and declared components are ordered before the node in
/// declaration order (§4.4).
///
/// `id`s with no corresponding entry in `nodes` are treated as leaves
/// (components with no descriptor of their own).
///
/// Re-visiting an id already placed in the order is a silent dedup. A
/// cycle followed strictly through `parent` links back to a node still
/// being visited is the fatal `CyclicParent` error; a cycle reached only
/// through plain component references is broken silently instead (§4.4
/// cycle policy tracks the active parent stack, not just `seen` ids).
pub fn order_from_fragments(
  root: &str,
  nodes: &IndexMap<String, OrderNode>,
) -> Result<Vec<String>, ResolverError> {
  let mut seen = HashSet::new();
  let mut visiting = HashSet::new();
  let mut order = Vec::new();
  visit(root, false, nodes, &mut seen, &mut visiting, &mut order)?;
  Ok(order)
}

fn visit(
  id: &str,
  via_parent: bool,
  nodes: &IndexMap<String, OrderNode>,
  seen: &mut HashSet<String>,
  visiting: &mut HashSet<String>,
  order: &mut Vec<String>,
) -> Result<(), ResolverError> {
  if seen.contains(id) {
    return Ok(());
  }
  if visiting.contains(id) {
    return if via_parent {
      Err(ResolverError::CyclicParent(id.to_string()))
    } else {
      Ok(())
    };
  }

  visiting.insert(id.to_string());
  if let Some(node) = nodes.get(id) {
    if let Some(parent_id) = &node.parent {
      visit(parent_id, true, nodes, seen, visiting, order)?;
    }
    for component_id in &node.components {
      visit(component_id, false, nodes, seen, visiting, order)?;
    }
  }
  visiting.remove(id);

  if seen.insert(id.to_string()) {
    order.push(id.to_string());
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn node(parent: Option<&str>, components: &[&str]) -> OrderNode {
    OrderNode {
      parent: parent.map(str::to_string),
      components: components.iter().map(|s| s.to_string()).collect(),
    }
  }

  #[test]
  fn matches_hook_fetch_order_fixture() {
    let mut nodes = IndexMap::new();
    nodes.insert("main".to_string(), node(Some("parent1"), &["comp1", "comp2", "comp3"]));
    nodes.insert("parent1".to_string(), node(None, &["comp4"]));

    let order = order_from_fragments("main", &nodes).unwrap();

    assert_eq!(
      order,
      vec!["comp4", "parent1", "comp1", "comp2", "comp3", "main"]
    );
  }

  #[test]
  fn first_occurrence_wins_on_dedup() {
    let mut nodes = IndexMap::new();
    nodes.insert("main".to_string(), node(None, &["comp1", "comp2"]));
    nodes.insert("comp1".to_string(), node(None, &["comp2"]));

    let order = order_from_fragments("main", &nodes).unwrap();

    assert_eq!(order, vec!["comp2", "comp1", "main"]);
  }

  #[test]
  fn parent_cycle_is_fatal() {
    let mut nodes = IndexMap::new();
    nodes.insert("a".to_string(), node(Some("b"), &[]));
    nodes.insert("b".to_string(), node(Some("a"), &[]));

    let err = order_from_fragments("a", &nodes).unwrap_err();
    assert!(matches!(err, ResolverError::CyclicParent(_)));
  }

  #[test]
  fn component_self_reference_is_not_an_error() {
    let mut nodes = IndexMap::new();
    nodes.insert("main".to_string(), node(None, &["comp1"]));
    nodes.insert("comp1".to_string(), node(None, &["main"]));

    let order = order_from_fragments("main", &nodes).unwrap();
    assert_eq!(order, vec!["comp1", "main"]);
  }
}
