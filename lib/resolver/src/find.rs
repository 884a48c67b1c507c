use std::path::PathBuf;

use ekara_model::Platform;

/// Looks for `relative` (a file or directory path) under each component's
/// fetched root, walking `order` in `componentOrder` order, and returns
/// the first match. Generalizes `cmanager.go`'s `ContainsFile` /
/// `ContainsDirectory`, used by the playbook runner (C8) to discover
/// `modules/`/`inventory/` directories across all components and by the
/// usable-component factory (C7) to probe for a stack's own
/// `deploy.yaml`.
pub fn find_in_components(
  platform: &Platform,
  order: &[String],
  relative: &str,
) -> Option<PathBuf> {
  order.iter().find_map(|id| {
    let component = platform.components.get(id)?;
    let candidate = component.local_path.as_ref()?.join(relative);
    candidate.exists().then_some(candidate)
  })
}

/// Like [`find_in_components`] but collects every match instead of
/// stopping at the first, for `--module-path`/`-i` discovery where the
/// runner needs every component's `modules/`/`inventory/` directory, not
/// just the nearest one.
pub fn find_all_in_components(
  platform: &Platform,
  order: &[String],
  relative: &str,
) -> Vec<PathBuf> {
  order
    .iter()
    .filter_map(|id| {
      let component = platform.components.get(id)?;
      let candidate = component.local_path.as_ref()?.join(relative);
      candidate.exists().then_some(candidate)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use ekara_model::Component;

  #[test]
  fn finds_first_matching_component_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    let c1_dir = tmp.path().join("c1");
    let c2_dir = tmp.path().join("c2");
    std::fs::create_dir_all(c1_dir.join("modules")).unwrap();
    std::fs::create_dir_all(&c2_dir).unwrap();

    let mut c1 = Component::new("c1", "repo1");
    c1.local_path = Some(c1_dir.clone());
    let mut c2 = Component::new("c2", "repo2");
    c2.local_path = Some(c2_dir);

    let mut platform = Platform::new(c1);
    platform.register(c2);

    let order = vec!["c2".to_string(), "c1".to_string()];
    let found = find_in_components(&platform, &order, "modules").unwrap();
    assert_eq!(found, c1_dir.join("modules"));
  }

  #[test]
  fn collects_every_match_across_components() {
    let tmp = tempfile::tempdir().unwrap();
    let c1_dir = tmp.path().join("c1");
    let c2_dir = tmp.path().join("c2");
    std::fs::create_dir_all(c1_dir.join("modules")).unwrap();
    std::fs::create_dir_all(c2_dir.join("modules")).unwrap();

    let mut c1 = Component::new("c1", "repo1");
    c1.local_path = Some(c1_dir.clone());
    let mut c2 = Component::new("c2", "repo2");
    c2.local_path = Some(c2_dir.clone());

    let mut platform = Platform::new(c1);
    platform.register(c2);

    let order = vec!["c1".to_string(), "c2".to_string()];
    let found = find_all_in_components(&platform, &order, "modules");
    assert_eq!(found, vec![c1_dir.join("modules"), c2_dir.join("modules")]);
  }
}
