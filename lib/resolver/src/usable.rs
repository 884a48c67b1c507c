use std::path::{Path, PathBuf};

use ekara_model::{Component, TemplateContext};

use crate::ResolverError;

/// A transient handle to a component's filesystem root (C7). If the
/// component declares template patterns, `root` points at a fresh
/// rendered copy under `<baseDir>/tmp/`; otherwise it points straight at
/// the component's own fetched tree and `release` is a no-op.
///
/// `release` is idempotent (safe to call more than once, including from
/// a `Drop` on an error path) and is also run automatically on drop so a
/// caller that forgets to call it explicitly still doesn't leak the temp
/// directory (§8 "release discipline").
pub struct UsableComponent {
  pub root: PathBuf,
  temp_dir: Option<PathBuf>,
}

impl UsableComponent {
  pub fn release(&mut self) -> std::io::Result<()> {
    if let Some(dir) = self.temp_dir.take() {
      if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
      }
    }
    Ok(())
  }

  pub fn is_temporary(&self) -> bool {
    self.temp_dir.is_some()
  }
}

impl Drop for UsableComponent {
  fn drop(&mut self) {
    let _ = self.release();
  }
}

/// Materializes `component` for use, per §4.5.
pub fn use_component(
  base_dir: &Path,
  component: &Component,
  ctx: &TemplateContext,
) -> Result<UsableComponent, ResolverError> {
  let root = component
    .local_path
    .clone()
    .ok_or_else(|| ResolverError::NotFetched(component.id.clone()))?;

  if !component.is_templatable() {
    return Ok(UsableComponent {
      root,
      temp_dir: None,
    });
  }

  let temp_dir = base_dir.join("tmp").join(uuid::Uuid::new_v4().to_string());
  std::fs::create_dir_all(&temp_dir)?;
  ekara_template::render_tree(&root, &temp_dir, &component.templates, ctx)?;

  Ok(UsableComponent {
    root: temp_dir.clone(),
    temp_dir: Some(temp_dir),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use ekara_model::Params;

  #[test]
  fn non_templatable_component_points_at_original_root_and_release_is_noop() {
    let tmp = tempfile::tempdir().unwrap();
    let mut component = Component::new("comp1", "repo1");
    component.local_path = Some(tmp.path().to_path_buf());

    let ctx = TemplateContext::new(Params::default());
    let mut usable = use_component(tmp.path(), &component, &ctx).unwrap();

    assert_eq!(usable.root, tmp.path());
    assert!(!usable.is_temporary());
    usable.release().unwrap();
    assert!(tmp.path().exists());
  }

  #[test]
  fn templatable_component_copies_and_cleans_up_on_release() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(src.join("ekara.yaml"), "name: {{vars.who}}").unwrap();

    let mut component = Component::new("comp1", "repo1");
    component.local_path = Some(src.clone());
    component.templates.push("*.yaml".into());

    let mut ctx = TemplateContext::new(Params::default());
    ctx.external_vars.insert("who".into(), "ekara".into());

    let mut usable = use_component(tmp.path(), &component, &ctx).unwrap();
    assert!(usable.is_temporary());
    assert_ne!(usable.root, src);
    assert_eq!(
      std::fs::read_to_string(usable.root.join("ekara.yaml")).unwrap(),
      "name: ekara"
    );

    let temp_root = usable.root.clone();
    usable.release().unwrap();
    assert!(!temp_root.exists());
    usable.release().unwrap();
  }
}
