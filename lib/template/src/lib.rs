//! # Ekara Template
//!
//! Applies a [`ekara_model::TemplateContext`] to descriptor and playbook
//! files (C2 in the engine design). Descriptor rendering is a single
//! string in, string out call; component rendering ("usable component"
//! templating, C7) additionally needs to copy a whole tree and render only
//! the files matching a component's declared glob patterns.

use std::{fs, path::Path};

use ekara_model::TemplateContext;
use handlebars::Handlebars;
use thiserror::Error;
use wildcard::Wildcard;

#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("failed to read template file {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to render template: {0}")]
  Render(#[from] handlebars::RenderError),
  #[error("failed to copy component tree: {0}")]
  Copy(#[from] std::io::Error),
  #[error("invalid template pattern '{0}'")]
  InvalidPattern(String),
}

/// Renders a single template string against `ctx`. No partials, no helper
/// registration beyond Handlebars' defaults: descriptors and playbooks only
/// ever need variable substitution, not control flow.
pub fn render_string(
  template: &str,
  ctx: &TemplateContext,
) -> Result<String, TemplateError> {
  let hb = Handlebars::new();
  let data = serde_json::json!({
    "model": ctx.model,
    "vars": ctx.external_vars,
    "skip_level": ctx.skip_level,
    "verbosity": ctx.verbosity,
  });
  Ok(hb.render_template(template, &data)?)
}

/// Reads `path` and renders its contents against `ctx`.
pub fn render_file(
  path: &Path,
  ctx: &TemplateContext,
) -> Result<String, TemplateError> {
  let content = fs::read_to_string(path).map_err(|source| {
    TemplateError::Read {
      path: path.display().to_string(),
      source,
    }
  })?;
  render_string(&content, ctx)
}

/// Copies `src` recursively into `dest` (which must already exist and be
/// empty), then renders in place every file under `dest` whose path
/// (relative to `dest`) matches one of `patterns`. Returns the number of
/// files rendered.
///
/// Ground: `cmanager.go Use`/`runTemplate` — duplicate first, template
/// second, so a failed render never mutates the original component tree.
pub fn render_tree(
  src: &Path,
  dest: &Path,
  patterns: &[String],
  ctx: &TemplateContext,
) -> Result<usize, TemplateError> {
  copy_tree(src, dest)?;

  let wildcards = patterns
    .iter()
    .map(|p| {
      Wildcard::new(p.as_bytes())
        .map_err(|_| TemplateError::InvalidPattern(p.clone()))
    })
    .collect::<Result<Vec<_>, _>>()?;

  let mut rendered = 0;
  for entry in walkdir::WalkDir::new(dest)
    .into_iter()
    .filter_map(Result::ok)
  {
    if !entry.file_type().is_file() {
      continue;
    }
    let relative = entry
      .path()
      .strip_prefix(dest)
      .unwrap_or(entry.path())
      .to_string_lossy();
    if wildcards
      .iter()
      .any(|w| w.is_match(relative.as_bytes()))
    {
      let rendered_content = render_file(entry.path(), ctx)?;
      fs::write(entry.path(), rendered_content)?;
      rendered += 1;
    }
  }
  Ok(rendered)
}

fn copy_tree(src: &Path, dest: &Path) -> std::io::Result<()> {
  for entry in walkdir::WalkDir::new(src).into_iter().filter_map(Result::ok)
  {
    let relative = entry.path().strip_prefix(src).unwrap();
    let target = dest.join(relative);
    if entry.file_type().is_dir() {
      fs::create_dir_all(&target)?;
    } else if entry.file_type().is_file() {
      if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
      }
      fs::copy(entry.path(), &target)?;
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use ekara_model::TemplateContext;

  #[test]
  fn render_string_substitutes_vars() {
    let mut ctx = TemplateContext::new(Default::default());
    ctx.external_vars.insert("env_name".into(), "prod".into());
    let out =
      render_string("name: {{vars.env_name}}", &ctx).unwrap();
    assert_eq!(out, "name: prod");
  }

  #[test]
  fn render_tree_only_touches_matching_files() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("ekara.yaml"), "name: {{vars.who}}").unwrap();
    fs::write(src.join("README.md"), "name: {{vars.who}}").unwrap();

    let dest = tmp.path().join("dest");
    fs::create_dir_all(&dest).unwrap();

    let mut ctx = TemplateContext::new(Default::default());
    ctx.external_vars.insert("who".into(), "ekara".into());

    let rendered =
      render_tree(&src, &dest, &["*.yaml".to_string()], &ctx)
        .unwrap();

    assert_eq!(rendered, 1);
    assert_eq!(
      fs::read_to_string(dest.join("ekara.yaml")).unwrap(),
      "name: ekara"
    );
    assert_eq!(
      fs::read_to_string(dest.join("README.md")).unwrap(),
      "name: {{vars.who}}"
    );
  }
}
