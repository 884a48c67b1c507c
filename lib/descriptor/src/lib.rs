//! # Ekara Descriptor
//!
//! The Descriptor Parser (C4): reads a YAML descriptor file, renders it
//! through [`ekara_template`], and converts it into a [`Fragment`] — a
//! partial view of an `Environment` plus the component references it
//! declares. The fragment does not itself resolve anything; that's the
//! resolver's job (C6).

mod raw;

use std::path::{Path, PathBuf};

use ekara_model::{
  ComponentRef, GlobalHooks, NodeSet, Orchestrator, Provider, Stack, Task,
  TemplateContext, ValidationError, ValidationErrors,
  environment::ProviderRef,
};
use indexmap::IndexMap;
use thiserror::Error;

pub use raw::DescriptorRaw;

#[derive(Debug, Error)]
pub enum DescriptorError {
  #[error("failed to read descriptor {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to render descriptor {path}: {source}")]
  Render {
    path: String,
    #[source]
    source: ekara_template::TemplateError,
  },
  #[error("malformed descriptor {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: serde_yaml_ng::Error,
  },
}

/// A partial view of an `Environment` plus the component references found
/// while parsing one descriptor file. `parent` and `components` feed the
/// resolver's fetch queue (§4.4); everything else feeds the merger (§4.3).
#[derive(Debug, Clone, Default)]
pub struct Fragment {
  pub name: Option<String>,
  pub qualifier: Option<String>,
  pub parent: Option<ComponentRef>,
  pub declared_components: IndexMap<String, ComponentRef>,
  pub providers: IndexMap<String, Provider>,
  pub orchestrator: Option<Orchestrator>,
  pub node_sets: IndexMap<String, NodeSet>,
  pub stacks: IndexMap<String, Stack>,
  pub tasks: IndexMap<String, Task>,
  pub hooks: GlobalHooks,
  /// Glob patterns declared under `templates`. Re-homed onto the owning
  /// component by the merger, never onto the `Environment` (§4.3).
  pub templates: Vec<String>,
}

/// Reads `path`, renders it through `ctx`, parses and validates it.
#[tracing::instrument(level = "debug", skip(ctx), fields(path = %path.display()))]
pub fn parse(
  path: &Path,
  ctx: &TemplateContext,
) -> Result<(Fragment, ValidationErrors), DescriptorError> {
  let raw_content =
    std::fs::read_to_string(path).map_err(|source| DescriptorError::Read {
      path: path.display().to_string(),
      source,
    })?;

  let rendered =
    ekara_template::render_string(&raw_content, ctx).map_err(|source| {
      DescriptorError::Render {
        path: path.display().to_string(),
        source,
      }
    })?;

  let raw: DescriptorRaw =
    serde_yaml_ng::from_str(&rendered).map_err(|source| {
      DescriptorError::Parse {
        path: path.display().to_string(),
        source,
      }
    })?;

  let mut errors = ValidationErrors::default();
  let fragment = convert(raw, path, &mut errors);
  Ok((fragment, errors))
}

fn convert(
  raw: DescriptorRaw,
  path: &Path,
  errors: &mut ValidationErrors,
) -> Fragment {
  let location = path.display().to_string();

  let (parent, mut declared_components) = match raw.ekara {
    Some(ekara) => (ekara.parent, ekara.components),
    None => (None, IndexMap::new()),
  };
  for (id, component_ref) in declared_components.iter_mut() {
    component_ref.id = id.clone();
  }

  let providers = raw
    .providers
    .into_iter()
    .map(|(name, p)| {
      (
        name.clone(),
        Provider {
          name,
          component: p.component.unwrap_or_default(),
          params: p.params,
          env: p.env,
          proxy: p.proxy,
        },
      )
    })
    .collect();

  let orchestrator = raw.orchestrator.map(|o| Orchestrator {
    component: o.component.unwrap_or_default(),
    params: o.params,
    env: o.env,
  });

  let node_sets = raw
    .nodes
    .into_iter()
    .map(|(name, n)| {
      (
        name.clone(),
        NodeSet {
          name,
          instances: n.instances,
          labels: n.labels,
          provider: ProviderRef { name: n.provider },
          orchestrator: n.orchestrator,
          hooks: n.hooks.into(),
        },
      )
    })
    .collect();

  let stacks = raw
    .stacks
    .into_iter()
    .map(|(name, s)| {
      (
        name.clone(),
        Stack {
          name,
          component: s.component,
          params: s.params,
          env: s.env,
          hooks: s.hooks.into(),
        },
      )
    })
    .collect();

  let tasks = raw
    .tasks
    .into_iter()
    .map(|(name, t)| {
      (
        name,
        Task {
          component: t.component,
          playbook: t.playbook,
        },
      )
    })
    .collect();

  if raw.name.is_none() && raw.qualifier.is_none() {
    errors.push(
      ValidationError::warning(
        "descriptor declares neither name nor qualifier",
      )
      .at(location),
    );
  }

  Fragment {
    name: raw.name,
    qualifier: raw.qualifier,
    parent,
    declared_components,
    providers,
    orchestrator,
    node_sets,
    stacks,
    tasks,
    hooks: raw.hooks.into(),
    templates: raw.templates,
  }
}
