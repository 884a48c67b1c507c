//! # Ekara Model
//!
//! The declarative data model assembled by the component resolver and
//! consumed read-only by the action pipeline: [`Component`], [`Platform`],
//! [`Environment`] and the entities it holds (providers, node sets, stacks,
//! hooks, tasks).

pub mod component;
pub mod environment;
pub mod error;
pub mod hooks;
pub mod platform;
pub mod proxy;
pub mod reference;
pub mod template_context;
pub mod validation;

pub use component::{Component, ComponentRef, Params};
pub use environment::{
  Environment, NodeSet, Orchestrator, Provider, Stack, Task,
};
pub use error::ModelError;
pub use hooks::{EntityHooks, GlobalHooks, HookEntry, HookList};
pub use platform::Platform;
pub use proxy::Proxy;
pub use reference::ComponentReferencer;
pub use template_context::TemplateContext;
pub use validation::{ErrorType, ValidationError, ValidationErrors};

pub type EnvMap = indexmap::IndexMap<String, String>;

/// Renders an [`anyhow::Error`] chain as a single readable string, the way
/// a step log or CLI error report wants it: top-level message followed by
/// the `source()` chain, one cause per line.
pub fn format_error(error: &anyhow::Error) -> String {
  use colored::Colorize;
  let mut out = format!("{}: {error}", "ERROR".red().bold());
  for (i, cause) in error.chain().skip(1).enumerate() {
    out.push_str(&format!("\n  {}: {cause}", format!("{}", i + 1).dimmed()));
  }
  out
}
