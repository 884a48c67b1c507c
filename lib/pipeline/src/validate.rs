use ekara_model::{ComponentReferencer, ValidationError, ValidationErrors};

use crate::context::RuntimeContext;

/// Structural validation of the resolved model (§8 "resolution closure"):
/// every component reference held by a provider, orchestrator, task or
/// stack must resolve through [`ekara_model::Platform`], and every node
/// set must name a provider that actually exists.
pub fn validate_environment(ctx: &RuntimeContext) -> ValidationErrors {
  let mut errors = ValidationErrors::default();
  let env = &ctx.environment;

  for (name, provider) in &env.providers {
    if provider.resolve(&ctx.platform).is_err() {
      errors.push(
        ValidationError::error(format!(
          "provider {name:?} references unknown component {:?}",
          provider.component
        ))
        .at(format!("providers.{name}")),
      );
    }
  }

  if let Some(orchestrator) = &env.orchestrator {
    if orchestrator.resolve(&ctx.platform).is_err() {
      errors.push(
        ValidationError::error(format!(
          "orchestrator references unknown component {:?}",
          orchestrator.component
        ))
        .at("orchestrator"),
      );
    }
  }

  for (name, task) in &env.tasks {
    if task.resolve(&ctx.platform).is_err() {
      errors.push(
        ValidationError::error(format!(
          "task {name:?} references unknown component {:?}",
          task.component
        ))
        .at(format!("tasks.{name}")),
      );
    }
  }

  for (name, stack) in &env.stacks {
    if let Some(component) = &stack.component {
      if component.resolve(&ctx.platform).is_err() {
        errors.push(
          ValidationError::error(format!(
            "stack {name:?} references unknown component {component:?}"
          ))
          .at(format!("stacks.{name}")),
        );
      }
    }
  }

  for (name, node_set) in &env.node_sets {
    if !env.providers.contains_key(&node_set.provider.name) {
      errors.push(
        ValidationError::error(format!(
          "node set {name:?} references unknown provider {:?}",
          node_set.provider.name
        ))
        .at(format!("nodes.{name}.provider")),
      );
    }
    if let Some(orchestrator_component) = &node_set.orchestrator {
      if orchestrator_component.resolve(&ctx.platform).is_err() {
        errors.push(
          ValidationError::error(format!(
            "node set {name:?} references unknown orchestrator component {orchestrator_component:?}"
          ))
          .at(format!("nodes.{name}.orchestrator")),
        );
      }
    }
  }

  if env.orchestrator.is_none() && !env.node_sets.is_empty() {
    errors.push(ValidationError::warning(
      "node sets are declared but no orchestrator is configured",
    ));
  }

  errors
}
