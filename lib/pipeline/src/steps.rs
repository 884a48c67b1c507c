use ekara_model::{EnvMap, HookEntry, HookList, Params, Proxy};
use ekara_runner::{Notifier, PlaybookSpec};
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use crate::context::{BaseParams, RuntimeContext, build_env_vars};
use crate::error::PipelineError;
use crate::result::{StepResult, StepResults};

/// Whether the caller should keep going after one target/hook has run.
/// `Stop` means a failure was already appended to `steps` and the whole
/// action must short-circuit immediately — no after-hooks, no further
/// targets (§4.8 point 8, and the "first failure wins" design note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Stop,
}

fn auxiliary_paths(ctx: &RuntimeContext, relative: &str) -> Vec<std::path::PathBuf> {
  ekara_resolver::find_all_in_components(&ctx.platform, &ctx.component_order, relative)
}

/// Runs one playbook invocation against `component_id` and appends exactly
/// one [`StepResult`] to `steps` — the one and only append for this target,
/// regardless of outcome (the source's double-append-on-success bug does
/// not exist here by construction: there is a single call site).
#[allow(clippy::too_many_arguments)]
async fn run_playbook_target(
  ctx: &RuntimeContext,
  notifier: &dyn Notifier,
  cancel: &CancellationToken,
  steps: &mut StepResults,
  phase: &str,
  target: &str,
  component_id: &str,
  playbook_name: &str,
  params: Params,
  proxy: Proxy,
  env: EnvMap,
  nodeset: String,
  instances: Option<u32>,
  labels: IndexMap<String, String>,
  extra_vars_literal: Option<&str>,
) -> Result<Flow, PipelineError> {
  let component = ctx.platform.get(component_id)?.clone();
  let template_ctx = ctx.template_context();
  let mut usable = ekara_resolver::use_component(&ctx.base_dir, &component, &template_ctx)?;

  let step_name = format!("{phase}-{target}");
  let exchange = ekara_exchange::ExchangeFolder::create(&ctx.step_root(&step_name))?;

  let mut base_params = BaseParams::for_environment(&ctx.environment, ctx.ssh.clone());
  base_params.nodeset = nodeset;
  base_params.instances = instances;
  base_params.labels = labels;
  base_params.params = params;
  base_params.proxy = proxy.clone();
  exchange.write_base_params(&base_params)?;

  let env_vars = build_env_vars(&proxy, &env);

  let playbook_path = usable.root.join(playbook_name);
  if !playbook_path.is_file() {
    usable.release().ok();
    steps.push(StepResult::failed_code(
      phase,
      target,
      format!("playbook not found: {}", playbook_path.display()),
    ));
    return Ok(Flow::Stop);
  }

  let spec = PlaybookSpec {
    executable: ctx.ansible_playbook_bin.clone(),
    working_dir: usable.root.clone(),
    playbook_path,
    module_paths: auxiliary_paths(ctx, "modules"),
    inventory_paths: auxiliary_paths(ctx, "inventory"),
    extra_vars_literal: extra_vars_literal
      .map(str::to_string)
      .unwrap_or_else(|| ctx.extra_vars_literal.clone()),
    input_dir: exchange.input(),
    output_dir: exchange.output(),
    env: env_vars,
    timeout: ctx.timeout,
  };

  let outcome = ekara_runner::play(&spec, notifier, cancel).await;
  usable.release().ok();

  match outcome {
    Ok(outcome) if outcome.exit_code == 0 => {
      steps.push(StepResult::ok(phase, target));
      Ok(Flow::Continue)
    }
    Ok(outcome) => {
      steps.push(StepResult::failed_playbook(
        phase,
        target,
        playbook_name,
        component_id,
        outcome.exit_code,
      ));
      Ok(Flow::Stop)
    }
    Err(ekara_runner::RunnerError::Cancelled) => {
      steps.push(StepResult::cancelled(phase, target));
      Ok(Flow::Stop)
    }
    Err(err) => Err(err.into()),
  }
}

/// Runs `task`'s playbook as a hook invocation around `parent_target`.
/// Reuses the caller's proxy/env/params so the hook sees the same
/// environment the entity step it wraps does, augmented with the hook's
/// own exchange folder (§4.8 "hook composition").
#[allow(clippy::too_many_arguments)]
async fn run_hook_entry(
  ctx: &RuntimeContext,
  notifier: &dyn Notifier,
  cancel: &CancellationToken,
  steps: &mut StepResults,
  stage: &str,
  parent_target: &str,
  entry: &HookEntry,
  params: Params,
  proxy: Proxy,
  env: EnvMap,
) -> Result<Flow, PipelineError> {
  let task = ctx
    .environment
    .tasks
    .get(&entry.task)
    .ok_or_else(|| PipelineError::UnknownTask(entry.task.clone()))?
    .clone();

  let phase = format!("hook:{}", entry.task);
  let target = format!("{}-{}-{}", entry.prefix, stage, parent_target);

  run_playbook_target(
    ctx,
    notifier,
    cancel,
    steps,
    &phase,
    &target,
    &task.component,
    &task.playbook,
    params,
    proxy,
    env,
    String::new(),
    None,
    IndexMap::new(),
    None,
  )
  .await
}

/// Runs every entry of `hooks` in order. Stops at the first failure,
/// per the "first failure wins" design decision: the source sometimes
/// kept running steps after recording a failure because it lacked an
/// early return before releasing the usable component; here every
/// failing call returns `Flow::Stop` immediately and the caller must
/// check it before proceeding to the next entry.
#[allow(clippy::too_many_arguments)]
async fn run_hook_list(
  ctx: &RuntimeContext,
  notifier: &dyn Notifier,
  cancel: &CancellationToken,
  steps: &mut StepResults,
  hooks: &[HookEntry],
  stage: &str,
  parent_target: &str,
  params: &Params,
  proxy: &Proxy,
  env: &EnvMap,
) -> Result<Flow, PipelineError> {
  for entry in hooks {
    let flow = run_hook_entry(
      ctx,
      notifier,
      cancel,
      steps,
      stage,
      parent_target,
      entry,
      params.clone(),
      proxy.clone(),
      env.clone(),
    )
    .await?;
    if flow == Flow::Stop {
      return Ok(Flow::Stop);
    }
  }
  Ok(Flow::Continue)
}

/// Runs a full before-hooks → target → after-hooks sequence for one
/// entity, with global (environment-scope) hooks wrapping the
/// entity-scope ones on both sides (§4.8 point 6/9). Stops at the first
/// failure anywhere in the sequence.
#[allow(clippy::too_many_arguments)]
pub async fn run_entity_with_hooks(
  ctx: &RuntimeContext,
  notifier: &dyn Notifier,
  cancel: &CancellationToken,
  steps: &mut StepResults,
  phase: &str,
  target: &str,
  component_id: &str,
  playbook_name: &str,
  params: Params,
  proxy: Proxy,
  env: EnvMap,
  nodeset: String,
  instances: Option<u32>,
  labels: IndexMap<String, String>,
  global_hooks: &HookList,
  entity_hooks: &HookList,
  extra_vars_literal: Option<&str>,
) -> Result<Flow, PipelineError> {
  let before = run_hook_list(
    ctx, notifier, cancel, steps, &global_hooks.before, "before", target, &params, &proxy, &env,
  )
  .await?;
  if before == Flow::Stop {
    return Ok(Flow::Stop);
  }
  let before = run_hook_list(
    ctx, notifier, cancel, steps, &entity_hooks.before, "before", target, &params, &proxy, &env,
  )
  .await?;
  if before == Flow::Stop {
    return Ok(Flow::Stop);
  }

  let flow = run_playbook_target(
    ctx,
    notifier,
    cancel,
    steps,
    phase,
    target,
    component_id,
    playbook_name,
    params.clone(),
    proxy.clone(),
    env.clone(),
    nodeset,
    instances,
    labels,
    extra_vars_literal,
  )
  .await?;
  if flow == Flow::Stop {
    return Ok(Flow::Stop);
  }

  let after = run_hook_list(
    ctx, notifier, cancel, steps, &entity_hooks.after, "after", target, &params, &proxy, &env,
  )
  .await?;
  if after == Flow::Stop {
    return Ok(Flow::Stop);
  }
  run_hook_list(
    ctx, notifier, cancel, steps, &global_hooks.after, "after", target, &params, &proxy, &env,
  )
  .await
}
