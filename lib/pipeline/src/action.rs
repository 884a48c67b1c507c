use ekara_model::{HookList, Proxy};
use ekara_runner::{InventorySpec, Notifier};
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use crate::context::RuntimeContext;
use crate::error::PipelineError;
use crate::result::{ApplyResult, StepResults, ValidateResult};
use crate::steps::{Flow, run_entity_with_hooks};
use crate::validate::validate_environment;

/// `Validate` (§4.8): pure structural checks, no subprocess launches.
/// Fatal per §7 ("errors cause Validate to fail") whenever any finding is
/// classified `Error` rather than `Warning`.
pub fn validate(ctx: &RuntimeContext) -> ValidateResult {
  ValidateResult::from_validation(validate_environment(ctx))
}

/// `Check` (§4.8): validation plus whatever read-only preflight the
/// caller wants layered on top. Today that's just `Validate` — there is
/// no dry-run subprocess invocation specified, so `Check` has nothing
/// further to execute.
pub fn check(ctx: &RuntimeContext) -> ValidateResult {
  validate(ctx)
}

/// `Apply` (§4.8): `Check` first (short-circuits on any validation
/// error), then the fixed step list `providerSetup, ansibleInventory,
/// providerCreate, orchestratorSetup, orchestratorInstall, stackDeploy`.
/// Stops at the first step/hook failure anywhere in that list — no
/// continuing to "see how far it gets".
pub async fn apply(
  ctx: &RuntimeContext,
  notifier: &dyn Notifier,
  cancel: &CancellationToken,
) -> Result<ApplyResult, PipelineError> {
  let precheck = check(ctx);
  if !precheck.is_success() {
    return Ok(ApplyResult {
      success: false,
      inventory: None,
      steps: StepResults::default(),
    });
  }

  let mut steps = StepResults::default();

  if provider_setup(ctx, notifier, cancel, &mut steps).await? == Flow::Stop {
    return Ok(ApplyResult { success: false, inventory: None, steps });
  }

  let inventory = match ansible_inventory(ctx, notifier, &mut steps).await? {
    Some(inventory) => inventory,
    None => return Ok(ApplyResult { success: false, inventory: None, steps }),
  };

  if provider_create(ctx, notifier, cancel, &mut steps).await? == Flow::Stop {
    return Ok(ApplyResult { success: false, inventory: Some(inventory), steps });
  }

  if orchestrator_setup(ctx, notifier, cancel, &mut steps).await? == Flow::Stop {
    return Ok(ApplyResult { success: false, inventory: Some(inventory), steps });
  }

  if orchestrator_install(ctx, notifier, cancel, &mut steps).await? == Flow::Stop {
    return Ok(ApplyResult { success: false, inventory: Some(inventory), steps });
  }

  if stack_deploy(ctx, notifier, cancel, &mut steps).await? == Flow::Stop {
    return Ok(ApplyResult { success: false, inventory: Some(inventory), steps });
  }

  Ok(ApplyResult {
    success: !steps.has_failure(),
    inventory: Some(inventory),
    steps,
  })
}

async fn provider_setup(
  ctx: &RuntimeContext,
  notifier: &dyn Notifier,
  cancel: &CancellationToken,
  steps: &mut StepResults,
) -> Result<Flow, PipelineError> {
  let total = ctx.environment.providers.len();
  for (index, (name, provider)) in ctx.environment.providers.iter().enumerate() {
    notifier.notify_with_goal("providerSetup", index + 1, total, &format!("setting up provider {name}"));
    let flow = run_entity_with_hooks(
      ctx,
      notifier,
      cancel,
      steps,
      "providerSetup",
      name,
      &provider.component,
      "setup.yaml",
      provider.params.clone(),
      provider.proxy.clone(),
      provider.env.clone(),
      String::new(),
      None,
      IndexMap::new(),
      &HookList::default(),
      &HookList::default(),
      None,
    )
    .await?;
    if flow == Flow::Stop {
      return Ok(Flow::Stop);
    }
  }
  Ok(Flow::Continue)
}

async fn ansible_inventory(
  ctx: &RuntimeContext,
  notifier: &dyn Notifier,
  steps: &mut StepResults,
) -> Result<Option<serde_json::Value>, PipelineError> {
  notifier.notify("ansibleInventory", "building inventory");
  let spec = InventorySpec {
    executable: ctx.ansible_inventory_bin.clone(),
    working_dir: ctx.launch_root(),
    inventory_paths: ekara_resolver::find_all_in_components(&ctx.platform, &ctx.component_order, "inventory"),
    env: crate::context::build_env_vars(&Proxy::default(), &ekara_model::EnvMap::default()),
  };

  match ekara_runner::build_inventory(&spec).await {
    Ok(inventory) => {
      steps.push(crate::result::StepResult::ok("ansibleInventory", "inventory"));
      Ok(Some(inventory.0))
    }
    Err(err) => {
      steps.push(crate::result::StepResult::failed_code(
        "ansibleInventory",
        "inventory",
        err.to_string(),
      ));
      Ok(None)
    }
  }
}

async fn provider_create(
  ctx: &RuntimeContext,
  notifier: &dyn Notifier,
  cancel: &CancellationToken,
  steps: &mut StepResults,
) -> Result<Flow, PipelineError> {
  let total = ctx.environment.node_sets.len();
  for (index, (name, node_set)) in ctx.environment.node_sets.iter().enumerate() {
    let Some(provider) = ctx.environment.providers.get(&node_set.provider.name) else {
      steps.push(crate::result::StepResult::failed_code(
        "providerCreate",
        name,
        format!("unknown provider {:?}", node_set.provider.name),
      ));
      return Ok(Flow::Stop);
    };

    notifier.notify_with_goal(
      "providerCreate",
      index + 1,
      total,
      &format!("creating node set {name}"),
    );

    let params = provider.params.clone();

    let flow = run_entity_with_hooks(
      ctx,
      notifier,
      cancel,
      steps,
      "providerCreate",
      name,
      &provider.component,
      "create.yaml",
      params,
      provider.proxy.clone(),
      provider.env.clone(),
      name.clone(),
      Some(node_set.instances),
      node_set.labels.clone(),
      &ctx.environment.hooks.create,
      &node_set.hooks.provision,
      None,
    )
    .await?;
    if flow == Flow::Stop {
      return Ok(Flow::Stop);
    }
  }
  Ok(Flow::Continue)
}

async fn orchestrator_setup(
  ctx: &RuntimeContext,
  notifier: &dyn Notifier,
  cancel: &CancellationToken,
  steps: &mut StepResults,
) -> Result<Flow, PipelineError> {
  let Some(orchestrator) = &ctx.environment.orchestrator else {
    return Ok(Flow::Continue);
  };
  notifier.notify("orchestratorSetup", "setting up orchestrator");
  run_entity_with_hooks(
    ctx,
    notifier,
    cancel,
    steps,
    "orchestratorSetup",
    "orchestrator",
    &orchestrator.component,
    "setup.yaml",
    orchestrator.params.clone(),
    Proxy::default(),
    orchestrator.env.clone(),
    String::new(),
    None,
    IndexMap::new(),
    &ctx.environment.hooks.init,
    &HookList::default(),
    None,
  )
  .await
}

async fn orchestrator_install(
  ctx: &RuntimeContext,
  notifier: &dyn Notifier,
  cancel: &CancellationToken,
  steps: &mut StepResults,
) -> Result<Flow, PipelineError> {
  let Some(orchestrator) = &ctx.environment.orchestrator else {
    return Ok(Flow::Continue);
  };
  notifier.notify("orchestratorInstall", "installing orchestrator");
  run_entity_with_hooks(
    ctx,
    notifier,
    cancel,
    steps,
    "orchestratorInstall",
    "orchestrator",
    &orchestrator.component,
    "install.yaml",
    orchestrator.params.clone(),
    Proxy::default(),
    orchestrator.env.clone(),
    String::new(),
    None,
    IndexMap::new(),
    &ctx.environment.hooks.install,
    &HookList::default(),
    None,
  )
  .await
}

/// §8 scenario 4: a stack that carries its own `deploy.yaml` runs
/// against its own component; otherwise it falls back to the
/// orchestrator component with `stack_path=<root> stack_name=<name>`
/// appended to the extra-vars literal.
async fn stack_deploy(
  ctx: &RuntimeContext,
  notifier: &dyn Notifier,
  cancel: &CancellationToken,
  steps: &mut StepResults,
) -> Result<Flow, PipelineError> {
  let total = ctx.environment.stacks.len();
  for (index, (name, stack)) in ctx.environment.stacks.iter().enumerate() {
    notifier.notify_with_goal("stackDeploy", index + 1, total, &format!("deploying stack {name}"));

    let self_component_id = stack.component.as_deref();
    let self_deployable = self_component_id
      .and_then(|id| ctx.platform.get(id).ok())
      .and_then(|component| component.local_path.as_ref())
      .is_some_and(|root| root.join("deploy.yaml").is_file());

    let (component_id, extra_vars) = if self_deployable {
      (self_component_id.unwrap().to_string(), None)
    } else {
      let Some(orchestrator) = &ctx.environment.orchestrator else {
        steps.push(crate::result::StepResult::failed_code(
          "stackDeploy",
          name,
          "no orchestrator configured for fallback stack deploy",
        ));
        return Ok(Flow::Stop);
      };
      let root = self_component_id
        .and_then(|id| ctx.platform.get(id).ok())
        .and_then(|component| component.local_path.clone())
        .unwrap_or_default();
      (
        orchestrator.component.clone(),
        Some(format!("stack_path={} stack_name={}", root.display(), name)),
      )
    };

    let flow = run_entity_with_hooks(
      ctx,
      notifier,
      cancel,
      steps,
      "stackDeploy",
      name,
      &component_id,
      "deploy.yaml",
      stack.params.clone(),
      Proxy::default(),
      stack.env.clone(),
      String::new(),
      None,
      IndexMap::new(),
      &ctx.environment.hooks.deploy,
      &stack.hooks.deploy,
      extra_vars.as_deref(),
    )
    .await?;
    if flow == Flow::Stop {
      return Ok(Flow::Stop);
    }
  }
  Ok(Flow::Continue)
}

/// `Destroy` (§4.8, optional): the reverse of `providerCreate` — tears
/// down each node set's infrastructure by running `destroy.yaml` against
/// the same provider component, in the same declaration order (no
/// requirement to reverse it: destruction order isn't specified beyond
/// "first failure wins" like every other step list).
pub async fn destroy(
  ctx: &RuntimeContext,
  notifier: &dyn Notifier,
  cancel: &CancellationToken,
) -> Result<ApplyResult, PipelineError> {
  let mut steps = StepResults::default();
  let total = ctx.environment.node_sets.len();

  for (index, (name, node_set)) in ctx.environment.node_sets.iter().enumerate() {
    let Some(provider) = ctx.environment.providers.get(&node_set.provider.name) else {
      steps.push(crate::result::StepResult::failed_code(
        "destroy",
        name,
        format!("unknown provider {:?}", node_set.provider.name),
      ));
      return Ok(ApplyResult { success: false, inventory: None, steps });
    };

    notifier.notify_with_goal("destroy", index + 1, total, &format!("destroying node set {name}"));

    let flow = run_entity_with_hooks(
      ctx,
      notifier,
      cancel,
      &mut steps,
      "destroy",
      name,
      &provider.component,
      "destroy.yaml",
      provider.params.clone(),
      provider.proxy.clone(),
      provider.env.clone(),
      name.clone(),
      Some(node_set.instances),
      node_set.labels.clone(),
      &ctx.environment.hooks.destroy,
      &HookList::default(),
      None,
    )
    .await?;
    if flow == Flow::Stop {
      return Ok(ApplyResult { success: false, inventory: None, steps });
    }
  }

  Ok(ApplyResult {
    success: !steps.has_failure(),
    inventory: None,
    steps,
  })
}
