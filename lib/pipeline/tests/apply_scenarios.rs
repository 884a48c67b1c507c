//! End-to-end scenarios 3 and 4 from §8, exercised against real shell
//! scripts standing in for `ansible-playbook`/`ansible-inventory` so the
//! subprocess plumbing (not just the in-process logic) is covered.

use ekara_model::{
  Component, EnvMap, Environment, NodeSet, Orchestrator, Platform, Provider, ProviderRef, Stack,
};
use ekara_pipeline::{NoopNotifier, RuntimeContext, SshKeys, apply};
use tokio_util::sync::CancellationToken;

#[cfg(unix)]
fn make_executable(path: &std::path::Path) {
  use std::os::unix::fs::PermissionsExt;
  let mut perms = std::fs::metadata(path).unwrap().permissions();
  perms.set_mode(0o755);
  std::fs::set_permissions(path, perms).unwrap();
}

fn write_inventory_script(dir: &std::path::Path) -> String {
  let path = dir.join("fake-ansible-inventory.sh");
  std::fs::write(&path, "#!/bin/bash\necho '{}'\n").unwrap();
  make_executable(&path);
  path.display().to_string()
}

#[tokio::test]
async fn short_circuits_on_second_node_set_playbook_failure() {
  let tmp = tempfile::tempdir().unwrap();

  let comp_dir = tmp.path().join("compA");
  std::fs::create_dir_all(&comp_dir).unwrap();
  std::fs::write(comp_dir.join("setup.yaml"), "").unwrap();
  std::fs::write(comp_dir.join("create.yaml"), "").unwrap();

  let counter_file = tmp.path().join("counter");

  let script = tmp.path().join("fake-ansible-playbook.sh");
  std::fs::write(
    &script,
    r#"#!/bin/bash
echo "TASK [dummy task]"
playbook="${@: -1}"
name=$(basename "$playbook")
if [ "$name" = "create.yaml" ]; then
  count=0
  if [ -f "$COUNTER_FILE" ]; then count=$(cat "$COUNTER_FILE"); fi
  count=$((count+1))
  echo "$count" > "$COUNTER_FILE"
  if [ "$count" -ge 2 ]; then
    exit 2
  fi
fi
exit 0
"#,
  )
  .unwrap();
  make_executable(&script);

  let mut component = Component::new("compA", "local");
  component.local_path = Some(comp_dir);
  let platform = Platform::new(component);

  let mut env = Environment::new();
  env.providers.insert(
    "p1".into(),
    Provider {
      name: "p1".into(),
      component: "compA".into(),
      ..Default::default()
    },
  );
  let mut provider_env = EnvMap::new();
  provider_env.insert("COUNTER_FILE".into(), counter_file.display().to_string());
  env.providers.get_mut("p1").unwrap().env = provider_env;

  for ns in ["ns1", "ns2"] {
    env.node_sets.insert(
      ns.into(),
      NodeSet {
        name: ns.into(),
        instances: 1,
        provider: ProviderRef { name: "p1".into() },
        ..Default::default()
      },
    );
  }

  let ctx = RuntimeContext {
    base_dir: tmp.path().to_path_buf(),
    platform,
    environment: env,
    component_order: vec!["compA".into()],
    ssh: SshKeys::default(),
    extra_vars_literal: String::new(),
    external_vars: Default::default(),
    ansible_playbook_bin: script.display().to_string(),
    ansible_inventory_bin: write_inventory_script(tmp.path()),
    timeout: None,
  };

  let result = apply(&ctx, &NoopNotifier, &CancellationToken::new())
    .await
    .unwrap();

  assert!(!result.success);
  let phases: Vec<(&str, &str, bool)> = result
    .steps
    .0
    .iter()
    .map(|s| (s.phase.as_str(), s.target.as_str(), s.is_failure()))
    .collect();
  assert_eq!(
    phases,
    vec![
      ("providerSetup", "p1", false),
      ("ansibleInventory", "inventory", false),
      ("providerCreate", "ns1", false),
      ("providerCreate", "ns2", true),
    ]
  );
}

#[tokio::test]
async fn self_deployable_stack_runs_own_root_other_falls_back_to_orchestrator() {
  let tmp = tempfile::tempdir().unwrap();

  let stack1_dir = tmp.path().join("stackComp1");
  let stack2_dir = tmp.path().join("stackComp2");
  let orch_dir = tmp.path().join("orchComp");
  std::fs::create_dir_all(&stack1_dir).unwrap();
  std::fs::create_dir_all(&stack2_dir).unwrap();
  std::fs::create_dir_all(&orch_dir).unwrap();
  std::fs::write(stack1_dir.join("deploy.yaml"), "").unwrap();
  std::fs::write(orch_dir.join("setup.yaml"), "").unwrap();
  std::fs::write(orch_dir.join("install.yaml"), "").unwrap();
  std::fs::write(orch_dir.join("deploy.yaml"), "").unwrap();

  let args_file_s1 = tmp.path().join("args-s1");
  let args_file_s2 = tmp.path().join("args-s2");

  let script = tmp.path().join("fake-ansible-playbook.sh");
  std::fs::write(
    &script,
    r#"#!/bin/bash
echo "TASK [dummy task]"
if [ -n "$ARGS_FILE" ]; then
  echo "$@" >> "$ARGS_FILE"
fi
exit 0
"#,
  )
  .unwrap();
  make_executable(&script);

  let mut stack1_component = Component::new("stackComp1", "local");
  stack1_component.local_path = Some(stack1_dir.clone());
  let mut platform = Platform::new(stack1_component);

  let mut stack2_component = Component::new("stackComp2", "local");
  stack2_component.local_path = Some(stack2_dir.clone());
  platform.register(stack2_component);

  let mut orch_component = Component::new("orchComp", "local");
  orch_component.local_path = Some(orch_dir.clone());
  platform.register(orch_component);

  let mut env = Environment::new();
  env.orchestrator = Some(Orchestrator {
    component: "orchComp".into(),
    ..Default::default()
  });

  let mut s1_env = EnvMap::new();
  s1_env.insert("ARGS_FILE".into(), args_file_s1.display().to_string());
  env.stacks.insert(
    "s1".into(),
    Stack {
      name: "s1".into(),
      component: Some("stackComp1".into()),
      env: s1_env,
      ..Default::default()
    },
  );

  let mut s2_env = EnvMap::new();
  s2_env.insert("ARGS_FILE".into(), args_file_s2.display().to_string());
  env.stacks.insert(
    "s2".into(),
    Stack {
      name: "s2".into(),
      component: Some("stackComp2".into()),
      env: s2_env,
      ..Default::default()
    },
  );

  let ctx = RuntimeContext {
    base_dir: tmp.path().to_path_buf(),
    platform,
    environment: env,
    component_order: vec!["stackComp1".into(), "stackComp2".into(), "orchComp".into()],
    ssh: SshKeys::default(),
    extra_vars_literal: String::new(),
    external_vars: Default::default(),
    ansible_playbook_bin: script.display().to_string(),
    ansible_inventory_bin: write_inventory_script(tmp.path()),
    timeout: None,
  };

  let result = apply(&ctx, &NoopNotifier, &CancellationToken::new())
    .await
    .unwrap();
  assert!(result.success, "steps: {:?}", result.steps);

  let s1_args = std::fs::read_to_string(&args_file_s1).unwrap();
  assert!(s1_args.contains("stackComp1"));
  assert!(s1_args.contains("deploy.yaml"));
  assert!(!s1_args.contains("stack_path="));

  let s2_args = std::fs::read_to_string(&args_file_s2).unwrap();
  assert!(s2_args.contains("orchComp"));
  assert!(s2_args.contains("deploy.yaml"));
  assert!(s2_args.contains(&format!("stack_path={}", stack2_dir.display())));
  assert!(s2_args.contains("stack_name=s2"));
}
