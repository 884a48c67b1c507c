//! Integration tests exercising the end-to-end scenarios from §8: a
//! three-level parent chain with parameter overrides, and hook ordering
//! across a parent chain. Both run entirely over [`LocalTransport`] so
//! no network or `git` binary is needed.

use ekara_model::Params;
use ekara_resolver::{ResolveInput, resolve};
use ekara_scm::{FetchRef, Fetcher, LocalTransport};

fn write(dir: &std::path::Path, name: &str, content: &str) {
  std::fs::create_dir_all(dir).unwrap();
  std::fs::write(dir.join(name), content).unwrap();
}

#[tokio::test]
async fn three_level_parent_chain_overrides_provider_params() {
  let origin = tempfile::tempdir().unwrap();
  let root = origin.path();

  let parent2_dir = root.join("parent2");
  let parent1_dir = root.join("parent1");
  let comp1_dir = root.join("comp1");
  let comp2_dir = root.join("comp2");
  let main_dir = root.join("main");

  std::fs::create_dir_all(&comp2_dir).unwrap();

  write(
    &parent2_dir,
    "ekara.yaml",
    &format!(
      r#"
ekara:
  components:
    comp2:
      repository: "{comp2}"
providers:
  p1:
    component: comp2
    params:
      param_key1: parent2_param_key1_value
      param_key4: parent2_param_key4_value
    proxy:
      http_proxy: http_proxy_parent2
"#,
      comp2 = comp2_dir.display()
    ),
  );

  write(
    &parent1_dir,
    "ekara.yaml",
    &format!(
      r#"
ekara:
  parent:
    repository: "{parent2}"
  components:
    comp1:
      repository: "{comp1}"
providers:
  p1:
    params:
      param_key4: parent1_param_key4_value
    proxy:
      no_proxy: no_proxy_parent1
"#,
      parent2 = parent2_dir.display(),
      comp1 = comp1_dir.display()
    ),
  );

  write(
    &comp1_dir,
    "ekara.yaml",
    r#"
providers:
  p1:
    proxy:
      https_proxy: https_proxy_comp1
"#,
  );

  write(
    &main_dir,
    "ekara.yaml",
    &format!(
      r#"
name: ekara-demo-var
qualifier: dev
ekara:
  parent:
    repository: "{parent1}"
providers:
  p1:
    component: comp2
    params:
      param_key4: desc_param_key4_value
"#,
      parent1 = parent1_dir.display()
    ),
  );

  let fetcher = Fetcher::with_transports(
    origin.path().join("__base__"),
    vec![Box::new(LocalTransport)],
  );

  let input = ResolveInput {
    main_ref: FetchRef {
      id: "main".into(),
      repository: main_dir.display().to_string(),
      version: None,
      token: None,
    },
    external_vars: Params::default(),
  };

  let output = resolve(&fetcher, input).await.unwrap();

  assert!(!output.validation.has_errors());

  let p1 = &output.environment.providers["p1"];
  assert_eq!(p1.component, "comp2");
  assert_eq!(
    p1.params["param_key1"],
    serde_yaml_ng::Value::from("parent2_param_key1_value")
  );
  assert_eq!(
    p1.params["param_key4"],
    serde_yaml_ng::Value::from("desc_param_key4_value")
  );
  assert_eq!(p1.params.len(), 2);
  assert_eq!(p1.proxy.http_proxy.as_deref(), Some("http_proxy_parent2"));
  assert_eq!(p1.proxy.https_proxy.as_deref(), Some("https_proxy_comp1"));
  assert_eq!(p1.proxy.no_proxy.as_deref(), Some("no_proxy_parent1"));

  for id in ["main", "comp1", "comp2"] {
    assert!(output.platform.get(id).is_ok(), "missing component {id}");
  }
}

#[tokio::test]
async fn hook_ordering_across_parent_chain() {
  let origin = tempfile::tempdir().unwrap();
  let root = origin.path();

  let parent1_dir = root.join("parent1");
  let main_dir = root.join("main");

  write(
    &parent1_dir,
    "ekara.yaml",
    r#"
hooks:
  create:
    before:
      - task: hook1
        prefix: H1
"#,
  );

  write(
    &main_dir,
    "ekara.yaml",
    &format!(
      r#"
ekara:
  parent:
    repository: "{parent1}"
hooks:
  create:
    before:
      - task: hook2
        prefix: H2
"#,
      parent1 = parent1_dir.display()
    ),
  );

  let fetcher = Fetcher::with_transports(
    origin.path().join("__base__"),
    vec![Box::new(LocalTransport)],
  );

  let input = ResolveInput {
    main_ref: FetchRef {
      id: "main".into(),
      repository: main_dir.display().to_string(),
      version: None,
      token: None,
    },
    external_vars: Params::default(),
  };

  let output = resolve(&fetcher, input).await.unwrap();

  let before = &output.environment.hooks.create.before;
  assert_eq!(before.len(), 2);
  assert_eq!(before[0].prefix, "H1");
  assert_eq!(before[1].prefix, "H2");
}
