use crate::component::Params;

/// An immutable snapshot of (model-so-far, external vars, launch-context
/// values) exposed to the template renderer (C2). Rebuilt (`refresh`) after
/// every successful merge in the resolver's fixed-point loop, so later
/// fragments and later template renderings of a component's own files see
/// the current full model.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TemplateContext {
  /// The merged environment built so far, as a serializable snapshot
  /// (`serde_json::Value` so the renderer does not need a hard dependency
  /// on [`crate::Environment`]'s exact shape).
  pub model: serde_json::Value,
  /// Parameters supplied by the user at launch time (`--var key=value`,
  /// or a params file), layered under `vars` in the render context.
  pub external_vars: Params,
  /// How many phases of the pipeline to skip (`util/launch_context.go
  /// Skipping()`).
  pub skip_level: u8,
  /// Requested verbosity (`util/launch_context.go Verbosity()`).
  pub verbosity: u8,
}

impl TemplateContext {
  pub fn new(external_vars: Params) -> Self {
    TemplateContext {
      model: serde_json::Value::Null,
      external_vars,
      skip_level: 0,
      verbosity: 0,
    }
  }

  /// Replaces the `model` snapshot with the current state of the
  /// environment being built.
  pub fn refresh(&mut self, model: serde_json::Value) {
    self.model = model;
  }
}
