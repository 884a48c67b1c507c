use ekara_model::{ErrorType, ValidationError, ValidationErrors};
use serde::{Deserialize, Serialize};

/// Per-step lifecycle, §4.8: `Pending -> Running -> (Ok | FailedCode |
/// FailedPlaybook | Cancelled)`. Terminal states are final — nothing
/// transitions out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepStatus {
  Pending,
  Running,
  Ok,
  FailedCode,
  FailedPlaybook,
  Cancelled,
}

/// One step's outcome, labeled with the phase it belongs to (`providerSetup`,
/// `create node-set-1`, `hook:h1`, ...) so a flat `Vec<StepResult>` reads
/// like a timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
  pub phase: String,
  pub target: String,
  pub status: StepStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub playbook: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub component: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub exit_code: Option<i32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reason: Option<String>,
}

impl StepResult {
  pub fn ok(phase: impl Into<String>, target: impl Into<String>) -> Self {
    StepResult {
      phase: phase.into(),
      target: target.into(),
      status: StepStatus::Ok,
      playbook: None,
      component: None,
      exit_code: None,
      reason: None,
    }
  }

  pub fn failed_playbook(
    phase: impl Into<String>,
    target: impl Into<String>,
    playbook: impl Into<String>,
    component: impl Into<String>,
    exit_code: i32,
  ) -> Self {
    StepResult {
      phase: phase.into(),
      target: target.into(),
      status: StepStatus::FailedPlaybook,
      playbook: Some(playbook.into()),
      component: Some(component.into()),
      exit_code: Some(exit_code),
      reason: None,
    }
  }

  pub fn failed_code(
    phase: impl Into<String>,
    target: impl Into<String>,
    reason: impl Into<String>,
  ) -> Self {
    StepResult {
      phase: phase.into(),
      target: target.into(),
      status: StepStatus::FailedCode,
      playbook: None,
      component: None,
      exit_code: None,
      reason: Some(reason.into()),
    }
  }

  pub fn cancelled(phase: impl Into<String>, target: impl Into<String>) -> Self {
    StepResult {
      phase: phase.into(),
      target: target.into(),
      status: StepStatus::Cancelled,
      playbook: None,
      component: None,
      exit_code: None,
      reason: Some("cancelled".into()),
    }
  }

  pub fn is_failure(&self) -> bool {
    !matches!(self.status, StepStatus::Ok)
  }
}

/// An ordered, append-only timeline of [`StepResult`]s for one action run.
/// Every step is appended exactly once, on its one and only terminal
/// transition (a source bug appended the same result twice on one
/// success path — see the design notes for why this type forbids that by
/// construction: `push` is the only way in).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepResults(pub Vec<StepResult>);

impl StepResults {
  pub fn push(&mut self, result: StepResult) {
    self.0.push(result);
  }

  pub fn has_failure(&self) -> bool {
    self.0.iter().any(StepResult::is_failure)
  }
}

pub trait ActionResult {
  fn is_success(&self) -> bool;

  fn as_json(&self) -> serde_json::Result<String>
  where
    Self: Serialize,
  {
    serde_json::to_string_pretty(self)
  }

  fn as_yaml(&self) -> Result<String, serde_yaml_ng::Error>
  where
    Self: Serialize,
  {
    serde_yaml_ng::to_string(self)
  }

  fn as_plain_text(&self) -> String;
}

/// §6: `ApplyResult = {success: bool, inventory: {...}}`. `steps` is kept
/// for CLI/log reporting but isn't part of the documented wire shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
  pub success: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub inventory: Option<serde_json::Value>,
  #[serde(skip)]
  pub steps: StepResults,
}

impl ActionResult for ApplyResult {
  fn is_success(&self) -> bool {
    self.success
  }

  fn as_plain_text(&self) -> String {
    let mut out = if self.success {
      "apply: success\n".to_string()
    } else {
      "apply: failed\n".to_string()
    };
    for step in &self.steps.0 {
      out.push_str(&format!("  {} [{}] {:?}\n", step.phase, step.target, step.status));
    }
    out
  }
}

/// §6: `ValidateResult = {errors: [{type, message, location}]}` — both
/// errors and warnings live in the same classified list, per
/// [`ekara_model::ValidationError::error_type`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateResult {
  pub errors: Vec<ValidationError>,
}

impl ValidateResult {
  pub fn from_validation(validation: ValidationErrors) -> Self {
    ValidateResult {
      errors: validation.errors,
    }
  }

  pub fn warnings(&self) -> impl Iterator<Item = &ValidationError> {
    self.errors.iter().filter(|e| e.error_type == ErrorType::Warning)
  }
}

impl ActionResult for ValidateResult {
  fn is_success(&self) -> bool {
    !self.errors.iter().any(|e| e.error_type == ErrorType::Error)
  }

  fn as_plain_text(&self) -> String {
    let mut out = String::new();
    for error in &self.errors {
      let location = error.location.as_deref().unwrap_or("");
      out.push_str(&format!(
        "{:?}: {} {}\n",
        error.error_type, error.message, location
      ));
    }
    out
  }
}
