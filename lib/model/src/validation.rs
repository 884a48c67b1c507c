use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
  Error,
  Warning,
}

/// A single validation finding raised while parsing or merging a
/// descriptor fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
  #[serde(rename = "type")]
  pub error_type: ErrorType,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
}

impl ValidationError {
  pub fn error(message: impl Into<String>) -> Self {
    ValidationError {
      error_type: ErrorType::Error,
      message: message.into(),
      location: None,
    }
  }

  pub fn warning(message: impl Into<String>) -> Self {
    ValidationError {
      error_type: ErrorType::Warning,
      message: message.into(),
      location: None,
    }
  }

  pub fn at(mut self, location: impl Into<String>) -> Self {
    self.location = Some(location.into());
    self
  }
}

/// The aggregated result of one or more validation passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrors {
  pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
  pub fn push(&mut self, error: ValidationError) {
    self.errors.push(error);
  }

  pub fn extend(&mut self, other: ValidationErrors) {
    self.errors.extend(other.errors);
  }

  pub fn has_errors(&self) -> bool {
    self
      .errors
      .iter()
      .any(|e| e.error_type == ErrorType::Error)
  }

  pub fn errors_only(&self) -> impl Iterator<Item = &ValidationError> {
    self
      .errors
      .iter()
      .filter(|e| e.error_type == ErrorType::Error)
  }

  pub fn warnings_only(&self) -> impl Iterator<Item = &ValidationError> {
    self
      .errors
      .iter()
      .filter(|e| e.error_type == ErrorType::Warning)
  }
}
