use thiserror::Error;

/// Closed taxonomy of fatal errors raised while building the [`crate::Environment`].
///
/// `PlaybookFailure` and cooperative cancellation are deliberately *not*
/// part of this enum: per the engine's error design they are carried as
/// step results, never thrown.
#[derive(Debug, Error)]
pub enum ModelError {
  #[error("component '{0}' is not registered on the platform")]
  UnknownComponent(String),

  #[error(
    "reference to '{kind}' named '{name}' does not resolve to a declared entity"
  )]
  UnresolvedReference { kind: &'static str, name: String },

  #[error("cyclic parent chain detected: {0}")]
  CyclicParent(String),

  #[error("descriptor is malformed: {0}")]
  MalformedDescriptor(String),
}
