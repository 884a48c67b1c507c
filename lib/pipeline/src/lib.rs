//! # Ekara Pipeline
//!
//! The Action Pipeline (C10), Progress Notifier (C11) and Result
//! Aggregator (C12): `Validate`, `Check`, `Apply` and `Destroy` over a
//! resolved [`ekara_model::Environment`], driving the playbook runner
//! (`ekara_runner`) step by step per §4.8.

mod action;
mod context;
mod error;
mod notifier;
mod result;
mod steps;
mod validate;

pub use action::{apply, check, destroy, validate};
pub use ekara_runner::{NoopNotifier, Notifier};
pub use context::{BaseParams, RuntimeContext, SshKeys, build_env_vars};
pub use error::PipelineError;
pub use notifier::{MultiNotifier, TracingNotifier};
pub use result::{ActionResult, ApplyResult, StepResult, StepResults, StepStatus, ValidateResult};
pub use steps::Flow;
