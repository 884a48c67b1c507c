use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Resolver(#[from] ekara_resolver::ResolverError),

  #[error(transparent)]
  Exchange(#[from] ekara_exchange::ExchangeError),

  #[error(transparent)]
  Runner(#[from] ekara_runner::RunnerError),

  #[error(transparent)]
  Model(#[from] ekara_model::ModelError),

  #[error("unknown task referenced by a hook: {0}")]
  UnknownTask(String),

  #[error("unknown provider referenced by node set {0:?}")]
  UnknownProvider(String),

  #[error("no orchestrator configured")]
  NoOrchestrator,

  #[error("failed to serialize base params: {0}")]
  Serialize(#[from] serde_yaml_ng::Error),
}
