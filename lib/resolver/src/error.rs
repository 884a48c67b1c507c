use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolverError {
  #[error("cyclic parent chain detected at component '{0}'")]
  CyclicParent(String),
  #[error("component '{0}' has not been fetched yet")]
  NotFetched(String),
  #[error("no main component reference supplied")]
  NoMainComponent,
  #[error(transparent)]
  Fetch(#[from] ekara_scm::FetchError),
  #[error(transparent)]
  Descriptor(#[from] ekara_descriptor::DescriptorError),
  #[error(transparent)]
  Model(#[from] ekara_model::ModelError),
  #[error(transparent)]
  Template(#[from] ekara_template::TemplateError),
  #[error(transparent)]
  Io(#[from] std::io::Error),
}
