use crate::{Component, ModelError, Platform};

/// Anything that names a component and resolves to its declared entity
/// (provider, orchestrator, stack, task). Resolution goes through the
/// [`Platform`] registry by id — never through a stored pointer, per the
/// REDESIGN FLAG in §9 ("replace source's mutable back-references").
pub trait ComponentReferencer {
  fn component_id(&self) -> &str;

  fn resolve<'p>(
    &self,
    platform: &'p Platform,
  ) -> Result<&'p Component, ModelError> {
    platform.get(self.component_id())
  }
}

impl ComponentReferencer for str {
  fn component_id(&self) -> &str {
    self
  }
}

impl ComponentReferencer for String {
  fn component_id(&self) -> &str {
    self.as_str()
  }
}
