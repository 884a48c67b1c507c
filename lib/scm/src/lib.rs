//! # Ekara SCM
//!
//! The SCM Fetcher (C3): retrieves a component reference (url + version)
//! into a local working tree. Pluggable per URL scheme; ships a git
//! transport and a local-directory transport (ground:
//! `lagoon-platform/engine` fetches over "http or https or even a file
//! system location", and the teacher's own `lib/git` shells out to the
//! `git` binary rather than linking `git2`).

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
  sync::Mutex,
};

use thiserror::Error;

mod git;
mod local;

pub use git::GitTransport;
pub use local::LocalTransport;

pub const DESCRIPTOR_FILE_NAME: &str = "ekara.yaml";

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("repository not found: {0}")]
  NotFound(String),
  #[error("authentication denied for {0}")]
  AuthDenied(String),
  #[error("transport error fetching {url}: {message}")]
  Transport { url: String, message: String },
  #[error("checkout failed for {url}@{version}: {message}")]
  Checkout {
    url: String,
    version: String,
    message: String,
  },
  #[error("no transport registered for url '{0}'")]
  NoTransport(String),
}

/// A repository + version + credentials tuple to resolve into a local tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRef {
  pub id: String,
  pub repository: String,
  pub version: Option<String>,
  pub token: Option<String>,
}

/// Result of a successful fetch (§4.1 contract).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedComponent {
  pub local_path: PathBuf,
  pub has_descriptor: bool,
  pub descriptor_path: Option<PathBuf>,
}

/// Implemented once per URL scheme the fetcher understands.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
  fn matches(&self, repository: &str) -> bool;
  async fn fetch(
    &self,
    fetch_ref: &FetchRef,
    dest: &Path,
  ) -> Result<(), FetchError>;
}

/// Dispatches to the first matching [`Transport`] and caches results by
/// component id, so re-fetching the same ref is idempotent (§4.1).
pub struct Fetcher {
  base_dir: PathBuf,
  transports: Vec<Box<dyn Transport>>,
  cache: Mutex<HashMap<String, FetchedComponent>>,
}

impl Fetcher {
  pub fn new(base_dir: impl Into<PathBuf>) -> Self {
    Fetcher {
      base_dir: base_dir.into(),
      transports: vec![
        Box::new(LocalTransport),
        Box::new(GitTransport),
      ],
      cache: Mutex::new(HashMap::new()),
    }
  }

  pub fn with_transports(
    base_dir: impl Into<PathBuf>,
    transports: Vec<Box<dyn Transport>>,
  ) -> Self {
    Fetcher {
      base_dir: base_dir.into(),
      transports,
      cache: Mutex::new(HashMap::new()),
    }
  }

  pub fn components_dir(&self) -> PathBuf {
    self.base_dir.join("components")
  }

  #[tracing::instrument(level = "debug", skip(self, fetch_ref), fields(id = %fetch_ref.id))]
  pub async fn fetch(
    &self,
    fetch_ref: &FetchRef,
  ) -> Result<FetchedComponent, FetchError> {
    if let Some(cached) = self.cache.lock().unwrap().get(&fetch_ref.id) {
      tracing::debug!("component {} already fetched, reusing", fetch_ref.id);
      return Ok(cached.clone());
    }

    let dest = self.components_dir().join(&fetch_ref.id);
    let transport = self
      .transports
      .iter()
      .find(|t| t.matches(&fetch_ref.repository))
      .ok_or_else(|| FetchError::NoTransport(fetch_ref.repository.clone()))?;

    std::fs::create_dir_all(&dest).map_err(|e| FetchError::Transport {
      url: fetch_ref.repository.clone(),
      message: e.to_string(),
    })?;

    transport.fetch(fetch_ref, &dest).await?;

    let descriptor_path = dest.join(DESCRIPTOR_FILE_NAME);
    let has_descriptor = descriptor_path.is_file();
    let fetched = FetchedComponent {
      local_path: dest,
      has_descriptor,
      descriptor_path: has_descriptor.then_some(descriptor_path),
    };

    self
      .cache
      .lock()
      .unwrap()
      .insert(fetch_ref.id.clone(), fetched.clone());
    Ok(fetched)
  }
}
