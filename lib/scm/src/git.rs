use std::path::Path;

use tokio::process::Command;

use crate::{FetchError, FetchRef, Transport};

/// Shells out to the system `git` binary, the same approach the teacher's
/// `lib/git` takes rather than linking `git2`.
pub struct GitTransport;

impl GitTransport {
  fn remote_url(fetch_ref: &FetchRef) -> String {
    match &fetch_ref.token {
      Some(token) if fetch_ref.repository.starts_with("http") => {
        fetch_ref
          .repository
          .replacen("://", &format!("://token:{token}@"), 1)
      }
      _ => fetch_ref.repository.clone(),
    }
  }

  fn mask(text: &str, fetch_ref: &FetchRef) -> String {
    match &fetch_ref.token {
      Some(token) => text.replace(token, "<TOKEN>"),
      None => text.to_string(),
    }
  }
}

#[async_trait::async_trait]
impl Transport for GitTransport {
  fn matches(&self, repository: &str) -> bool {
    repository.starts_with("http://")
      || repository.starts_with("https://")
      || repository.starts_with("git@")
      || repository.starts_with("ssh://")
  }

  #[tracing::instrument(level = "debug", skip(self, fetch_ref), fields(repository = %fetch_ref.repository))]
  async fn fetch(
    &self,
    fetch_ref: &FetchRef,
    dest: &Path,
  ) -> Result<(), FetchError> {
    let url = Self::remote_url(fetch_ref);

    let mut clone_cmd = Command::new("git");
    clone_cmd.arg("clone").arg("--quiet").arg(&url).arg(dest);
    let output = clone_cmd.output().await.map_err(|e| FetchError::Transport {
      url: fetch_ref.repository.clone(),
      message: e.to_string(),
    })?;

    if !output.status.success() {
      let stderr = Self::mask(&String::from_utf8_lossy(&output.stderr), fetch_ref);
      tracing::warn!("git clone failed: {stderr}");
      return Err(FetchError::Transport {
        url: fetch_ref.repository.clone(),
        message: stderr,
      });
    }

    if let Some(version) = &fetch_ref.version {
      let mut checkout_cmd = Command::new("git");
      checkout_cmd
        .arg("-C")
        .arg(dest)
        .arg("checkout")
        .arg("--quiet")
        .arg(version);
      let output =
        checkout_cmd.output().await.map_err(|e| FetchError::Checkout {
          url: fetch_ref.repository.clone(),
          version: version.clone(),
          message: e.to_string(),
        })?;

      if !output.status.success() {
        let stderr =
          Self::mask(&String::from_utf8_lossy(&output.stderr), fetch_ref);
        return Err(FetchError::Checkout {
          url: fetch_ref.repository.clone(),
          version: version.clone(),
          message: stderr,
        });
      }
    }

    Ok(())
  }
}
