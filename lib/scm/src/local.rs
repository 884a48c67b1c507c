use std::path::Path;

use crate::{FetchError, FetchRef, Transport};

/// Treats `repository` as a plain filesystem path and copies it into
/// `dest`. The only transport that needs no network or external binary,
/// so it is what the resolver's own tests fetch components through.
pub struct LocalTransport;

#[async_trait::async_trait]
impl Transport for LocalTransport {
  fn matches(&self, repository: &str) -> bool {
    Path::new(repository).is_dir()
  }

  async fn fetch(
    &self,
    fetch_ref: &FetchRef,
    dest: &Path,
  ) -> Result<(), FetchError> {
    let src = Path::new(&fetch_ref.repository).to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || copy_tree(&src, &dest))
      .await
      .map_err(|e| FetchError::Transport {
        url: fetch_ref.repository.clone(),
        message: e.to_string(),
      })?
      .map_err(|e| FetchError::Transport {
        url: fetch_ref.repository.clone(),
        message: e.to_string(),
      })
  }
}

fn copy_tree(src: &Path, dest: &Path) -> std::io::Result<()> {
  if !src.is_dir() {
    return Err(std::io::Error::new(
      std::io::ErrorKind::NotFound,
      format!("{} is not a directory", src.display()),
    ));
  }
  for entry in walkdir::WalkDir::new(src).into_iter().filter_map(Result::ok) {
    let relative = entry.path().strip_prefix(src).unwrap();
    let target = dest.join(relative);
    if entry.file_type().is_dir() {
      std::fs::create_dir_all(&target)?;
    } else if entry.file_type().is_file() {
      if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
      }
      std::fs::copy(entry.path(), &target)?;
    }
  }
  Ok(())
}
