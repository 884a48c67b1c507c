//! # Ekara Config
//!
//! Generic config-file loading and merging: parses TOML/YAML/JSON files
//! under one or more paths (optionally filtered by wildcard keyword and
//! followed through `.ekinclude` files), interpolates `${VAR}` against
//! the process environment, and merges them into a single value. Carries
//! no opinion about what that value's shape is — the binary layers CLI
//! flags and environment variables on top with its own merge call.

use std::path::Path;

use colored::Colorize;
use indexmap::IndexSet;
use serde::de::DeserializeOwned;

mod error;
mod includes;
mod load;
mod merge;

pub use error::Error;
pub use merge::{merge_config, merge_objects};

pub type Result<T> = ::core::result::Result<T, Error>;

/// Configuration for loading config files.
pub struct ConfigLoader<'outer, 'inner> {
  /// Paths to either files or directories to include in the final value.
  /// Later entries (higher index) override earlier ones.
  pub paths: &'outer [&'inner Path],
  /// Wildcard patterns restricting which file names in a directory are
  /// picked up. Later patterns outrank earlier ones within one directory.
  pub match_wildcards: &'outer [&'inner str],
  /// File name searched for in each directory to pull in further paths.
  pub include_file_name: &'static str,
  /// Recurse into nested objects instead of replacing them wholesale.
  pub merge_nested: bool,
  /// Extend arrays instead of replacing them wholesale.
  pub extend_array: bool,
  /// Print the files discovered and the includes followed.
  pub debug_print: bool,
}

impl ConfigLoader<'_, '_> {
  pub fn load<T: DeserializeOwned>(self) -> Result<T> {
    let ConfigLoader {
      paths,
      match_wildcards,
      include_file_name,
      merge_nested,
      extend_array,
      debug_print,
    } = self;

    let mut wildcards = Vec::with_capacity(match_wildcards.len());
    for &wc in match_wildcards {
      match wildcard::Wildcard::new(wc.as_bytes()) {
        Ok(wc) => wildcards.push(wc),
        Err(e) => {
          eprintln!("{}: keyword '{}' is not a valid wildcard | {e:?}", "ERROR".red(), wc.bold());
        }
      }
    }

    let mut all_files = IndexSet::new();
    for &path in paths {
      let Ok(metadata) = std::fs::metadata(path) else {
        continue;
      };
      if metadata.is_dir() {
        let mut files = Vec::new();
        load::load_config_files(&mut files, path, &wildcards, include_file_name, debug_print);
        files.sort_by(|(a_index, a_path), (b_index, b_path)| a_index.cmp(b_index).then(a_path.cmp(b_path)));
        all_files.extend(files.into_iter().map(|(_, path)| path));
      } else if metadata.is_file() {
        let path = path.to_path_buf();
        all_files.shift_remove(&path);
        all_files.insert(path);
      }
    }

    if debug_print {
      println!("{}: {}: {all_files:?}", "DEBUG".cyan(), "found files".dimmed());
    }

    load::load_parse_config_files(&all_files.into_iter().collect::<Vec<_>>(), merge_nested, extend_array)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::Deserialize;

  #[derive(Debug, Deserialize, PartialEq)]
  struct Sample {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    tags: Vec<String>,
  }

  #[test]
  fn later_file_overrides_earlier_one() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("01-base.yaml"), "name: base\ncount: 1\ntags: [a]\n").unwrap();
    std::fs::write(dir.path().join("02-override.yaml"), "count: 2\ntags: [b]\n").unwrap();

    let sample: Sample = ConfigLoader {
      paths: &[dir.path()],
      match_wildcards: &[],
      include_file_name: ".ekinclude",
      merge_nested: true,
      extend_array: false,
      debug_print: false,
    }
    .load()
    .unwrap();

    assert_eq!(sample.name.as_deref(), Some("base"));
    assert_eq!(sample.count, Some(2));
    assert_eq!(sample.tags, vec!["b".to_string()]);
  }

  #[test]
  fn extend_array_concatenates_instead_of_replacing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("01-base.yaml"), "tags: [a]\n").unwrap();
    std::fs::write(dir.path().join("02-override.yaml"), "tags: [b]\n").unwrap();

    let sample: Sample = ConfigLoader {
      paths: &[dir.path()],
      match_wildcards: &[],
      include_file_name: ".ekinclude",
      merge_nested: true,
      extend_array: true,
      debug_print: false,
    }
    .load()
    .unwrap();

    assert_eq!(sample.tags, vec!["a".to_string(), "b".to_string()]);
  }

  #[test]
  fn env_var_is_interpolated_into_file_contents() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.yaml"), "name: ${EKARA_CONFIG_TEST_VAR}\n").unwrap();
    unsafe { std::env::set_var("EKARA_CONFIG_TEST_VAR", "interpolated") };

    let sample: Sample = ConfigLoader {
      paths: &[dir.path()],
      match_wildcards: &[],
      include_file_name: ".ekinclude",
      merge_nested: true,
      extend_array: false,
      debug_print: false,
    }
    .load()
    .unwrap();

    unsafe { std::env::remove_var("EKARA_CONFIG_TEST_VAR") };
    assert_eq!(sample.name.as_deref(), Some("interpolated"));
  }

  #[test]
  fn merge_objects_rejects_type_mismatch_between_sources() {
    let mut target = serde_json::Map::new();
    target.insert("count".to_string(), serde_json::json!({"nested": 1}));
    let mut source = serde_json::Map::new();
    source.insert("count".to_string(), serde_json::json!([1, 2]));

    let err = merge_objects(target, source, true, true).unwrap_err();
    assert!(matches!(err, Error::ObjectFieldTypeMismatch { .. }));
  }
}
