use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("types on field {key} do not match | got {value:?}, expected object")]
  ObjectFieldTypeMismatch { key: String, value: serde_json::Value },

  #[error("types on field {key} do not match | got {value:?}, expected array")]
  ArrayFieldTypeMismatch { key: String, value: serde_json::Value },

  #[error("failed to open file at {path:?} | {e}")]
  FileOpen { e: std::io::Error, path: PathBuf },

  #[error("failed to read contents of file at {path:?} | {e}")]
  ReadFileContents { e: std::io::Error, path: PathBuf },

  #[error("failed to parse toml file at {path:?} | {e}")]
  ParseToml { e: toml::de::Error, path: PathBuf },

  #[error("failed to parse yaml file at {path:?} | {e}")]
  ParseYaml { e: serde_yaml_ng::Error, path: PathBuf },

  #[error("failed to parse json file at {path:?} | {e}")]
  ParseJson { e: serde_json::Error, path: PathBuf },

  #[error("unsupported config file type at {path:?}")]
  UnsupportedFileType { path: PathBuf },

  #[error("failed to parse merged config into final type | {e}")]
  ParseFinalJson { e: serde_json::Error },

  #[error("failed to serialize config to json value | {e}")]
  SerializeJson { e: serde_json::Error },

  #[error("parsed config value is not an object")]
  ValueIsNotObject,
}
