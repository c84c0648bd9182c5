use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::config::AppConfig;

pub const CONFIG_FILE: &str = "config.toml";

/// Error type for config and state file I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not parse config.toml: {0}")]
    EditParseError(#[from] toml_edit::TomlError),
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Resolve the config directory: explicit override, then `$TASKFLOW_HOME`,
/// then `$XDG_CONFIG_HOME/taskflow`, then `~/.config/taskflow`.
pub fn config_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Ok(dir) = std::env::var("TASKFLOW_HOME")
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".config"));
    base.join("taskflow")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Read config.toml, returning both the parsed config and the raw toml_edit
/// document for formatting-preserving edits. A missing file yields defaults.
pub fn read_config(dir: &Path) -> Result<(AppConfig, toml_edit::DocumentMut), ConfigError> {
    let path = dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(ConfigError::ReadError { path, source: e }),
    };
    let config: AppConfig = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Load the config, falling back to defaults (with a warning) if it is unreadable
pub fn load_config_or_default(dir: &Path) -> AppConfig {
    match read_config(dir) {
        Ok((config, _)) => config,
        Err(e) => {
            tracing::warn!(error = %e, "using default config");
            AppConfig::default()
        }
    }
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let path = dir.join(CONFIG_FILE);
    fs::create_dir_all(dir).map_err(|e| ConfigError::WriteError {
        path: dir.to_path_buf(),
        source: e,
    })?;
    atomic_write(&path, doc.to_string().as_bytes())
        .map_err(|e| ConfigError::WriteError { path, source: e })
}

/// Keys settable through `tf config set`
pub const SETTABLE_KEYS: [&str; 3] = ["api.base_url", "api.version", "api.timeout_secs"];

/// Set a dotted key in the config document
pub fn set_value(doc: &mut toml_edit::DocumentMut, key: &str, value: &str) -> Result<(), ConfigError> {
    let Some((table, field)) = key.split_once('.') else {
        return Err(ConfigError::UnknownKey(key.into()));
    };
    if !SETTABLE_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey(key.into()));
    }
    if !doc.contains_key(table) {
        doc[table] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[table][field] = match field {
        "timeout_secs" => {
            let secs: i64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: key.into(),
                value: value.into(),
            })?;
            toml_edit::value(secs)
        }
        "base_url" => toml_edit::value(value.trim_end_matches('/')),
        _ => toml_edit::value(value),
    };
    Ok(())
}

/// Replace `path` with `content` via a temp file in the same directory
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
