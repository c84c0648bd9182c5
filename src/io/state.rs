use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::io::config_io::{ConfigError, atomic_write};
use crate::model::user::User;

pub const STATE_FILE: &str = "state.json";
pub const TOKEN_KEY: &str = "token";
pub const THEME_KEY: &str = "theme";

/// Persisted client state (state.json): a flat string map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientState {
    entries: BTreeMap<String, String>,
}

impl ClientState {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn token(&self) -> Option<&str> {
        self.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Stored theme. Unknown values read as the default.
    pub fn theme(&self) -> ThemeMode {
        self.get(THEME_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

/// Read state.json. Missing or malformed files read as empty.
pub fn read_state(dir: &Path) -> ClientState {
    let path = dir.join(STATE_FILE);
    let Ok(content) = fs::read_to_string(&path) else {
        return ClientState::default();
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "ignoring malformed state file");
        ClientState::default()
    })
}

/// Write state.json
pub fn write_state(dir: &Path, state: &ClientState) -> Result<(), ConfigError> {
    let path = dir.join(STATE_FILE);
    fs::create_dir_all(dir).map_err(|e| ConfigError::WriteError {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let content = serde_json::to_string_pretty(state).map_err(|e| ConfigError::WriteError {
        path: path.clone(),
        source: e.into(),
    })?;
    atomic_write(&path, content.as_bytes()).map_err(|e| ConfigError::WriteError { path, source: e })
}

/// Light or dark palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    Light,
    #[default]
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn toggle(self) -> ThemeMode {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            _ => Err(format!("invalid theme '{}' (expected light or dark)", s)),
        }
    }
}

/// The signed-in user, if any. Loaded from state.json on startup, cleared on logout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    pub fn from_state(state: &ClientState) -> Self {
        Session {
            token: state.token().map(str::to_string),
            user: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Establish a session and record the token
    pub fn sign_in(&mut self, state: &mut ClientState, token: String, user: Option<User>) {
        state.set(TOKEN_KEY, token.clone());
        self.token = Some(token);
        self.user = user;
    }

    /// Drop the session and forget the token
    pub fn sign_out(&mut self, state: &mut ClientState) {
        state.remove(TOKEN_KEY);
        self.token = None;
        self.user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut state = ClientState::default();
        state.set(TOKEN_KEY, "abc.def");
        state.set(THEME_KEY, "light");

        write_state(dir.path(), &state).unwrap();
        let loaded = read_state(dir.path());
        assert_eq!(loaded, state);
        assert_eq!(loaded.token(), Some("abc.def"));
        assert_eq!(loaded.theme(), ThemeMode::Light);

        let raw = fs::read_to_string(dir.path().join(STATE_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["token"], "abc.def");
        assert_eq!(json["theme"], "light");
    }

    #[test]
    fn read_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let state = read_state(dir.path());
        assert_eq!(state, ClientState::default());
        assert_eq!(state.token(), None);
        assert_eq!(state.theme(), ThemeMode::Dark);
    }

    #[test]
    fn read_malformed_json_is_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(STATE_FILE), "not json {{{").unwrap();
        assert_eq!(read_state(dir.path()), ClientState::default());
    }

    #[test]
    fn unknown_theme_and_empty_token() {
        let mut state = ClientState::default();
        state.set(THEME_KEY, "sepia");
        state.set(TOKEN_KEY, "");
        assert_eq!(state.theme(), ThemeMode::Dark);
        assert_eq!(state.token(), None);
    }

    #[test]
    fn write_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        write_state(&nested, &ClientState::default()).unwrap();
        assert!(nested.join(STATE_FILE).exists());
    }

    #[test]
    fn session_sign_in_and_out() {
        let mut state = ClientState::default();
        state.set(THEME_KEY, "light");
        let mut session = Session::from_state(&state);
        assert!(!session.is_authenticated());

        session.sign_in(&mut state, "tok".into(), None);
        assert!(session.is_authenticated());
        assert_eq!(state.token(), Some("tok"));
        assert_eq!(Session::from_state(&state).token.as_deref(), Some("tok"));

        session.sign_out(&mut state);
        assert_eq!(session, Session::default());
        assert_eq!(state.token(), None);
        assert_eq!(state.theme(), ThemeMode::Light);
    }

    #[test]
    fn theme_mode_parse_and_toggle() {
        assert_eq!("DARK".parse::<ThemeMode>(), Ok(ThemeMode::Dark));
        assert!("blue".parse::<ThemeMode>().is_err());
        assert_eq!(ThemeMode::Dark.toggle(), ThemeMode::Light);
        assert_eq!(ThemeMode::Light.toggle().to_string(), "dark");
    }
}
