//! Persisted settings store.
//!
//! Settings live in a small JSON file loaded once at startup and saved
//! only on explicit user action. A missing, partial, or corrupt file is
//! treated as absent: every field falls back to its built-in default
//! rather than failing the session.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{KnownModel, Model};

/// Default settings file name, next to the working directory.
pub const SETTINGS_FILE: &str = "tutor_settings.json";

/// The persisted key-value settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the local inference endpoint.
    pub ollama_url: String,

    /// Model identifier to chat with.
    pub model: Model,

    /// Retention window: user/assistant pairs kept in active context.
    pub max_memory: usize,

    /// Default sampling temperature.
    pub temperature: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434/v1".to_string(),
            model: Model::Known(KnownModel::Phi3Mini),
            max_memory: 4,
            temperature: 0.3,
        }
    }
}

impl Settings {
    /// Loads settings from the given path.
    ///
    /// A missing or unparsable file yields the defaults; fields absent
    /// from the file keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        match fs::read_to_string(path.as_ref()) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => Settings::default(),
        }
    }

    /// Saves settings to the given path.
    ///
    /// The write is all-or-nothing: the record is serialized first and
    /// written via a temporary file renamed into place, so failure
    /// leaves any previous file untouched.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self).map_err(|err| {
            Error::serialization("failed to serialize settings", Some(Box::new(err)))
        })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)
            .map_err(|err| Error::io("failed to write settings file", err))?;
        fs::rename(&tmp, path)
            .map_err(|err| Error::io("failed to replace settings file", err))?;
        Ok(())
    }
}
