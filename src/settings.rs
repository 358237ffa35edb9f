//! User-facing configuration of the client.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Section under which editors group the settings.
pub const SETTINGS_SECTION: &str = "AutoHotkey";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Absolute path of the interpreter used for status, debugging and the language server.
    pub interpreter_path: String,
    /// Executable used by the run-file command.
    pub runtime_path: String,
}

impl Settings {
    /// Reads settings from a JSON object. Both the bare object and one
    /// nested under [`SETTINGS_SECTION`] are accepted.
    pub fn from_json(value: &serde_json::Value) -> crate::Result<Self> {
        let value = value.get(SETTINGS_SECTION).unwrap_or(value);
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(Self::deserialize(value)?)
    }

    pub fn set(&mut self, key: SettingKey, value: impl Into<String>) {
        let value = value.into();
        match key {
            SettingKey::InterpreterPath => self.interpreter_path = value,
            SettingKey::RuntimePath => self.runtime_path = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    InterpreterPath,
    RuntimePath,
}

impl SettingKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InterpreterPath => "interpreterPath",
            Self::RuntimePath => "runtimePath",
        }
    }

    /// Fully qualified key, e.g. `AutoHotkey.runtimePath`.
    pub fn qualified(self) -> String {
        format!("{SETTINGS_SECTION}.{}", self.as_str())
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
