//! Fills in the interpreter of AutoHotkey debug configurations.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::host::{Host, Notification};
use crate::interpreter::InterpreterService;
use crate::settings::SettingKey;

/// Debug adapter extension the substitution targets.
pub const DEBUG_ADAPTER_EXTENSION: &str = "zero-plusplus.vscode-autohotkey-debug";
/// Field holding the interpreter in a debug configuration.
pub const EXECUTABLE_FIELD: &str = "AhkExecutable";
/// Tells the debug adapter no valid interpreter exists.
pub const INVALID_EXECUTABLE: &str = "-1";

pub type DebugConfiguration = Map<String, Value>;

pub struct DebugConfigSubstituter {
    service: Arc<InterpreterService>,
}

impl DebugConfigSubstituter {
    pub fn new(service: Arc<InterpreterService>) -> Self {
        Self { service }
    }

    pub fn resolve(&self, host: &dyn Host, mut config: DebugConfiguration) -> DebugConfiguration {
        if !host.is_extension_installed(DEBUG_ADAPTER_EXTENSION) {
            host.notify(Notification::info(format!(
                "Install {DEBUG_ADAPTER_EXTENSION} to debug AutoHotkey scripts."
            )));
            return config;
        }
        if config.get(EXECUTABLE_FIELD).is_some_and(|value| !value.is_null()) {
            debug!("debug configuration already names an interpreter");
            return config;
        }

        let interpreter = self.service.current_or_refresh(&host.settings());
        let executable = if interpreter.is_valid() {
            interpreter.path
        } else {
            warn!(path = %interpreter.path, "no valid interpreter for debugging");
            host.notify(
                Notification::error(
                    "No valid AutoHotkey interpreter is configured; set one before debugging.",
                )
                .with_setting(SettingKey::InterpreterPath),
            );
            INVALID_EXECUTABLE.to_string()
        };
        config.insert(EXECUTABLE_FIELD.to_string(), Value::String(executable));
        config
    }

    /// Same as [`DebugConfigSubstituter::resolve`] for a JSON document.
    pub fn resolve_json(&self, host: &dyn Host, config: Value) -> crate::Result<Value> {
        let config: DebugConfiguration = serde_json::from_value(config)?;
        Ok(Value::Object(self.resolve(host, config)))
    }
}
