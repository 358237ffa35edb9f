//! How the AutoHotkey language server is launched and configured.

use serde_json::{json, Map, Value};

use crate::interpreter::InterpreterInformation;
use crate::settings::{Settings, SETTINGS_SECTION};

pub const LANGUAGE_SERVER_ID: &str = "autohotkey-lsp";
/// Binary looked up on `PATH` when none is configured.
pub const SERVER_BINARY: &str = "autohotkey-lsp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub command: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

/// Picks the configured binary, else the one found on `PATH`.
pub fn server_command(
    configured_path: Option<String>,
    configured_args: Option<Vec<String>>,
    found_on_path: Option<String>,
) -> Result<ServerCommand, String> {
    let command = configured_path
        .filter(|path| !path.trim().is_empty())
        .or(found_on_path)
        .ok_or_else(|| {
            format!(
                "{SERVER_BINARY} not found in PATH. Install the AutoHotkey language server \
                 or set lsp.{LANGUAGE_SERVER_ID}.binary.path in your settings."
            )
        })?;
    Ok(ServerCommand {
        command,
        args: configured_args.unwrap_or_else(|| vec!["--stdio".to_string()]),
        env: Vec::new(),
    })
}

/// Settings handed to the server, with the selected interpreter taking precedence.
pub fn server_settings(settings: &Settings, current: Option<&InterpreterInformation>) -> Value {
    let interpreter_path = current
        .filter(|current| !current.path.is_empty())
        .map(|current| current.path.as_str())
        .unwrap_or(&settings.interpreter_path);
    let mut root = Map::new();
    root.insert(
        SETTINGS_SECTION.to_string(),
        json!({
            "interpreterPath": interpreter_path,
            "runtimePath": settings.runtime_path,
        }),
    );
    Value::Object(root)
}
