//! Editor commands and the registry that exposes them to the host.

mod format;
mod run_file;
mod select_interpreter;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::host::Host;
use crate::{Error, Result};

pub use format::FormatCommand;
pub use run_file::{RunFileCommand, TERMINAL_NAME};
pub use select_interpreter::{SelectInterpreterCommand, SelectionHandler, BROWSE_LABEL};

pub const RUN_FILE: &str = "autohotkey.runFile";
pub const FORMAT_DOCUMENT: &str = "autohotkey.formatDocument";
pub const SELECT_INTERPRETER: &str = "autohotkey.selectInterpreter";

/// Language id the formatter is registered for.
pub const LANGUAGE_ID: &str = "ahk";

/// Arguments a host may pass along with a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    /// Document the command applies to; defaults to the active document.
    pub document: Option<PathBuf>,
}

impl CommandArgs {
    pub fn for_document(document: impl Into<PathBuf>) -> Self {
        Self {
            document: Some(document.into()),
        }
    }

    /// The explicit document, else the host's active one.
    pub fn resolve_document(&self, host: &dyn Host) -> Result<PathBuf> {
        self.document
            .clone()
            .or_else(|| host.active_document())
            .ok_or(Error::NoActiveDocument)
    }
}

pub trait Command: Send + Sync {
    fn id(&self) -> &'static str;

    /// Called once when the command is registered with the host.
    fn on_register(&self, _host: &dyn Host) {}

    fn execute(&self, host: &dyn Host, args: &CommandArgs) -> Result<()>;
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, command: Arc<dyn Command>) {
        self.commands.insert(command.id(), command);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Command>> {
        self.commands.get(id)
    }

    /// Announces every command to the host.
    pub fn register_all(&self, host: &dyn Host) {
        for (id, command) in &self.commands {
            debug!(command = id, "registering command");
            host.register_command(id);
            command.on_register(host);
        }
    }

    pub fn execute(&self, host: &dyn Host, id: &str, args: &CommandArgs) -> Result<()> {
        let command = self
            .get(id)
            .ok_or_else(|| Error::UnknownCommand(id.to_string()))?;
        debug!(command = id, ?args, "executing command");
        command.execute(host, args)
    }
}
