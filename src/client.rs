use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::commands::{
    CommandArgs, CommandRegistry, FormatCommand, RunFileCommand, SelectInterpreterCommand,
};
use crate::debug::{DebugConfigSubstituter, DebugConfiguration};
use crate::files::FileSystem;
use crate::host::{Host, TerminalId};
use crate::interpreter::{InterpreterInformation, InterpreterService, VersionProbe};
use crate::process::ProcessRunner;
use crate::Result;

/// Owns the interpreter service and every handler, and receives host events.
pub struct Client {
    service: Arc<InterpreterService>,
    commands: CommandRegistry,
    run_file: Arc<RunFileCommand>,
    debug: DebugConfigSubstituter,
}

impl Client {
    pub fn new(service: Arc<InterpreterService>) -> Self {
        let run_file = Arc::new(RunFileCommand::new());

        let selection_service = service.clone();
        let select = SelectInterpreterCommand::new(
            service.clone(),
            Box::new(move |host: &dyn Host, selected: InterpreterInformation| {
                selection_service.select(host, selected)
            }),
        );

        let mut commands = CommandRegistry::new();
        commands.add(run_file.clone());
        commands.add(Arc::new(FormatCommand::new()));
        commands.add(Arc::new(select));

        Self {
            debug: DebugConfigSubstituter::new(service.clone()),
            service,
            commands,
            run_file,
        }
    }

    /// A client probing with `runner`, asking `files` about interpreter
    /// paths and writing its helper script into `work_dir`.
    pub fn with_runner(
        runner: Arc<dyn ProcessRunner>,
        files: Arc<dyn FileSystem>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        let probe = VersionProbe::new(runner, work_dir);
        Self::new(Arc::new(InterpreterService::new(probe).with_file_system(files)))
    }

    pub fn interpreters(&self) -> &Arc<InterpreterService> {
        &self.service
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Registers commands and resolves the configured interpreter.
    pub fn activate(&self, host: &dyn Host) {
        self.commands.register_all(host);
        let current = self.service.refresh(&host.settings());
        info!(path = %current.path, version = ?current.version, "AutoHotkey client activated");
    }

    pub fn execute(&self, host: &dyn Host, command: &str, args: &CommandArgs) -> Result<()> {
        self.commands.execute(host, command, args)
    }

    pub fn on_terminal_closed(&self, terminal: TerminalId) {
        self.run_file.terminal_closed(terminal);
    }

    pub fn on_configuration_changed(&self, host: &dyn Host) {
        self.service.refresh(&host.settings());
    }

    pub fn resolve_debug_configuration(
        &self,
        host: &dyn Host,
        config: DebugConfiguration,
    ) -> DebugConfiguration {
        self.debug.resolve(host, config)
    }

    pub fn resolve_debug_json(&self, host: &dyn Host, config: Value) -> Result<Value> {
        self.debug.resolve_json(host, config)
    }
}
