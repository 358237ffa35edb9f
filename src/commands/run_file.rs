use std::sync::Mutex;

use tracing::{debug, info};

use super::{Command, CommandArgs, RUN_FILE};
use crate::host::{Host, Notification, TerminalId};
use crate::{shell, Error, Result};

pub const TERMINAL_NAME: &str = "AutoHotkey";

/// Runs the document with the configured runtime in a single reused terminal.
#[derive(Default)]
pub struct RunFileCommand {
    terminal: Mutex<Option<TerminalId>>,
}

impl RunFileCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terminal(&self) -> Option<TerminalId> {
        *self.lock_terminal()
    }

    /// Forgets the owned terminal if `closed` is it.
    pub fn terminal_closed(&self, closed: TerminalId) {
        let mut terminal = self.lock_terminal();
        if *terminal == Some(closed) {
            debug!(?closed, "run terminal closed");
            *terminal = None;
        }
    }

    fn run(&self, host: &dyn Host, args: &CommandArgs) -> Result<()> {
        let runtime = host.settings().runtime_path;
        if runtime.trim().is_empty() {
            return Err(Error::EmptyRuntimePath);
        }
        let document = args.resolve_document(host)?;
        host.save_document(&document)?;

        let line = shell::run_line(&runtime, &document.to_string_lossy());
        let terminal = self.ensure_terminal(host)?;
        info!(?terminal, %line, "running script");
        host.send_to_terminal(terminal, &line)
    }

    fn ensure_terminal(&self, host: &dyn Host) -> Result<TerminalId> {
        let mut terminal = self.lock_terminal();
        if let Some(existing) = *terminal {
            return Ok(existing);
        }
        let created = host.create_terminal(TERMINAL_NAME)?;
        *terminal = Some(created);
        Ok(created)
    }

    fn lock_terminal(&self) -> std::sync::MutexGuard<'_, Option<TerminalId>> {
        self.terminal.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Command for RunFileCommand {
    fn id(&self) -> &'static str {
        RUN_FILE
    }

    fn execute(&self, host: &dyn Host, args: &CommandArgs) -> Result<()> {
        self.run(host, args).inspect_err(|err| {
            host.notify(Notification::from_error(err));
        })
    }
}
