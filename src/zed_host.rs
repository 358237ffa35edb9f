//! [`Host`] for Zed slash commands.
//!
//! Zed gives extensions no terminals, pickers or settings writes, so this
//! host maps them onto a slash command invocation: the command argument is
//! the picker/file answer, the terminal runs lines through the platform
//! shell, and everything shown to the user lands in the command output.

use std::cell::{Cell, RefCell};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tracing::debug;
use zed_extension_api as zed;

use crate::host::{FilePickOptions, Host, Level, Notification, PickItem, TerminalId, TextEdit};
use crate::process::{ProcessOutput, ProcessRunner, Shell};
use crate::settings::{SettingKey, Settings};
use crate::{Error, Result};

/// Runs processes through Zed's `process:exec` capability.
///
/// Zed cannot kill a command it started, so timed runs go through a
/// [`Shell::bounded`] wrapper on the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZedRunner;

impl ProcessRunner for ZedRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput> {
        let (command, command_args) = match timeout {
            Some(timeout) => self.shell().bounded(program, args, timeout),
            None => (program.to_string(), args.to_vec()),
        };
        debug!(program, ?args, ?timeout, %command, "running process through zed");
        let output = zed::process::Command::new(command)
            .args(command_args)
            .output()
            .map_err(|message| Error::Spawn {
                program: program.to_string(),
                source: std::io::Error::other(message),
            })?;
        let output = ProcessOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        match timeout {
            Some(timeout) => output.or_timeout(program, timeout),
            None => Ok(output),
        }
    }

    fn shell(&self) -> Shell {
        match zed::current_platform() {
            (zed::Os::Windows, _) => Shell::Cmd,
            _ => Shell::Sh,
        }
    }
}

/// Settings as Zed configured them plus the interpreter picked in this session.
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub configured: Settings,
    pub selected_interpreter: Option<String>,
}

impl SessionSettings {
    pub fn effective(&self) -> Settings {
        let mut settings = self.configured.clone();
        if let Some(selected) = &self.selected_interpreter {
            settings.interpreter_path = selected.clone();
        }
        settings
    }
}

pub struct SlashHost<'a> {
    session: &'a Mutex<SessionSettings>,
    runner: &'a dyn ProcessRunner,
    document: Option<PathBuf>,
    answer: Option<String>,
    next_terminal: Cell<u64>,
    output: RefCell<String>,
}

impl<'a> SlashHost<'a> {
    pub fn new(session: &'a Mutex<SessionSettings>, runner: &'a dyn ProcessRunner) -> Self {
        Self {
            session,
            runner,
            document: None,
            answer: None,
            next_terminal: Cell::new(0),
            output: RefCell::new(String::new()),
        }
    }

    pub fn with_document(mut self, document: PathBuf) -> Self {
        self.document = Some(document);
        self
    }

    /// What the user typed after the command, used to answer pickers.
    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        let answer = answer.into();
        self.answer = (!answer.trim().is_empty()).then(|| answer.trim().to_string());
        self
    }

    pub fn write_line(&self, line: &str) {
        let mut output = self.output.borrow_mut();
        output.push_str(line);
        output.push('\n');
    }

    pub fn into_output(self) -> String {
        self.output.into_inner()
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, SessionSettings> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Host for SlashHost<'_> {
    fn settings(&self) -> Settings {
        self.lock_session().effective()
    }

    fn update_setting(&self, key: SettingKey, value: &str) -> Result<()> {
        match key {
            SettingKey::InterpreterPath => {
                self.lock_session().selected_interpreter = Some(value.to_string());
                Ok(())
            }
            SettingKey::RuntimePath => Err(Error::Unsupported("changing runtimePath from Zed")),
        }
    }

    fn notify(&self, notification: Notification) {
        let prefix = match notification.level {
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        let mut line = format!("{prefix}: {}", notification.message);
        if let Some(setting) = notification.setting {
            let _ = write!(
                line,
                " (configure `lsp.{}.settings.{}`)",
                crate::language_server::LANGUAGE_SERVER_ID,
                setting.qualified()
            );
        }
        self.write_line(&line);
    }

    fn register_command(&self, id: &str) {
        debug!(command = id, "command available as slash command");
    }

    fn register_formatter(&self, language: &str) {
        debug!(language, "formatting handled by the language server");
    }

    fn active_document(&self) -> Option<PathBuf> {
        self.document.clone()
    }

    fn save_document(&self, _document: &Path) -> Result<()> {
        Ok(())
    }

    fn create_terminal(&self, name: &str) -> Result<TerminalId> {
        let id = TerminalId(self.next_terminal.get() + 1);
        self.next_terminal.set(id.0);
        debug!(name, ?id, "opening output section");
        Ok(id)
    }

    fn send_to_terminal(&self, _terminal: TerminalId, line: &str) -> Result<()> {
        self.write_line(&format!("$ {line}"));
        let (program, args) = self.runner.shell().command(line);
        let output = self.runner.run(&program, &args, None)?;
        for stream in [&output.stdout, &output.stderr] {
            let text = stream.trim_end();
            if !text.is_empty() {
                self.write_line(text);
            }
        }
        if !output.success() {
            self.write_line(&format!("exit status: {:?}", output.status));
        }
        Ok(())
    }

    fn pick(&self, title: &str, items: &[PickItem]) -> Option<usize> {
        let answer = self.answer.as_deref()?;
        debug!(title, answer, "answering picker from command argument");
        if let Ok(index) = answer.parse::<usize>() {
            return (index < items.len()).then_some(index);
        }
        match items.iter().position(|item| item.label == answer) {
            Some(index) => Some(index),
            // Any other text is treated as a custom path for the last (browse) row.
            None => items.len().checked_sub(1),
        }
    }

    fn pick_file(&self, _options: &FilePickOptions) -> Option<PathBuf> {
        let answer = self.answer.as_deref()?;
        answer.parse::<usize>().is_err().then(|| PathBuf::from(answer))
    }

    fn format_document(&self, _document: &Path) -> Result<Vec<TextEdit>> {
        Err(Error::Unsupported("formatting is provided by the language server"))
    }

    fn apply_edits(&self, _document: &Path, _edits: &[TextEdit]) -> Result<()> {
        Err(Error::Unsupported("applying edits from an extension"))
    }

    fn is_extension_installed(&self, _id: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;

    fn items() -> Vec<PickItem> {
        vec![
            PickItem::new("C:\\AHK\\AutoHotkey.exe"),
            PickItem::new("C:\\AHK\\AutoHotkeyU64.exe"),
            PickItem::new(crate::commands::BROWSE_LABEL),
        ]
    }

    #[test]
    fn picker_answers_by_index_label_or_custom_path() {
        let session = Mutex::new(SessionSettings::default());
        let runner = ScriptedRunner::new();

        let host = SlashHost::new(&session, &runner).with_answer("1");
        assert_eq!(host.pick("t", &items()), Some(1));
        assert_eq!(host.pick_file(&FilePickOptions::default()), None);

        let host = SlashHost::new(&session, &runner).with_answer(" C:\\AHK\\AutoHotkey.exe ");
        assert_eq!(host.pick("t", &items()), Some(0));

        let host = SlashHost::new(&session, &runner).with_answer("D:\\Portable\\AutoHotkey.exe");
        assert_eq!(host.pick("t", &items()), Some(2));
        assert_eq!(
            host.pick_file(&FilePickOptions::default()),
            Some(PathBuf::from("D:\\Portable\\AutoHotkey.exe"))
        );

        let host = SlashHost::new(&session, &runner).with_answer("9");
        assert_eq!(host.pick("t", &items()), None);
        let host = SlashHost::new(&session, &runner).with_answer("  ");
        assert_eq!(host.pick("t", &items()), None);
    }

    #[test]
    fn selected_interpreter_overrides_configured_setting() {
        let session = Mutex::new(SessionSettings {
            configured: Settings {
                interpreter_path: "C:\\Configured.exe".to_string(),
                runtime_path: "C:\\Run.exe".to_string(),
            },
            selected_interpreter: None,
        });
        let runner = ScriptedRunner::new();
        let host = SlashHost::new(&session, &runner);

        host.update_setting(SettingKey::InterpreterPath, "C:\\Picked.exe").unwrap();
        assert_eq!(host.settings().interpreter_path, "C:\\Picked.exe");
        assert_eq!(host.settings().runtime_path, "C:\\Run.exe");
        assert!(host.update_setting(SettingKey::RuntimePath, "x").is_err());
    }

    #[test]
    fn terminal_output_and_notifications_are_collected() {
        let session = Mutex::new(SessionSettings::default());
        let runner = ScriptedRunner::new();
        let (shell, _) = runner.shell().command("");
        runner.respond_to(&shell, "Hello from AutoHotkey\n");
        let host = SlashHost::new(&session, &runner);

        let terminal = host.create_terminal("AutoHotkey").unwrap();
        host.send_to_terminal(terminal, "ahk.exe /ErrorStdOut a.ahk").unwrap();
        host.notify(Notification::error("runtime missing").with_setting(SettingKey::RuntimePath));

        let output = host.into_output();
        assert!(output.contains("$ ahk.exe /ErrorStdOut a.ahk\n"));
        assert!(output.contains("Hello from AutoHotkey\n"));
        assert!(output.contains(
            "error: runtime missing (configure `lsp.autohotkey-lsp.settings.AutoHotkey.runtimePath`)"
        ));
    }
}
