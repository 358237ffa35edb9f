//! In-memory host and process runner for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::host::{FilePickOptions, Host, Notification, PickItem, TerminalId, TextEdit};
use crate::process::{ProcessOutput, ProcessRunner, Shell};
use crate::settings::{SettingKey, Settings};
use crate::{Error, Result};

#[derive(Debug, Clone)]
enum Reply {
    Stdout(String),
    Status(i32),
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
enum Matcher {
    /// The end of the program path.
    Program(String),
    /// A fragment of the program and arguments joined by spaces.
    Line(String),
}

impl Matcher {
    fn matches(&self, program: &str, args: &[String]) -> bool {
        match self {
            Self::Program(suffix) => program.ends_with(suffix.as_str()),
            Self::Line(fragment) => {
                let line = std::iter::once(program)
                    .chain(args.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(" ");
                line.contains(fragment.as_str())
            }
        }
    }
}

/// Answers with the first matching reply; unmatched programs fail to spawn.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: Mutex<Vec<(Matcher, Reply)>>,
    calls: Mutex<Vec<Call>>,
    shell: Option<Shell>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = Some(shell);
        self
    }

    pub fn respond_to(&self, program_suffix: &str, stdout: &str) {
        self.push(Matcher::Program(program_suffix.to_string()), Reply::Stdout(stdout.to_string()));
    }

    pub fn fail_with_status(&self, program_suffix: &str, status: i32) {
        self.push(Matcher::Program(program_suffix.to_string()), Reply::Status(status));
    }

    pub fn time_out(&self, program_suffix: &str) {
        self.push(Matcher::Program(program_suffix.to_string()), Reply::Timeout);
    }

    pub fn respond_to_line(&self, fragment: &str, stdout: &str) {
        self.push(Matcher::Line(fragment.to_string()), Reply::Stdout(stdout.to_string()));
    }

    pub fn fail_on_line(&self, fragment: &str, status: i32) {
        self.push(Matcher::Line(fragment.to_string()), Reply::Status(status));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose program ends with `program_suffix`.
    pub fn calls_to(&self, program_suffix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.program.ends_with(program_suffix))
            .count()
    }

    fn push(&self, matcher: Matcher, reply: Reply) {
        self.replies.lock().unwrap().push((matcher, reply));
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput> {
        self.calls.lock().unwrap().push(Call {
            program: program.to_string(),
            args: args.to_vec(),
            timeout,
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .iter()
            .find(|(matcher, _)| matcher.matches(program, args))
            .map(|(_, reply)| reply.clone());
        match reply {
            Some(Reply::Stdout(stdout)) => Ok(ProcessOutput {
                status: Some(0),
                stdout,
                stderr: String::new(),
            }),
            Some(Reply::Status(status)) => Ok(ProcessOutput {
                status: Some(status),
                stdout: String::new(),
                stderr: "failed".to_string(),
            }),
            Some(Reply::Timeout) => Err(Error::Timeout {
                program: program.to_string(),
                timeout: timeout.unwrap_or_default(),
            }),
            None => Err(Error::Spawn {
                program: program.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }

    fn shell(&self) -> Shell {
        self.shell.unwrap_or_else(Shell::native)
    }
}

/// Records every host interaction and replays scripted picker answers.
#[derive(Default)]
pub struct FakeHost {
    pub settings: RefCell<Settings>,
    pub notifications: RefCell<Vec<Notification>>,
    pub commands: RefCell<Vec<String>>,
    pub formatters: RefCell<Vec<String>>,
    pub active_document: RefCell<Option<PathBuf>>,
    pub saved: RefCell<Vec<PathBuf>>,
    next_terminal: Cell<u64>,
    pub terminals: RefCell<Vec<TerminalId>>,
    pub sent: RefCell<Vec<(TerminalId, String)>>,
    pub pick_answers: RefCell<VecDeque<Option<usize>>>,
    pub picks: RefCell<Vec<(String, Vec<PickItem>)>>,
    pub file_answers: RefCell<VecDeque<Option<PathBuf>>>,
    pub file_picks: RefCell<Vec<FilePickOptions>>,
    pub format_result: RefCell<Option<std::result::Result<Vec<TextEdit>, String>>>,
    pub applied: RefCell<Vec<(PathBuf, Vec<TextEdit>)>>,
    pub installed: RefCell<Vec<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        let host = Self::new();
        *host.settings.borrow_mut() = settings;
        host
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.borrow().clone()
    }

    pub fn answer_pick(&self, answer: Option<usize>) {
        self.pick_answers.borrow_mut().push_back(answer);
    }

    pub fn answer_file(&self, answer: Option<PathBuf>) {
        self.file_answers.borrow_mut().push_back(answer);
    }
}

impl Host for FakeHost {
    fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    fn update_setting(&self, key: SettingKey, value: &str) -> Result<()> {
        self.settings.borrow_mut().set(key, value);
        Ok(())
    }

    fn notify(&self, notification: Notification) {
        self.notifications.borrow_mut().push(notification);
    }

    fn register_command(&self, id: &str) {
        self.commands.borrow_mut().push(id.to_string());
    }

    fn register_formatter(&self, language: &str) {
        self.formatters.borrow_mut().push(language.to_string());
    }

    fn active_document(&self) -> Option<PathBuf> {
        self.active_document.borrow().clone()
    }

    fn save_document(&self, document: &Path) -> Result<()> {
        self.saved.borrow_mut().push(document.to_path_buf());
        Ok(())
    }

    fn create_terminal(&self, _name: &str) -> Result<TerminalId> {
        let id = TerminalId(self.next_terminal.get() + 1);
        self.next_terminal.set(id.0);
        self.terminals.borrow_mut().push(id);
        Ok(id)
    }

    fn send_to_terminal(&self, terminal: TerminalId, line: &str) -> Result<()> {
        self.sent.borrow_mut().push((terminal, line.to_string()));
        Ok(())
    }

    fn pick(&self, title: &str, items: &[PickItem]) -> Option<usize> {
        self.picks.borrow_mut().push((title.to_string(), items.to_vec()));
        self.pick_answers.borrow_mut().pop_front().flatten()
    }

    fn pick_file(&self, options: &FilePickOptions) -> Option<PathBuf> {
        self.file_picks.borrow_mut().push(options.clone());
        self.file_answers.borrow_mut().pop_front().flatten()
    }

    fn format_document(&self, _document: &Path) -> Result<Vec<TextEdit>> {
        match self.format_result.borrow().clone() {
            Some(Ok(edits)) => Ok(edits),
            Some(Err(message)) => Err(Error::Format(message)),
            None => Ok(Vec::new()),
        }
    }

    fn apply_edits(&self, document: &Path, edits: &[TextEdit]) -> Result<()> {
        self.applied
            .borrow_mut()
            .push((document.to_path_buf(), edits.to_vec()));
        Ok(())
    }

    fn is_extension_installed(&self, id: &str) -> bool {
        self.installed.borrow().iter().any(|installed| installed == id)
    }
}
