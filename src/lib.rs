//! AutoHotkey support for Zed.
//!
//! Launches the AutoHotkey language server, discovers interpreters and
//! exposes the run-file and select-interpreter commands. The editor-facing
//! logic lives behind [`host::Host`] so it does not depend on Zed.

pub mod client;
pub mod commands;
pub mod debug;
mod error;
pub mod files;
pub mod host;
pub mod interpreter;
pub mod language_server;
pub mod logging;
pub mod process;
pub mod settings;
pub mod shell;
pub mod zed_host;

#[cfg(test)]
mod testing;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once};

use zed_extension_api::{
    self as zed, settings::LspSettings, LanguageServerId, SlashCommand,
    SlashCommandArgumentCompletion, SlashCommandOutput, SlashCommandOutputSection, Worktree,
};

pub use client::Client;
pub use error::{Error, Result, ResultExt};

use commands::{CommandArgs, RUN_FILE, SELECT_INTERPRETER};
use files::ShellFs;
use host::Host;
use language_server::{server_command, server_settings, LANGUAGE_SERVER_ID};
use settings::Settings;
use zed_host::{SessionSettings, SlashHost, ZedRunner};

struct AutoHotkeyExtension {
    client: Client,
    runner: ZedRunner,
    session: Mutex<SessionSettings>,
    activated: Once,
}

impl AutoHotkeyExtension {
    fn new() -> Self {
        logging::init();
        let work_dir = std::env::current_dir().unwrap_or_default();
        let runner = Arc::new(ZedRunner);
        Self {
            client: Client::with_runner(runner.clone(), Arc::new(ShellFs::new(runner)), work_dir),
            runner: ZedRunner,
            session: Mutex::new(SessionSettings::default()),
            activated: Once::new(),
        }
    }

    /// Reloads the user's settings for the language server from `worktree`.
    fn sync_settings(&self, worktree: &Worktree) -> Option<LspSettings> {
        let lsp_settings = LspSettings::for_worktree(LANGUAGE_SERVER_ID, worktree).warn_on_err()?;
        let configured = lsp_settings
            .settings
            .as_ref()
            .and_then(|value| Settings::from_json(value).warn_on_err())
            .unwrap_or_default();
        self.lock_session().configured = configured;
        Some(lsp_settings)
    }

    fn host(&self) -> SlashHost<'_> {
        let host = SlashHost::new(&self.session, &self.runner);
        self.activated.call_once(|| self.client.activate(&host));
        host
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, SessionSettings> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn language_server_settings(&self) -> zed::serde_json::Value {
        let host = self.host();
        self.client.on_configuration_changed(&host);
        let settings = self.lock_session().effective();
        server_settings(&settings, self.client.interpreters().current().as_ref())
    }

    fn document_path(argument: &str, worktree: Option<&Worktree>) -> PathBuf {
        let path = Path::new(argument);
        match worktree {
            Some(worktree) if path.is_relative() => Path::new(&worktree.root_path()).join(path),
            _ => path.to_path_buf(),
        }
    }

    fn run_file(&self, args: &[String], worktree: Option<&Worktree>) -> String {
        let argument = args.join(" ");
        let host = self.host();
        let host = if argument.trim().is_empty() {
            host
        } else {
            host.with_document(Self::document_path(argument.trim(), worktree))
        };
        // Failures were already reported through the host.
        let _ = self.client.execute(&host, RUN_FILE, &CommandArgs::default());
        host.into_output()
    }

    fn interpreter_status(&self) -> String {
        let host = self.host();
        let status = self.client.interpreters().refresh(&host.settings());
        let path: &str = if status.path.is_empty() { "<not configured>" } else { &status.path };
        match (&status.version, status.parsed_version()) {
            (Some(version), Some(parsed)) => {
                let line = if parsed.is_v2() { "v2" } else { "v1" };
                host.write_line(&format!("{path}: AutoHotkey {version} ({line})"));
            }
            (Some(version), None) => host.write_line(&format!("{path}: AutoHotkey {version}")),
            (None, _) => host.write_line(&format!("{path}: not a usable AutoHotkey interpreter")),
        }
        if let Some(arch) = &status.architecture {
            host.write_line(&format!("architecture: {arch}"));
        }
        host.into_output()
    }

    fn select_interpreter(&self, args: &[String]) -> String {
        let host = self.host().with_answer(args.join(" "));
        // Failures were already reported through the host.
        let _ = self
            .client
            .execute(&host, SELECT_INTERPRETER, &CommandArgs::default());
        host.into_output()
    }
}

fn slash_output(label: &str, text: String) -> SlashCommandOutput {
    let text = if text.is_empty() { "done\n".to_string() } else { text };
    SlashCommandOutput {
        sections: vec![SlashCommandOutputSection {
            range: (0..text.len()).into(),
            label: label.to_string(),
        }],
        text,
    }
}

impl zed::Extension for AutoHotkeyExtension {
    fn new() -> Self {
        Self::new()
    }

    fn language_server_command(
        &mut self,
        language_server_id: &LanguageServerId,
        worktree: &Worktree,
    ) -> zed::Result<zed::Command> {
        let binary = self
            .sync_settings(worktree)
            .and_then(|settings| settings.binary);
        let (path, arguments) = match binary {
            Some(binary) => (binary.path, binary.arguments),
            None => (None, None),
        };
        let command = server_command(
            path,
            arguments,
            worktree.which(language_server::SERVER_BINARY),
        )?;
        tracing::info!(
            server = %language_server_id.as_ref(),
            command = %command.command,
            "starting language server"
        );
        Ok(zed::Command {
            command: command.command,
            args: command.args,
            env: command.env,
        })
    }

    fn language_server_initialization_options(
        &mut self,
        _language_server_id: &LanguageServerId,
        worktree: &Worktree,
    ) -> zed::Result<Option<zed::serde_json::Value>> {
        let configured = self
            .sync_settings(worktree)
            .and_then(|settings| settings.initialization_options);
        Ok(Some(configured.unwrap_or_else(|| self.language_server_settings())))
    }

    fn language_server_workspace_configuration(
        &mut self,
        _language_server_id: &LanguageServerId,
        worktree: &Worktree,
    ) -> zed::Result<Option<zed::serde_json::Value>> {
        self.sync_settings(worktree);
        Ok(Some(self.language_server_settings()))
    }

    fn complete_slash_command_argument(
        &self,
        command: SlashCommand,
        _args: Vec<String>,
    ) -> zed::Result<Vec<SlashCommandArgumentCompletion>> {
        match command.name.as_str() {
            "ahk-select-interpreter" => {
                let host = self.host();
                let candidates = self.client.interpreters().known_candidates(&host.settings());
                Ok(candidates
                    .into_iter()
                    .filter(|candidate| !candidate.path.is_empty())
                    .map(|candidate| SlashCommandArgumentCompletion {
                        label: match &candidate.version {
                            Some(version) => format!("{} ({version})", candidate.path),
                            None => candidate.path.clone(),
                        },
                        new_text: candidate.path,
                        run_command: true,
                    })
                    .collect())
            }
            _ => Ok(Vec::new()),
        }
    }

    fn run_slash_command(
        &self,
        command: SlashCommand,
        args: Vec<String>,
        worktree: Option<&Worktree>,
    ) -> zed::Result<SlashCommandOutput> {
        if let Some(worktree) = worktree {
            self.sync_settings(worktree);
        }
        match command.name.as_str() {
            "ahk-run" => Ok(slash_output("AutoHotkey run", self.run_file(&args, worktree))),
            "ahk-interpreter" => Ok(slash_output(
                "AutoHotkey interpreter",
                self.interpreter_status(),
            )),
            "ahk-select-interpreter" => Ok(slash_output(
                "AutoHotkey interpreter",
                self.select_interpreter(&args),
            )),
            name => Err(Error::UnknownCommand(name.to_string()).to_string()),
        }
    }
}

zed::register_extension!(AutoHotkeyExtension);
