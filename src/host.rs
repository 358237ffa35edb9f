//! The editor capabilities the client relies on.
//!
//! Handlers never talk to an editor directly. Each editor integration
//! implements [`Host`]; the Zed extension does so in `zed_host`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::settings::{SettingKey, Settings};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// A message for the user, optionally offering to open a setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    pub setting: Option<SettingKey>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            setting: None,
        }
    }

    pub fn with_setting(mut self, setting: SettingKey) -> Self {
        self.setting = Some(setting);
        self
    }

    /// An error notification for `err`, linking the setting that fixes it.
    pub fn from_error(err: &crate::Error) -> Self {
        let notification = Self::error(err.to_string());
        match err.setting() {
            Some(setting) => notification.with_setting(setting),
            None => notification,
        }
    }
}

/// Identifies a terminal created through [`Host::create_terminal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TerminalId(pub u64);

/// One row of a host picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    pub label: String,
    pub description: Option<String>,
    pub detail: Option<String>,
}

impl PickItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            detail: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePickOptions {
    pub title: String,
    /// Filter name and the extensions it allows, without dots.
    pub filters: Vec<(String, Vec<String>)>,
    pub default_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// Replace `range` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

pub trait Host {
    fn settings(&self) -> Settings;
    fn update_setting(&self, key: SettingKey, value: &str) -> Result<()>;

    fn notify(&self, notification: Notification);

    fn register_command(&self, id: &str);
    /// Routes format requests (including format-on-save) for `language` to the language server.
    fn register_formatter(&self, language: &str);

    /// Path of the document in the focused editor.
    fn active_document(&self) -> Option<PathBuf>;
    fn save_document(&self, document: &Path) -> Result<()>;

    fn create_terminal(&self, name: &str) -> Result<TerminalId>;
    /// Reveals the terminal and sends `line` followed by a newline.
    fn send_to_terminal(&self, terminal: TerminalId, line: &str) -> Result<()>;

    /// Shows a picker and returns the chosen index, `None` when cancelled.
    fn pick(&self, title: &str, items: &[PickItem]) -> Option<usize>;
    fn pick_file(&self, options: &FilePickOptions) -> Option<PathBuf>;

    /// Asks the formatting provider for edits to `document`.
    fn format_document(&self, document: &Path) -> Result<Vec<TextEdit>>;
    /// Applies all edits as one transaction.
    fn apply_edits(&self, document: &Path, edits: &[TextEdit]) -> Result<()>;

    fn is_extension_installed(&self, id: &str) -> bool;
}
