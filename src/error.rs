use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::settings::SettingKey;

/// Errors raised by the AutoHotkey client.
#[derive(Error, Debug)]
pub enum Error {
    #[error("AutoHotkey runtime path is empty")]
    EmptyRuntimePath,

    #[error("no AutoHotkey document is open")]
    NoActiveDocument,

    #[error("interpreter path '{}' is not absolute", .0.display())]
    RelativePath(PathBuf),

    #[error("'{}' does not exist or is not a regular file", .0.display())]
    NotAFile(PathBuf),

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' did not finish within {timeout:?} and was killed")]
    Timeout { program: String, timeout: Duration },

    #[error("'{program}' exited with status {status:?}: {stderr}")]
    ExitStatus {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("'{0}' is not an AutoHotkey version")]
    InvalidVersion(String),

    #[error("AutoHotkey install location unavailable: {0}")]
    InstallLocation(String),

    #[error("formatting failed: {0}")]
    Format(String),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("not supported by this editor: {0}")]
    Unsupported(&'static str),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The setting a user should open to fix this error, if any.
    pub fn setting(&self) -> Option<SettingKey> {
        match self {
            Self::EmptyRuntimePath => Some(SettingKey::RuntimePath),
            Self::RelativePath(_) | Self::NotAFile(_) => Some(SettingKey::InterpreterPath),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Logs and discards recoverable errors.
pub trait ResultExt<T> {
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                warn!(error = %err, location = %caller, "operation failed");
                None
            }
        }
    }
}
