//! Interpreter discovery, status resolution and the service that owns the
//! current interpreter.

mod discovery;
mod install;
mod probe;
mod version;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ResultExt;
use crate::files::{FileSystem, LocalFs};
use crate::host::{Host, Notification};
use crate::settings::{SettingKey, Settings};
use crate::{Error, Result};

pub use discovery::{is_interpreter_name, scan};
pub use install::{parse_reg_output, query_install_dir};
pub use probe::{VersionProbe, PROBE_TIMEOUT, UNKNOWN_VERSION};
pub use version::{AutohotkeyVersion, TestVersion};

/// One discovered or configured interpreter executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterInformation {
    pub path: String,
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
}

impl InterpreterInformation {
    pub fn new(path: impl Into<String>, version: Option<String>) -> Self {
        let path = path.into();
        let architecture = architecture_from_path(&path).map(str::to_string);
        Self {
            path,
            version,
            architecture,
        }
    }

    /// An interpreter is usable once its version could be probed.
    pub fn is_valid(&self) -> bool {
        self.version.is_some()
    }

    pub fn parsed_version(&self) -> Option<AutohotkeyVersion> {
        self.version.as_deref()?.parse().ok()
    }
}

/// Infers the target architecture from the conventional executable names.
fn architecture_from_path(path: &str) -> Option<&'static str> {
    let name = path.rsplit(['/', '\\']).next()?.to_ascii_lowercase();
    let stem = name.strip_suffix(".exe")?;
    let flavor = stem.strip_prefix("autohotkey")?;
    match flavor {
        "u64" | "64" => Some("x64"),
        "u32" | "a32" | "32" => Some("x86"),
        _ => None,
    }
}

/// Checks that `path` is absolute and names an existing regular file,
/// following symlinks.
pub fn validate_interpreter_path(files: &dyn FileSystem, path: &str) -> Result<PathBuf> {
    let candidate = PathBuf::from(path);
    if path.trim().is_empty() || !is_absolute(path) {
        return Err(Error::RelativePath(candidate));
    }
    if files.is_file(&candidate) {
        Ok(candidate)
    } else {
        Err(Error::NotAFile(candidate))
    }
}

/// Absolute on this platform, or a Windows drive/UNC path on any platform.
fn is_absolute(path: &str) -> bool {
    if Path::new(path).is_absolute() || path.starts_with(r"\\") {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes[2], b'\\' | b'/')
}

/// Owns the current interpreter and knows how to find and probe others.
pub struct InterpreterService {
    probe: VersionProbe,
    files: Arc<dyn FileSystem>,
    install_root: OnceLock<Option<PathBuf>>,
    current: Mutex<Option<InterpreterInformation>>,
    discovered: Mutex<Option<Vec<InterpreterInformation>>>,
}

impl InterpreterService {
    pub fn new(probe: VersionProbe) -> Self {
        Self {
            probe,
            files: Arc::new(LocalFs),
            install_root: OnceLock::new(),
            current: Mutex::new(None),
            discovered: Mutex::new(None),
        }
    }

    /// Answers existence checks and directory listings through `files`.
    pub fn with_file_system(mut self, files: Arc<dyn FileSystem>) -> Self {
        self.files = files;
        self
    }

    /// Uses a fixed install root instead of querying the registry.
    pub fn with_install_root(self, root: Option<PathBuf>) -> Self {
        let _ = self.install_root.set(root);
        self
    }

    /// The install directory, looked up once and cached.
    pub fn install_root(&self) -> Option<&Path> {
        self.install_root
            .get_or_init(|| query_install_dir(self.probe.runner().as_ref()).warn_on_err())
            .as_deref()
    }

    /// Resolves the configured interpreter. `version` is `None` when the
    /// path is invalid or the probe fails.
    pub fn status(&self, settings: &Settings) -> InterpreterInformation {
        let path = settings.interpreter_path.clone();
        let version = match validate_interpreter_path(self.files.as_ref(), &path) {
            Ok(executable) => self.probe.try_version(&executable),
            Err(err) => {
                debug!(error = %err, "configured interpreter is invalid");
                None
            }
        };
        InterpreterInformation::new(path, version)
    }

    /// Re-resolves the configured interpreter and stores it as current.
    pub fn refresh(&self, settings: &Settings) -> InterpreterInformation {
        let status = self.status(settings);
        *self.lock_current() = Some(status.clone());
        status
    }

    pub fn current(&self) -> Option<InterpreterInformation> {
        self.lock_current().clone()
    }

    /// The current interpreter, resolving it first if it never was.
    pub fn current_or_refresh(&self, settings: &Settings) -> InterpreterInformation {
        match self.current() {
            Some(current) if current.path == settings.interpreter_path => current,
            _ => self.refresh(settings),
        }
    }

    /// Scans the install root for interpreters and remembers the result.
    pub fn discover(&self) -> Vec<InterpreterInformation> {
        let found = match self.install_root() {
            Some(root) => scan(self.files.as_ref(), root, &self.probe),
            None => Vec::new(),
        };
        *self.lock_discovered() = Some(found.clone());
        found
    }

    /// The current interpreter followed by every discovered one with another path.
    pub fn candidates(&self, settings: &Settings) -> Vec<InterpreterInformation> {
        let current = self.current_or_refresh(settings);
        merge_candidates(current, self.discover())
    }

    /// Like [`InterpreterService::candidates`] but reuses the last discovery,
    /// scanning only when none ran yet.
    pub fn known_candidates(&self, settings: &Settings) -> Vec<InterpreterInformation> {
        let current = self.current_or_refresh(settings);
        let known = self.lock_discovered().clone();
        let discovered = match known {
            Some(found) => found,
            None => self.discover(),
        };
        merge_candidates(current, discovered)
    }

    /// Applies a user selection: persists the path, re-probes and reports.
    pub fn select(&self, host: &dyn Host, selected: InterpreterInformation) {
        info!(path = %selected.path, "interpreter selected");
        if let Err(err) = host.update_setting(SettingKey::InterpreterPath, &selected.path) {
            host.notify(Notification::error(format!(
                "Could not save the interpreter path: {err}"
            )));
            return;
        }

        let status = self.refresh(&host.settings());
        match &status.version {
            Some(version) => host.notify(Notification::info(format!(
                "AutoHotkey interpreter set to {} ({version})",
                status.path
            ))),
            None => host.notify(
                Notification::error(format!(
                    "'{}' is not a usable AutoHotkey interpreter",
                    status.path
                ))
                .with_setting(SettingKey::InterpreterPath),
            ),
        }
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<InterpreterInformation>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_discovered(&self) -> std::sync::MutexGuard<'_, Option<Vec<InterpreterInformation>>> {
        self.discovered.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn merge_candidates(
    current: InterpreterInformation,
    discovered: Vec<InterpreterInformation>,
) -> Vec<InterpreterInformation> {
    let mut candidates = vec![current];
    for found in discovered {
        if !candidates.iter().any(|c| same_path(&c.path, &found.path)) {
            candidates.push(found);
        }
    }
    candidates
}

fn same_path(a: &str, b: &str) -> bool {
    a.replace('/', "\\").eq_ignore_ascii_case(&b.replace('/', "\\"))
}
