//! Recursive scan of an install directory for AutoHotkey executables.

use std::path::Path;

use tracing::debug;

use super::probe::{VersionProbe, UNKNOWN_VERSION};
use super::InterpreterInformation;
use crate::files::{file_name, FileSystem};

const EXECUTABLE_PREFIX: &str = "autohotkey";
const EXECUTABLE_EXTENSION: &str = "exe";

/// Whether `file_name` looks like an AutoHotkey interpreter.
pub fn is_interpreter_name(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    let Some((stem, extension)) = lower.rsplit_once('.') else {
        return false;
    };
    extension == EXECUTABLE_EXTENSION && stem.starts_with(EXECUTABLE_PREFIX)
}

/// Scans `root` and probes every interpreter found below it.
///
/// Every call builds a fresh list. Unreadable directories are skipped and a
/// missing root yields an empty list. Results are sorted by path.
pub fn scan(
    files: &dyn FileSystem,
    root: &Path,
    probe: &VersionProbe,
) -> Vec<InterpreterInformation> {
    if !files.is_dir(root) {
        debug!(root = %root.display(), "install root is not a directory");
        return Vec::new();
    }

    let mut found: Vec<_> = files
        .files_below(root)
        .into_iter()
        .filter(|path| file_name(path).is_some_and(|name| is_interpreter_name(&name)))
        .map(|path| {
            let version = probe
                .try_version(&path)
                .unwrap_or_else(|| UNKNOWN_VERSION.to_string());
            InterpreterInformation::new(path.to_string_lossy().into_owned(), Some(version))
        })
        .collect();
    found.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(root = %root.display(), count = found.len(), "interpreter scan finished");
    found
}
