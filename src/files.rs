//! Filesystem queries about interpreter locations.
//!
//! Zed runs extensions in a sandbox that only sees the extension's own work
//! directory, so [`ShellFs`] answers the same questions through the host's
//! shell. [`LocalFs`] uses `std::fs` directly.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::process::{ProcessOutput, ProcessRunner, Shell};
use crate::shell::path_guard;

pub trait FileSystem: Send + Sync {
    /// Whether `path` names an existing regular file, following symlinks.
    fn is_file(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Every regular file below `root`, at any depth. Unreadable
    /// directories are skipped.
    fn files_below(&self, root: &Path) -> Vec<PathBuf>;
}

/// The last component of `path`, splitting on both `/` and `\`.
pub fn file_name(path: &Path) -> Option<String> {
    let path = path.to_string_lossy();
    path.rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn is_file(&self, path: &Path) -> bool {
        fs::metadata(path).is_ok_and(|metadata| metadata.is_file())
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn files_below(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        walk(root, &mut files);
        files
    }
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "skipping unreadable directory");
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            walk(&entry.path(), files);
        } else {
            files.push(entry.path());
        }
    }
}

/// Answers filesystem queries by running shell commands through a runner.
pub struct ShellFs {
    runner: Arc<dyn ProcessRunner>,
}

impl ShellFs {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    fn run(&self, line: &str) -> Option<ProcessOutput> {
        let (program, args) = self.runner.shell().command(line);
        match self.runner.run(&program, &args, None) {
            Ok(output) => Some(output),
            Err(err) => {
                warn!(line, error = %err, "filesystem query failed");
                None
            }
        }
    }

    fn succeeds(&self, line: &str) -> bool {
        self.run(line).is_some_and(|output| output.success())
    }
}

impl FileSystem for ShellFs {
    fn is_file(&self, path: &Path) -> bool {
        let line = match self.runner.shell() {
            // A trailing `\*` only matches directories.
            Shell::Cmd => format!(
                "if exist {} (exit 1) else if exist {} (exit 0) else (exit 1)",
                cmd_quote(&path.join("*")),
                cmd_quote(path)
            ),
            Shell::Sh => format!("test -f {}", sh_quote(path)),
        };
        self.succeeds(&line)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let line = match self.runner.shell() {
            Shell::Cmd => format!(
                "if exist {} (exit 0) else (exit 1)",
                cmd_quote(&path.join("*"))
            ),
            Shell::Sh => format!("test -d {}", sh_quote(path)),
        };
        self.succeeds(&line)
    }

    fn files_below(&self, root: &Path) -> Vec<PathBuf> {
        let line = match self.runner.shell() {
            Shell::Cmd => format!("dir /s /b /a-d {}", cmd_quote(root)),
            Shell::Sh => format!("find -L {} -type f 2>/dev/null", sh_quote(root)),
        };
        // Both commands exit non-zero when some directories were unreadable
        // or nothing matched; whatever they printed is still valid.
        let Some(output) = self.run(&line) else {
            return Vec::new();
        };
        output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect()
    }
}

fn cmd_quote(path: &Path) -> String {
    format!("\"{}\"", path_guard(&path.to_string_lossy()))
}

fn sh_quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;
    use tempfile::TempDir;

    #[test]
    fn file_name_splits_on_both_separators() {
        assert_eq!(
            file_name(Path::new("C:\\Program Files\\AutoHotkey\\AutoHotkey.exe")).as_deref(),
            Some("AutoHotkey.exe")
        );
        assert_eq!(
            file_name(Path::new("/opt/ahk/AutoHotkeyU64.exe")).as_deref(),
            Some("AutoHotkeyU64.exe")
        );
        assert_eq!(file_name(Path::new("C:\\AHK\\")), None);
    }

    #[test]
    fn local_fs_lists_nested_files() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("v2")).unwrap();
        fs::write(root.path().join("AutoHotkey.exe"), b"").unwrap();
        fs::write(root.path().join("v2").join("AutoHotkey64.exe"), b"").unwrap();

        let mut files = LocalFs.files_below(root.path());
        files.sort();
        assert_eq!(
            files,
            vec![
                root.path().join("AutoHotkey.exe"),
                root.path().join("v2").join("AutoHotkey64.exe"),
            ]
        );
        assert!(LocalFs.is_file(&root.path().join("AutoHotkey.exe")));
        assert!(!LocalFs.is_file(root.path()));
        assert!(LocalFs.is_dir(root.path()));
    }

    #[test]
    fn cmd_queries_use_if_exist_and_dir() {
        let runner = Arc::new(ScriptedRunner::new().with_shell(Shell::Cmd));
        runner.respond_to_line("if exist", "");
        runner.respond_to_line(
            "dir /s /b /a-d",
            "C:\\AHK\\AutoHotkey.exe\r\nC:\\AHK\\v2\\AutoHotkey64.exe\r\n\r\n",
        );
        let files = ShellFs::new(runner.clone());

        assert!(files.is_file(Path::new("C:/AHK/AutoHotkey.exe")));
        assert_eq!(
            files.files_below(Path::new("C:\\AHK")),
            vec![
                PathBuf::from("C:\\AHK\\AutoHotkey.exe"),
                PathBuf::from("C:\\AHK\\v2\\AutoHotkey64.exe"),
            ]
        );

        let calls = runner.calls();
        assert_eq!(calls[0].program, "cmd");
        assert_eq!(
            calls[0].args,
            vec![
                "/C".to_string(),
                "if exist \"C:\\AHK\\AutoHotkey.exe\\*\" (exit 1) else if exist \"C:\\AHK\\AutoHotkey.exe\" (exit 0) else (exit 1)"
                    .to_string(),
            ]
        );
        assert_eq!(calls[1].args[1], "dir /s /b /a-d \"C:\\AHK\"");
    }

    #[test]
    fn failed_or_refused_queries_answer_no() {
        let runner = Arc::new(ScriptedRunner::new().with_shell(Shell::Cmd));
        runner.fail_on_line("if exist", 1);
        let files = ShellFs::new(runner);
        assert!(!files.is_file(Path::new("C:\\AHK\\AutoHotkey.exe")));
        assert!(!files.is_dir(Path::new("C:\\AHK")));

        let refused = ShellFs::new(Arc::new(ScriptedRunner::new()));
        assert!(refused.files_below(Path::new("/opt/ahk")).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn sh_queries_match_local_fs() {
        use crate::process::NativeRunner;

        let root = TempDir::new().unwrap();
        let nested = root.path().join("it's here");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("AutoHotkey.exe"), b"").unwrap();
        let files = ShellFs::new(Arc::new(NativeRunner));

        assert!(files.is_dir(root.path()));
        assert!(!files.is_dir(&nested.join("AutoHotkey.exe")));
        assert!(files.is_file(&nested.join("AutoHotkey.exe")));
        assert!(!files.is_file(&nested));
        assert_eq!(files.files_below(root.path()), vec![nested.join("AutoHotkey.exe")]);
        assert!(files.files_below(&root.path().join("missing")).is_empty());
    }
}
