use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::{debug, warn};

use crate::process::ProcessRunner;
use crate::Result;

/// How long an interpreter gets to print its version before it is killed.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Version reported for scanned executables whose probe failed.
pub const UNKNOWN_VERSION: &str = "unknown";

const VERSION_SCRIPT_NAME: &str = "ahk-version.ahk";
const VERSION_SCRIPT: &str = "#NoTrayIcon\nFileAppend, %A_AhkVersion%, *\n";

/// Asks interpreters for their version by running a tiny script.
pub struct VersionProbe {
    runner: Arc<dyn ProcessRunner>,
    script_dir: PathBuf,
    script: OnceLock<Option<PathBuf>>,
}

impl VersionProbe {
    /// `script_dir` receives the version script the first time it is needed.
    pub fn new(runner: Arc<dyn ProcessRunner>, script_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            script_dir: script_dir.into(),
            script: OnceLock::new(),
        }
    }

    pub fn runner(&self) -> &Arc<dyn ProcessRunner> {
        &self.runner
    }

    fn script_path(&self) -> Option<&Path> {
        self.script
            .get_or_init(|| {
                let path = self.script_dir.join(VERSION_SCRIPT_NAME);
                match fs::create_dir_all(&self.script_dir)
                    .and_then(|()| fs::write(&path, VERSION_SCRIPT))
                {
                    Ok(()) => Some(path),
                    Err(err) => {
                        warn!(
                            path = %path.display(),
                            error = %err,
                            "failed to write version script"
                        );
                        None
                    }
                }
            })
            .as_deref()
    }

    /// Runs `interpreter` against the version script and returns its trimmed output.
    pub fn version(&self, interpreter: &Path) -> Result<String> {
        let program = interpreter.to_string_lossy();
        let script = self
            .script_path()
            .ok_or_else(|| crate::Error::NotAFile(self.script_dir.join(VERSION_SCRIPT_NAME)))?;
        let args = vec![
            "/ErrorStdOut".to_string(),
            script.to_string_lossy().into_owned(),
        ];
        let output = self
            .runner
            .run(&program, &args, Some(PROBE_TIMEOUT))?
            .into_result(&program)?;
        let version = output.stdout.trim().to_string();
        debug!(interpreter = %program, %version, "probed interpreter");
        Ok(version)
    }

    /// Like [`VersionProbe::version`] but never fails; empty output counts as a failure.
    pub fn try_version(&self, interpreter: &Path) -> Option<String> {
        match self.version(interpreter) {
            Ok(version) if !version.is_empty() => Some(version),
            Ok(_) => {
                warn!(interpreter = %interpreter.display(), "interpreter printed no version");
                None
            }
            Err(err) => {
                warn!(interpreter = %interpreter.display(), error = %err, "version probe failed");
                None
            }
        }
    }
}
