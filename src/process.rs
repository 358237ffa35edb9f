//! Subprocess execution behind a trait so editors can supply their own runner.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::shell::quote;
use crate::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Exit code of a [`Shell::bounded`] wrapper whose child ran out of time.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Converts a non-zero exit into [`Error::ExitStatus`].
    pub fn into_result(self, program: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::ExitStatus {
                program: program.to_string(),
                status: self.status,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }

    /// Maps the exit code of a [`Shell::bounded`] wrapper back to [`Error::Timeout`].
    pub fn or_timeout(self, program: &str, timeout: Duration) -> Result<Self> {
        if self.status == Some(TIMEOUT_EXIT_CODE) {
            Err(Error::Timeout {
                program: program.to_string(),
                timeout,
            })
        } else {
            Ok(self)
        }
    }
}

/// The shell a runner executes command lines with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Cmd,
    Sh,
}

impl Shell {
    /// The shell of the platform this crate was built for.
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::Cmd
        } else {
            Self::Sh
        }
    }

    /// Program and arguments that run `line`.
    pub fn command(self, line: &str) -> (String, Vec<String>) {
        match self {
            Self::Cmd => ("cmd".to_string(), vec!["/C".to_string(), line.to_string()]),
            Self::Sh => ("sh".to_string(), vec!["-c".to_string(), line.to_string()]),
        }
    }

    /// Program and arguments that run `program` but kill it once `timeout`
    /// elapses, exiting with [`TIMEOUT_EXIT_CODE`] in that case.
    ///
    /// Used by runners that cannot kill a child themselves.
    pub fn bounded(
        self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> (String, Vec<String>) {
        match self {
            Self::Cmd => {
                let arguments = args.iter().map(|arg| quote(arg)).collect::<Vec<_>>().join(" ");
                let script = [
                    format!(
                        "$i = New-Object System.Diagnostics.ProcessStartInfo {}, {}",
                        ps_quote(program),
                        ps_quote(&arguments)
                    ),
                    "$i.UseShellExecute = $false".to_string(),
                    "$i.RedirectStandardOutput = $true".to_string(),
                    "$i.RedirectStandardError = $true".to_string(),
                    "$p = [System.Diagnostics.Process]::Start($i)".to_string(),
                    "$o = $p.StandardOutput.ReadToEndAsync()".to_string(),
                    "$e = $p.StandardError.ReadToEndAsync()".to_string(),
                    format!(
                        "if (-not $p.WaitForExit({})) {{ $p.Kill(); exit {TIMEOUT_EXIT_CODE} }}",
                        timeout.as_millis()
                    ),
                    "[Console]::Out.Write($o.Result)".to_string(),
                    "[Console]::Error.Write($e.Result)".to_string(),
                    "exit $p.ExitCode".to_string(),
                ]
                .join("; ");
                let args: Vec<String> = ["-NoProfile", "-NonInteractive", "-Command"]
                    .into_iter()
                    .map(String::from)
                    .chain([script])
                    .collect();
                ("powershell".to_string(), args)
            }
            Self::Sh => {
                let script = format!(
                    "t=$1; shift; \"$@\" & p=$!; \
                     (sleep \"$t\"; kill \"$p\") >/dev/null 2>&1 & w=$!; \
                     wait \"$p\"; s=$?; kill \"$w\" 2>/dev/null; \
                     wait \"$w\" && exit {TIMEOUT_EXIT_CODE}; exit \"$s\""
                );
                let mut wrapped = vec![
                    "-c".to_string(),
                    script,
                    "sh".to_string(),
                    timeout.as_secs_f64().to_string(),
                    program.to_string(),
                ];
                wrapped.extend(args.iter().cloned());
                ("sh".to_string(), wrapped)
            }
        }
    }
}

/// PowerShell single-quoted string literal.
fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub trait ProcessRunner: Send + Sync {
    /// Runs `program` with `args` to completion. When `timeout` elapses the
    /// process is killed and [`Error::Timeout`] returned.
    fn run(&self, program: &str, args: &[String], timeout: Option<Duration>)
        -> Result<ProcessOutput>;

    /// The shell command lines are run with.
    fn shell(&self) -> Shell {
        Shell::native()
    }
}

/// Runs processes with `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeRunner;

impl ProcessRunner for NativeRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput> {
        debug!(program, ?args, ?timeout, "spawning process");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: program.to_string(),
                source,
            })?;

        // Drained while waiting so a chatty child never blocks on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if let Some(timeout) = timeout {
                if started.elapsed() >= timeout {
                    if let Err(err) = child.kill() {
                        warn!(program, error = %err, "failed to kill timed out process");
                    }
                    let _ = child.wait();
                    // Reader threads are left behind; grandchildren may still hold the pipes.
                    return Err(Error::Timeout {
                        program: program.to_string(),
                        timeout,
                    });
                }
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(ProcessOutput {
            status: status.code(),
            stdout: collect(stdout)?,
            stderr: collect(stderr)?,
        })
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<String>> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        pipe.read_to_end(&mut bytes)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    })
}

fn collect(reader: Option<JoinHandle<std::io::Result<String>>>) -> Result<String> {
    match reader {
        Some(handle) => match handle.join() {
            Ok(text) => Ok(text?),
            Err(_) => Err(Error::Io(std::io::Error::other("output reader panicked"))),
        },
        None => Ok(String::new()),
    }
}
