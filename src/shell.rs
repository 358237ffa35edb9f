//! Helpers for building the shell line sent to the run-file terminal.

/// Wraps `arg` in double quotes when it contains whitespace.
pub fn quote(arg: &str) -> String {
    if arg.chars().any(char::is_whitespace) {
        format!("\"{arg}\"")
    } else {
        arg.to_string()
    }
}

/// Converts every forward slash to a backslash so Windows shells accept the path.
pub fn path_guard(path: &str) -> String {
    path.replace('/', "\\")
}

/// Guards and quotes a path for use as a shell argument.
pub fn shell_path(path: &str) -> String {
    quote(&path_guard(path))
}

/// The line that runs `script` with `runtime`, folding stderr into the output.
pub fn run_line(runtime: &str, script: &str) -> String {
    format!(
        "{} /ErrorStdOut {} 2>&1 | more",
        shell_path(runtime.trim()),
        shell_path(script)
    )
}
