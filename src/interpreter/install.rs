//! Locating the AutoHotkey install directory through the Windows registry.

use std::path::PathBuf;

use tracing::debug;

use crate::process::ProcessRunner;
use crate::{Error, Result};

const REG_KEY: &str = r"HKLM\SOFTWARE\AutoHotkey";
const REG_VALUE: &str = "InstallDir";

/// Runs `reg query` and returns the `InstallDir` value.
pub fn query_install_dir(runner: &dyn ProcessRunner) -> Result<PathBuf> {
    let args = ["query", REG_KEY, "/v", REG_VALUE].map(String::from);
    let output = runner.run("reg", &args, None)?.into_result("reg")?;
    let dir = parse_reg_output(&output.stdout, REG_VALUE).ok_or_else(|| {
        Error::InstallLocation(format!("{REG_VALUE} not present under {REG_KEY}"))
    })?;
    debug!(dir, "found AutoHotkey install directory");
    Ok(PathBuf::from(dir))
}

/// Extracts a value from `reg query` output.
///
/// Lines look like `    InstallDir    REG_SZ    C:\Program Files\AutoHotkey`,
/// separated by runs of spaces or tabs. The value itself may contain spaces.
pub fn parse_reg_output(output: &str, name: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let line = line.trim();
        let rest = line.strip_prefix(name)?;
        if !rest.starts_with([' ', '\t']) {
            return None;
        }
        let rest = rest.trim_start();
        let type_end = rest.find([' ', '\t'])?;
        let (kind, value) = rest.split_at(type_end);
        if !kind.starts_with("REG_") {
            return None;
        }
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\r\nHKEY_LOCAL_MACHINE\\SOFTWARE\\AutoHotkey\r\n    InstallDir    REG_SZ    C:\\Program Files\\AutoHotkey\r\n\r\n";

    #[test]
    fn parses_value_with_spaces() {
        assert_eq!(
            parse_reg_output(SAMPLE, "InstallDir").as_deref(),
            Some("C:\\Program Files\\AutoHotkey")
        );
    }

    #[test]
    fn accepts_tab_separators() {
        let output = "InstallDir\tREG_SZ\tD:\\AHK";
        assert_eq!(parse_reg_output(output, "InstallDir").as_deref(), Some("D:\\AHK"));
    }

    #[test]
    fn ignores_other_values_and_prefixes() {
        let output = "    InstallDirOld    REG_SZ    C:\\Old\n    Version    REG_SZ    1.1.33.10";
        assert_eq!(parse_reg_output(output, "InstallDir"), None);
        assert_eq!(parse_reg_output("", "InstallDir"), None);
        assert_eq!(parse_reg_output("    InstallDir    REG_SZ    ", "InstallDir"), None);
    }
}
