use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

/// Pre-release channel of an AutoHotkey build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestVersion {
    Alpha,
    Beta,
}

impl fmt::Display for TestVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Alpha => "alpha",
            Self::Beta => "beta",
        })
    }
}

/// A parsed `major.minor.patch.build` AutoHotkey version.
///
/// Missing numeric segments are `0`. Pre-releases order before the
/// release with the same numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AutohotkeyVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: u32,
    pub test_version: Option<TestVersion>,
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^v?(\d+)\.(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:-(alpha|beta|a|b)(?:[.\-]?(\d+))?)?(?:[-+].*)?$",
        )
        .expect("version regex is valid")
    })
}

impl AutohotkeyVersion {
    pub fn parse(input: &str) -> Option<Self> {
        let caps = version_regex().captures(input.trim())?;
        let number = |index: usize| -> Option<u32> {
            match caps.get(index) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };
        let test_version = caps.get(5).map(|m| {
            if m.as_str().to_ascii_lowercase().starts_with('a') {
                TestVersion::Alpha
            } else {
                TestVersion::Beta
            }
        });
        // For pre-releases the trailing counter (e.g. `beta.3`, `a122`) takes the build slot.
        let build = match (test_version, caps.get(4), caps.get(6)) {
            (Some(_), None, Some(counter)) => counter.as_str().parse().ok()?,
            _ => number(4)?,
        };

        Some(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            build,
            test_version,
        })
    }

    pub fn is_v2(&self) -> bool {
        self.major >= 2
    }
}

impl FromStr for AutohotkeyVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::Error::InvalidVersion(s.to_string()))
    }
}

impl Ord for AutohotkeyVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // A release (`None`) outranks any pre-release of the same numbers.
        let channel = |v: &Self| match v.test_version {
            Some(TestVersion::Alpha) => 0,
            Some(TestVersion::Beta) => 1,
            None => 2,
        };
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| channel(self).cmp(&channel(other)))
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl PartialOrd for AutohotkeyVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AutohotkeyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        match self.test_version {
            Some(test) => write!(f, "-{test}.{}", self.build),
            None => write!(f, ".{}", self.build),
        }
    }
}
