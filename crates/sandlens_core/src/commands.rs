//! Typed helpers for the handful of shell commands the core issues.

use log::trace;
use std::{fmt, str::FromStr};

use crate::exec::{CommandExecutor, CommandOutput, ExecError};

/// Which `stat` dialect the sandbox speaks when asked for a file size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatFlavor {
    /// GNU coreutils: `stat -c %s`
    #[default]
    Gnu,
    /// BSD / macOS: `stat -f %z`
    Bsd,
}

impl StatFlavor {
    fn args(self) -> [&'static str; 2] {
        match self {
            StatFlavor::Gnu => ["-c", "%s"],
            StatFlavor::Bsd => ["-f", "%z"],
        }
    }
}

impl FromStr for StatFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gnu" => Ok(StatFlavor::Gnu),
            "bsd" => Ok(StatFlavor::Bsd),
            other => Err(format!("unknown stat flavor '{}' (expected gnu or bsd)", other)),
        }
    }
}

impl fmt::Display for StatFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatFlavor::Gnu => write!(f, "gnu"),
            StatFlavor::Bsd => write!(f, "bsd"),
        }
    }
}

/// Command adapter over an executor.
///
/// Each helper returns the raw [`CommandOutput`]; whether a non-zero exit
/// means "nothing there" or "fatal" is decided by the caller.
#[derive(Clone, Copy)]
pub struct RemoteShell<'a> {
    exec: &'a dyn CommandExecutor,
}

impl<'a> RemoteShell<'a> {
    pub fn new(exec: &'a dyn CommandExecutor) -> Self {
        Self { exec }
    }

    pub fn find(&self, args: &[&str]) -> Result<CommandOutput, ExecError> {
        self.exec.execute("find", args)
    }

    pub fn stat_size(&self, path: &str, flavor: StatFlavor) -> Result<CommandOutput, ExecError> {
        let [flag, format] = flavor.args();
        self.exec.execute("stat", &[flag, format, path])
    }

    pub fn cat(&self, path: &str) -> Result<CommandOutput, ExecError> {
        self.exec.execute("cat", &[path])
    }

    pub fn ps_aux(&self) -> Result<CommandOutput, ExecError> {
        self.exec.execute("ps", &["aux"])
    }

    pub fn grep_insensitive(&self, pattern: &str, path: &str) -> Result<CommandOutput, ExecError> {
        self.exec.execute("grep", &["-i", pattern, path])
    }

    pub fn tail(&self, lines: usize, path: &str) -> Result<CommandOutput, ExecError> {
        let count = lines.to_string();
        self.exec.execute("tail", &["-n", &count, path])
    }

    /// Stdout of a successful command split into non-blank lines, decoded
    /// lossily.
    ///
    /// Returns `None` when the command exited non-zero.
    pub fn lines_if_success(output: &CommandOutput) -> Option<Vec<String>> {
        if !output.success() {
            trace!("{} exited with {}", output.command, output.exit_code);
            return None;
        }
        Some(non_blank_lines(&output.stdout_lossy()))
    }
}

/// Splits text on newlines, dropping whitespace-only lines.
pub fn non_blank_lines(text: &str) -> Vec<String> {
    text.split('\n').filter(|line| !line.trim().is_empty()).map(str::to_string).collect()
}
