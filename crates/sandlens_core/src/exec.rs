//! Command execution capability.
//!
//! Everything the core learns about a sandbox comes through
//! [`CommandExecutor::execute`]. A non-zero exit status is reported as data;
//! only transport problems (spawn failures, dropped connections, signals)
//! become [`ExecError`].

use log::trace;
use std::{
    io,
    path::PathBuf,
    process::{Command, Stdio},
};
use thiserror::Error;

/// Exit status ssh uses for its own connection errors.
const SSH_TRANSPORT_EXIT: i32 = 255;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("transport failure running '{command}': {message}")]
    Transport { command: String, message: String },

    #[error("output of '{command}' is not valid UTF-8")]
    Decode { command: String },
}

/// Result of one remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub command: String,
    pub exit_code: i32,
    stdout: Vec<u8>,
}

impl CommandOutput {
    pub fn new(command: impl Into<String>, exit_code: i32, stdout: impl Into<Vec<u8>>) -> Self {
        Self { command: command.into(), exit_code, stdout: stdout.into() }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Decodes standard output as UTF-8 text.
    pub fn stdout(&self) -> Result<String, ExecError> {
        String::from_utf8(self.stdout.clone())
            .map_err(|_| ExecError::Decode { command: self.command.clone() })
    }

    /// Standard output with invalid UTF-8 replaced by U+FFFD.
    ///
    /// For listings, where one odd name must not hide the rest.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Runs a command by name with an ordered argument list.
///
/// Calls are synchronous; callers never have more than one outstanding.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &str, args: &[&str]) -> Result<CommandOutput, ExecError>;
}

impl<T: CommandExecutor + ?Sized> CommandExecutor for Box<T> {
    fn execute(&self, command: &str, args: &[&str]) -> Result<CommandOutput, ExecError> {
        (**self).execute(command, args)
    }
}

#[derive(Debug, Clone)]
enum Transport {
    Local { workdir: PathBuf },
    Ssh { destination: String, workdir: Option<String> },
}

/// Executes commands as child processes, locally or through `ssh`.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    transport: Transport,
}

impl ShellExecutor {
    /// Run commands directly in `workdir` on this machine.
    pub fn local(workdir: impl Into<PathBuf>) -> Self {
        Self { transport: Transport::Local { workdir: workdir.into() } }
    }

    /// Run commands on `destination` (user@host or host) via ssh.
    pub fn ssh(destination: impl Into<String>, workdir: Option<String>) -> Self {
        Self { transport: Transport::Ssh { destination: destination.into(), workdir } }
    }

    fn spawn(&self, command: &str, args: &[&str]) -> io::Result<std::process::Output> {
        match &self.transport {
            Transport::Local { workdir } => Command::new(command)
                .args(args)
                .current_dir(workdir)
                .stdin(Stdio::null())
                .output(),
            Transport::Ssh { destination, workdir } => {
                let mut remote = String::new();
                if let Some(dir) = workdir {
                    remote.push_str(&format!("cd {} && ", quote(dir)));
                }
                remote.push_str(&quote(command));
                for arg in args {
                    remote.push(' ');
                    remote.push_str(&quote(arg));
                }
                trace!("ssh {} {}", destination, remote);
                Command::new("ssh").arg(destination).arg(remote).stdin(Stdio::null()).output()
            }
        }
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(&self, command: &str, args: &[&str]) -> Result<CommandOutput, ExecError> {
        trace!("Executing: {} {:?}", command, args);
        let output = self
            .spawn(command, args)
            .map_err(|source| ExecError::Spawn { command: command.to_string(), source })?;

        let Some(exit_code) = output.status.code() else {
            return Err(ExecError::Transport {
                command: command.to_string(),
                message: "terminated by signal".to_string(),
            });
        };

        if exit_code == SSH_TRANSPORT_EXIT && matches!(self.transport, Transport::Ssh { .. }) {
            return Err(ExecError::Transport {
                command: command.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        trace!("{} exited with {}", command, exit_code);
        Ok(CommandOutput::new(command, exit_code, output.stdout))
    }
}

/// Quote a word for a POSIX shell.
fn quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', "'\\''"))
}
