//! Scripted executor for tests.

use std::{collections::HashMap, sync::Mutex};

use crate::exec::{CommandExecutor, CommandOutput, ExecError};

type Invocation = (String, Vec<String>);

#[derive(Debug, Clone)]
enum Scripted {
    Output { exit_code: i32, stdout: Vec<u8> },
    TransportFailure(String),
}

/// Answers `(command, args)` pairs with canned results.
///
/// Unscripted invocations exit with status 1 and no output, which callers
/// read as "nothing there".
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: HashMap<Invocation, Scripted>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(
        mut self,
        command: &str,
        args: &[&str],
        exit_code: i32,
        stdout: impl Into<Vec<u8>>,
    ) -> Self {
        self.responses
            .insert(key(command, args), Scripted::Output { exit_code, stdout: stdout.into() });
        self
    }

    pub fn fail(mut self, command: &str, args: &[&str], message: &str) -> Self {
        self.responses.insert(key(command, args), Scripted::TransportFailure(message.to_string()));
        self
    }

    /// Every invocation seen so far, in order.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.calls().iter().filter(|(cmd, _)| cmd == command).count()
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn execute(&self, command: &str, args: &[&str]) -> Result<CommandOutput, ExecError> {
        let invocation = key(command, args);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }
        match self.responses.get(&invocation) {
            Some(Scripted::Output { exit_code, stdout }) => {
                Ok(CommandOutput::new(command, *exit_code, stdout.clone()))
            }
            Some(Scripted::TransportFailure(message)) => Err(ExecError::Transport {
                command: command.to_string(),
                message: message.clone(),
            }),
            None => Ok(CommandOutput::new(command, 1, Vec::new())),
        }
    }
}

fn key(command: &str, args: &[&str]) -> Invocation {
    (command.to_string(), args.iter().map(|a| a.to_string()).collect())
}
