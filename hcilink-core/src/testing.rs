use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

use crate::command::{CommandLine, CommandOutcome, CommandRunner};

enum Scripted {
    Outcome(CommandOutcome),
    LaunchFailure,
}

/// Replays canned outcomes keyed by the rendered command line and records every call.
/// Unscripted commands fail to launch.
#[derive(Default)]
pub struct ScriptedRunner {
    script: Mutex<HashMap<String, Scripted>>,
    invocations: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, command: &str, exit_code: i32, stdout: &str, stderr: &str) {
        self.script.lock().unwrap().insert(
            command.to_string(),
            Scripted::Outcome(CommandOutcome {
                exit_code: Some(exit_code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }),
        );
    }

    pub fn fail_launch(&self, command: &str) {
        self.script
            .lock()
            .unwrap()
            .insert(command.to_string(), Scripted::LaunchFailure);
    }

    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.invocations().iter().filter(|c| *c == command).count()
    }

    pub fn was_invoked(&self, command: &str) -> bool {
        self.count(command) > 0
    }

    pub fn clear_invocations(&self) {
        self.invocations.lock().unwrap().clear();
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &CommandLine) -> io::Result<CommandOutcome> {
        let rendered = command.to_string();
        self.invocations.lock().unwrap().push(rendered.clone());

        match self.script.lock().unwrap().get(&rendered) {
            Some(Scripted::Outcome(outcome)) => Ok(outcome.clone()),
            Some(Scripted::LaunchFailure) | None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: command not found", command.program),
            )),
        }
    }
}
