// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launching real subprocesses via `tokio::process`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::{Launchable, Running};

/// Launches a command line with a fixed environment.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub cwd: Option<PathBuf>,
}

impl CommandLauncher {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env: HashMap::new(),
            cwd: None,
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }
}

#[async_trait]
impl Launchable for CommandLauncher {
    async fn launch(&mut self) -> Result<Box<dyn Running>, String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .kill_on_drop(false);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| format!("failed to launch {}: {e}", self.program))?;
        let pid = child.id();
        debug!(program = %self.program, pid, "subprocess launched");

        let (exit_tx, exit_rx) = oneshot::channel();
        let program = self.program.clone();
        tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!(program = %program, error = %e, "wait on subprocess failed");
                    None
                }
            };
            let _ = exit_tx.send(code);
        });

        Ok(Box::new(ChildProcess { pid, exit_rx }))
    }
}

#[derive(Debug)]
struct ChildProcess {
    pid: Option<u32>,
    exit_rx: oneshot::Receiver<Option<i32>>,
}

impl Running for ChildProcess {
    fn id(&self) -> Option<u32> {
        self.pid
    }

    fn terminate(&self) {
        signal(self.pid, "-15");
    }

    fn kill(&self) {
        signal(self.pid, "-9");
    }

    fn exit_rx(&mut self) -> &mut oneshot::Receiver<Option<i32>> {
        &mut self.exit_rx
    }
}

fn signal(pid: Option<u32>, sig: &str) {
    let Some(pid) = pid else { return };
    let _ = std::process::Command::new("kill")
        .args([sig, &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
