// backuptool/src/utils/command.rs
use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};
use which::which;

use crate::errors::{BackupError, Result};

/// Executes a shell command line, failing when it exits nonzero.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` with `envs` added to the inherited environment.
    ///
    /// Values passed in `envs` never appear in errors or log events.
    async fn run_with_env(&self, command: &str, envs: &[(&str, &str)]) -> Result<()>;

    async fn run(&self, command: &str) -> Result<()> {
        self.run_with_env(command, &[]).await
    }
}

/// Runs commands through `sh -c` so redirections in the command line apply.
///
/// Each command gets its own process group. On timeout the whole group is
/// killed, including workers `sh` forked.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    timeout: Option<Duration>,
}

impl ShellRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run_with_env(&self, command: &str, envs: &[(&str, &str)]) -> Result<()> {
        let env_names: Vec<&str> = envs.iter().map(|(name, _)| *name).collect();
        debug!(command, envs = ?env_names, "running system command");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .envs(envs.iter().copied())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn()?;
        let pgid = child.id();

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    // Dropping the wait future already killed `sh` itself.
                    if let Some(pgid) = pgid {
                        kill_process_group(pgid);
                    }
                    warn!(command, timeout = ?limit, "system command timed out");
                    return Err(BackupError::CommandTimedOut {
                        command: command.to_string(),
                        timeout: limit,
                    });
                }
            },
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            return Err(BackupError::Process {
                command: command.to_string(),
                exit_status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg only sends a signal; a group that is already gone yields ESRCH.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(pgid, error = %std::io::Error::last_os_error(), "process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}

/// Locates the external binaries adapters shell out to.
///
/// Configured overrides win over a `PATH` lookup.
#[derive(Debug, Clone, Default)]
pub struct Utilities {
    overrides: HashMap<String, String>,
}

impl Utilities {
    pub fn new(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }

    pub fn resolve(&self, name: &str) -> Result<String> {
        if let Some(path) = self.overrides.get(name) {
            return Ok(path.clone());
        }
        which(name)
            .map(|path| path.display().to_string())
            .map_err(|_| BackupError::UtilityNotFound(name.to_string()))
    }
}

/// The command capability handed to the pipeline stages and adapters.
#[derive(Clone)]
pub struct Toolbox {
    runner: Arc<dyn CommandRunner>,
    utilities: Utilities,
}

impl Toolbox {
    pub fn new(runner: Arc<dyn CommandRunner>, utilities: Utilities) -> Self {
        Self { runner, utilities }
    }

    pub fn utility(&self, name: &str) -> Result<String> {
        self.utilities.resolve(name)
    }

    pub async fn run(&self, command: &str) -> Result<()> {
        self.runner.run(command).await
    }

    pub async fn run_with_env(&self, command: &str, envs: &[(&str, &str)]) -> Result<()> {
        self.runner.run_with_env(command, envs).await
    }
}
