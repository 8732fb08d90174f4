//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::adapters::{AdapterRegistry, Compressor, Database, Storage};
use crate::errors::{BackupError, Result};
use crate::utils::{CommandRunner, Toolbox, Utilities};

#[derive(Default)]
struct Recorded {
    commands: Vec<String>,
    envs: Vec<Vec<(String, String)>>,
    fail_prefixes: Vec<(String, i32)>,
}

/// Records every command instead of executing it.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands starting with `prefix` exit with `status`.
    pub fn fail_when_starts_with(&self, prefix: &str, status: i32) {
        self.inner
            .lock()
            .unwrap()
            .fail_prefixes
            .push((prefix.to_string(), status));
    }

    pub fn commands(&self) -> Vec<String> {
        self.inner.lock().unwrap().commands.clone()
    }

    /// Extra environment of each command, parallel to [`Self::commands`].
    pub fn envs(&self) -> Vec<Vec<(String, String)>> {
        self.inner.lock().unwrap().envs.clone()
    }

    /// A toolbox whose utilities resolve to their bare names.
    pub fn toolbox(&self) -> Toolbox {
        let overrides = ["tar", "rm", "gzip", "pg_dump"]
            .into_iter()
            .map(|name| (name.to_string(), name.to_string()))
            .collect::<HashMap<_, _>>();
        Toolbox::new(Arc::new(self.clone()), Utilities::new(overrides))
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run_with_env(&self, command: &str, envs: &[(&str, &str)]) -> Result<()> {
        let mut recorded = self.inner.lock().unwrap();
        recorded.commands.push(command.to_string());
        recorded
            .envs
            .push(envs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect());
        let failure = recorded
            .fail_prefixes
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, status)| *status);
        match failure {
            Some(status) => Err(BackupError::Process {
                command: command.to_string(),
                exit_status: Some(status),
                stderr: String::new(),
            }),
            None => Ok(()),
        }
    }
}

/// Ordered log of adapter calls, shared between fakes and assertions.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct FakeDatabase {
    pub log: CallLog,
    pub fail: bool,
}

#[async_trait]
impl Database for FakeDatabase {
    fn name(&self) -> &str {
        "TestDatabase"
    }

    async fn perform(&self, workspace: &Path, _toolbox: &Toolbox) -> Result<()> {
        self.log.push(format!("database:{}", workspace.display()));
        if self.fail {
            return Err(BackupError::Config("database unreachable".to_string()));
        }
        Ok(())
    }
}

pub struct FakeCompressor {
    pub name: &'static str,
    pub suffix: &'static str,
    pub log: CallLog,
}

#[async_trait]
impl Compressor for FakeCompressor {
    fn name(&self) -> &str {
        self.name
    }

    async fn compress(&self, bundle: &Path, extension: &str, _toolbox: &Toolbox) -> Result<String> {
        self.log.push(format!("compress:{}:{}", self.name, bundle.display()));
        Ok(format!("{}.{}", extension, self.suffix))
    }
}

pub struct FakeStorage {
    pub name: &'static str,
    pub log: CallLog,
    pub fail: bool,
}

#[async_trait]
impl Storage for FakeStorage {
    fn name(&self) -> &str {
        self.name
    }

    async fn transfer(&self, artifact: &Path, _toolbox: &Toolbox) -> Result<()> {
        self.log.push(format!("transfer:{}:{}", self.name, artifact.display()));
        if self.fail {
            return Err(BackupError::Io(std::io::Error::other("connection reset")));
        }
        Ok(())
    }
}

/// Registry of fakes: `TestDatabase`, `FailingDatabase`, `TestStorage`,
/// `FailingStorage`, and the compressors `Gzip` (`gz`) and `SevenZip` (`7z`).
pub fn fake_registry(log: &CallLog) -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    let l = log.clone();
    registry.register_database("TestDatabase", move |_| {
        Ok(Box::new(FakeDatabase { log: l.clone(), fail: false }))
    });
    let l = log.clone();
    registry.register_database("FailingDatabase", move |_| {
        Ok(Box::new(FakeDatabase { log: l.clone(), fail: true }))
    });
    let l = log.clone();
    registry.register_storage("TestStorage", move |_| {
        Ok(Box::new(FakeStorage { name: "TestStorage", log: l.clone(), fail: false }))
    });
    let l = log.clone();
    registry.register_storage("FailingStorage", move |_| {
        Ok(Box::new(FakeStorage { name: "FailingStorage", log: l.clone(), fail: true }))
    });
    let l = log.clone();
    registry.register_compressor("Gzip", move |_| {
        Ok(Box::new(FakeCompressor { name: "Gzip", suffix: "gz", log: l.clone() }))
    });
    let l = log.clone();
    registry.register_compressor("SevenZip", move |_| {
        Ok(Box::new(FakeCompressor { name: "SevenZip", suffix: "7z", log: l.clone() }))
    });
    registry
}
