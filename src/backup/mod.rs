pub(crate) mod archive;
pub(crate) mod cleaner;
pub(crate) mod dispatch;
pub(crate) mod model;
pub(crate) mod naming;
pub(crate) mod packager;

pub use archive::Archive;
pub use model::{Model, ModelBuilder, RunReport, RunState};
pub use naming::NamingScheme;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::AdapterRegistry;
use crate::config::Settings;
use crate::utils::{ShellRunner, Toolbox, Utilities};

/// Everything a model needs from its surroundings: where temporary files go,
/// how adapter names resolve, and how system commands run.
pub struct Context {
    tmp_root: PathBuf,
    registry: AdapterRegistry,
    toolbox: Toolbox,
    storage_concurrency: usize,
}

impl Context {
    pub fn new(tmp_root: impl Into<PathBuf>, registry: AdapterRegistry, toolbox: Toolbox) -> Self {
        Self {
            tmp_root: tmp_root.into(),
            registry,
            toolbox,
            storage_concurrency: 1,
        }
    }

    /// Shell-backed context built from loaded settings.
    pub fn from_settings(settings: &Settings, registry: AdapterRegistry) -> Self {
        let runner = ShellRunner::new(settings.command_timeout_secs.map(Duration::from_secs));
        let toolbox = Toolbox::new(Arc::new(runner), Utilities::new(settings.utilities.clone()));
        Self::new(&settings.tmp_root, registry, toolbox)
            .with_storage_concurrency(settings.storage_concurrency)
    }

    pub fn with_storage_concurrency(mut self, concurrency: usize) -> Self {
        self.storage_concurrency = concurrency.max(1);
        self
    }

    pub fn tmp_root(&self) -> &Path {
        &self.tmp_root
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    pub fn storage_concurrency(&self) -> usize {
        self.storage_concurrency
    }
}
