//! Adapter contracts consumed by the backup model.
//!
//! A database dumps into the workspace, a compressor rewrites the bundle and
//! reports the new extension, a storage receives the final artifact. Concrete
//! adapters are looked up by name through the [`AdapterRegistry`].

pub mod gzip;
pub mod local;
pub mod postgresql;
pub mod registry;

pub use registry::AdapterRegistry;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

use crate::errors::{BackupError, Result};
use crate::utils::Toolbox;

#[async_trait]
pub trait Database: Send + Sync {
    fn name(&self) -> &str;

    /// Dump into `workspace`, the run's temporary directory.
    async fn perform(&self, workspace: &Path, toolbox: &Toolbox) -> Result<()>;
}

#[async_trait]
pub trait Compressor: Send + Sync {
    fn name(&self) -> &str;

    /// Compress `bundle` in place and return the extension of the result,
    /// e.g. `tar` becomes `tar.gz`.
    async fn compress(&self, bundle: &Path, extension: &str, toolbox: &Toolbox) -> Result<String>;
}

#[async_trait]
pub trait Storage: Send + Sync {
    fn name(&self) -> &str;

    /// Send the final artifact to this destination. Must not modify `artifact`.
    async fn transfer(&self, artifact: &Path, toolbox: &Toolbox) -> Result<()>;
}

/// The configuration an adapter is constructed with.
#[derive(Debug, Clone, Default)]
pub struct AdapterOptions(Value);

impl AdapterOptions {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn none() -> Self {
        Self(Value::Null)
    }

    /// Deserializes the adapter's typed options; absent options read as `{}`.
    pub fn parse<T: DeserializeOwned>(&self, adapter: &str) -> Result<T> {
        let value = match &self.0 {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };
        serde_json::from_value(value)
            .map_err(|e| BackupError::Config(format!("invalid options for adapter '{}': {}", adapter, e)))
    }
}

impl From<Value> for AdapterOptions {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
