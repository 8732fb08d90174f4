use std::collections::HashMap;

use super::{AdapterOptions, Compressor, Database, Storage};
use crate::errors::{AdapterKind, BackupError, Result};

pub type DatabaseFactory = Box<dyn Fn(&AdapterOptions) -> Result<Box<dyn Database>> + Send + Sync>;
pub type CompressorFactory = Box<dyn Fn(&AdapterOptions) -> Result<Box<dyn Compressor>> + Send + Sync>;
pub type StorageFactory = Box<dyn Fn(&AdapterOptions) -> Result<Box<dyn Storage>> + Send + Sync>;

/// Maps symbolic adapter names to constructors, one table per adapter kind.
#[derive(Default)]
pub struct AdapterRegistry {
    databases: HashMap<String, DatabaseFactory>,
    compressors: HashMap<String, CompressorFactory>,
    storages: HashMap<String, StorageFactory>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with `PostgreSQL`, `Gzip` and `Local`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_database("PostgreSQL", |options| {
            Ok(Box::new(super::postgresql::PostgreSql::from_options(options)?))
        });
        registry.register_compressor("Gzip", |options| {
            Ok(Box::new(super::gzip::Gzip::from_options(options)?))
        });
        registry.register_storage("Local", |options| {
            Ok(Box::new(super::local::Local::from_options(options)?))
        });
        registry
    }

    pub fn register_database<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&AdapterOptions) -> Result<Box<dyn Database>> + Send + Sync + 'static,
    {
        self.databases.insert(name.to_string(), Box::new(factory));
        self
    }

    pub fn register_compressor<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&AdapterOptions) -> Result<Box<dyn Compressor>> + Send + Sync + 'static,
    {
        self.compressors.insert(name.to_string(), Box::new(factory));
        self
    }

    pub fn register_storage<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&AdapterOptions) -> Result<Box<dyn Storage>> + Send + Sync + 'static,
    {
        self.storages.insert(name.to_string(), Box::new(factory));
        self
    }

    pub fn database(&self, name: &str, options: &AdapterOptions) -> Result<Box<dyn Database>> {
        let factory = self
            .databases
            .get(name)
            .ok_or_else(|| not_found(AdapterKind::Database, name))?;
        factory(options)
    }

    pub fn compressor(&self, name: &str, options: &AdapterOptions) -> Result<Box<dyn Compressor>> {
        let factory = self
            .compressors
            .get(name)
            .ok_or_else(|| not_found(AdapterKind::Compressor, name))?;
        factory(options)
    }

    pub fn storage(&self, name: &str, options: &AdapterOptions) -> Result<Box<dyn Storage>> {
        let factory = self
            .storages
            .get(name)
            .ok_or_else(|| not_found(AdapterKind::Storage, name))?;
        factory(options)
    }
}

fn not_found(kind: AdapterKind, name: &str) -> BackupError {
    BackupError::AdapterNotFound {
        kind,
        name: name.to_string(),
    }
}
