// backuptool/src/backup/model.rs
use chrono::{DateTime, Local};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use super::archive::Archive;
use super::naming::NamingScheme;
use super::{cleaner, dispatch, packager, Context};
use crate::adapters::{AdapterOptions, AdapterRegistry, Compressor, Database, Storage};
use crate::errors::{BackupError, Result};
use crate::utils::Toolbox;

/// Where a model is in its single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Configured,
    /// Databases dumped and archives folded into the workspace.
    DatabasesRun,
    Packaged,
    Compressed,
    Stored,
    Cleaned,
    Failed,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub trigger: String,
    /// Path of the final artifact as handed to the storages (removed by cleanup).
    pub file: PathBuf,
    pub extension: String,
    pub storages: usize,
}

/// Collects the adapters of a model while its configuration closure runs.
pub struct ModelBuilder<'r> {
    registry: &'r AdapterRegistry,
    databases: Vec<Box<dyn Database>>,
    archives: Vec<Archive>,
    compressors: Vec<Box<dyn Compressor>>,
    storages: Vec<Box<dyn Storage>>,
}

impl<'r> ModelBuilder<'r> {
    fn new(registry: &'r AdapterRegistry) -> Self {
        Self {
            registry,
            databases: Vec::new(),
            archives: Vec::new(),
            compressors: Vec::new(),
            storages: Vec::new(),
        }
    }

    pub fn database(&mut self, name: &str, options: impl Into<AdapterOptions>) -> Result<&mut Self> {
        let database = self.registry.database(name, &options.into())?;
        self.databases.push(database);
        Ok(self)
    }

    pub fn archive<F>(&mut self, name: &str, configure: F) -> &mut Self
    where
        F: FnOnce(&mut Archive),
    {
        let mut archive = Archive::new(name);
        configure(&mut archive);
        self.archives.push(archive);
        self
    }

    pub fn compress_with(&mut self, name: &str, options: impl Into<AdapterOptions>) -> Result<&mut Self> {
        let compressor = self.registry.compressor(name, &options.into())?;
        self.compressors.push(compressor);
        Ok(self)
    }

    pub fn store_to(&mut self, name: &str, options: impl Into<AdapterOptions>) -> Result<&mut Self> {
        let storage = self.registry.storage(name, &options.into())?;
        self.storages.push(storage);
        Ok(self)
    }
}

/// One backup job, configured once and run at most once.
///
/// ```no_run
/// # async fn example(ctx: &backuptool::backup::Context) -> backuptool::errors::Result<()> {
/// use backuptool::adapters::AdapterOptions;
/// use backuptool::backup::Model;
/// use serde_json::json;
///
/// let mut model = Model::new("pg-local", "Postgres to disk", ctx, |m| {
///     m.database("PostgreSQL", json!({ "url": "postgres://localhost/app" }))?;
///     m.archive("uploads", |a| { a.add("/srv/uploads"); });
///     m.compress_with("Gzip", AdapterOptions::none())?;
///     m.store_to("Local", json!({ "path": "/srv/backups" }))?;
///     Ok(())
/// })?;
/// model.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct Model {
    trigger: String,
    label: String,
    naming: NamingScheme,
    databases: Vec<Box<dyn Database>>,
    archives: Vec<Archive>,
    compressors: Vec<Box<dyn Compressor>>,
    storages: Vec<Box<dyn Storage>>,
    toolbox: Toolbox,
    storage_concurrency: usize,
    state: RunState,
}

impl Model {
    pub fn new<F>(trigger: &str, label: &str, ctx: &Context, configure: F) -> Result<Self>
    where
        F: FnOnce(&mut ModelBuilder<'_>) -> Result<()>,
    {
        Self::new_at(Local::now(), trigger, label, ctx, configure)
    }

    /// Like [`Model::new`] with an explicit run time.
    pub fn new_at<F>(
        started_at: DateTime<Local>,
        trigger: &str,
        label: &str,
        ctx: &Context,
        configure: F,
    ) -> Result<Self>
    where
        F: FnOnce(&mut ModelBuilder<'_>) -> Result<()>,
    {
        if trigger.is_empty() || trigger.contains(['/', '\\']) || trigger == "." || trigger == ".." {
            return Err(BackupError::Config(format!("invalid trigger: {:?}", trigger)));
        }

        let mut builder = ModelBuilder::new(ctx.registry());
        configure(&mut builder)?;

        let model = Self {
            trigger: trigger.to_string(),
            label: label.to_string(),
            naming: NamingScheme::new(ctx.tmp_root(), trigger, started_at),
            databases: builder.databases,
            archives: builder.archives,
            compressors: builder.compressors,
            storages: builder.storages,
            toolbox: ctx.toolbox().clone(),
            storage_concurrency: ctx.storage_concurrency(),
            state: RunState::Configured,
        };
        debug!(
            trigger = %model.trigger,
            databases = model.databases.len(),
            archives = model.archives.len(),
            compressors = model.compressors.len(),
            storages = model.storages.len(),
            "model configured"
        );
        Ok(model)
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn time(&self) -> &str {
        self.naming.time()
    }

    pub fn extension(&self) -> &str {
        self.naming.extension()
    }

    pub fn tmp_path(&self) -> PathBuf {
        self.naming.tmp_path()
    }

    pub fn file(&self) -> PathBuf {
        self.naming.file()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn databases(&self) -> &[Box<dyn Database>] {
        &self.databases
    }

    pub fn archives(&self) -> &[Archive] {
        &self.archives
    }

    pub fn compressors(&self) -> &[Box<dyn Compressor>] {
        &self.compressors
    }

    pub fn storages(&self) -> &[Box<dyn Storage>] {
        &self.storages
    }

    /// Executes the pipeline, then cleans up whether or not it succeeded.
    pub async fn run(&mut self) -> Result<RunReport> {
        if self.state != RunState::Configured {
            return Err(BackupError::AlreadyRun {
                trigger: self.trigger.clone(),
            });
        }
        self.naming.reset_extension();
        info!(trigger = %self.trigger, label = %self.label, time = %self.time(), "starting backup run");

        let outcome = self.execute().await;
        if let Err(e) = &outcome {
            error!(trigger = %self.trigger, error = %e, "backup run failed");
            self.state = RunState::Failed;
        }

        let cleanup = cleaner::clean(&self.naming, &self.toolbox).await;
        match (outcome, cleanup) {
            (Ok(report), Ok(())) => {
                self.state = RunState::Cleaned;
                info!(trigger = %self.trigger, file = %report.file.display(), "backup run complete");
                Ok(report)
            }
            (Ok(_), Err(cleanup)) => {
                error!(trigger = %self.trigger, error = %cleanup, "cleanup failed");
                self.state = RunState::Failed;
                Err(cleanup)
            }
            (Err(primary), Ok(())) => Err(primary),
            (Err(primary), Err(cleanup)) => {
                error!(trigger = %self.trigger, error = %cleanup, "cleanup failed after run failure");
                Err(BackupError::CleanupAfterFailure {
                    primary: Box::new(primary),
                    cleanup: Box::new(cleanup),
                })
            }
        }
    }

    async fn execute(&mut self) -> Result<RunReport> {
        let workspace = self.naming.tmp_path();
        tokio::fs::create_dir_all(&workspace).await?;

        if self.databases.is_empty() && self.archives.is_empty() {
            warn!(trigger = %self.trigger, "no databases or archives registered, packaging an empty workspace");
        }
        for database in &self.databases {
            info!(database = database.name(), "performing database dump");
            database.perform(&workspace, &self.toolbox).await?;
        }
        for archive in &self.archives {
            archive.perform(&workspace, &self.toolbox).await?;
        }
        self.state = RunState::DatabasesRun;

        packager::package(&self.naming, &self.toolbox).await?;
        self.state = RunState::Packaged;

        if let Some(compressor) = self.compressors.last() {
            if self.compressors.len() > 1 {
                warn!(
                    registered = self.compressors.len(),
                    applied = compressor.name(),
                    "multiple compressors registered, only the last one is applied"
                );
            }
            let extension = compressor
                .compress(&self.naming.file(), self.naming.extension(), &self.toolbox)
                .await?;
            self.naming.set_extension(extension);
            self.state = RunState::Compressed;
        }

        let artifact = self.naming.file();
        let failures =
            dispatch::dispatch(&self.storages, &artifact, &self.toolbox, self.storage_concurrency).await;
        if !failures.is_empty() {
            return Err(BackupError::StorageDispatch {
                attempted: self.storages.len(),
                failures,
            });
        }
        self.state = RunState::Stored;

        Ok(RunReport {
            trigger: self.trigger.clone(),
            file: artifact,
            extension: self.naming.extension().to_string(),
            storages: self.storages.len(),
        })
    }
}
