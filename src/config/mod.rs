// backuptool/src/config/mod.rs
use anyhow::{Context as _, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::adapters::AdapterOptions;
use crate::backup::{Context, Model};

pub const DEFAULT_TMP_ROOT: &str = "./backuptmp";
pub const TMP_ROOT_ENV: &str = "BACKUP_TMP_ROOT";

fn default_tmp_root() -> PathBuf {
    PathBuf::from(DEFAULT_TMP_ROOT)
}

fn default_storage_concurrency() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_tmp_root")]
    pub tmp_root: PathBuf,
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
    #[serde(default = "default_storage_concurrency")]
    pub storage_concurrency: usize,
    /// Binary name to path, e.g. `"tar": "/usr/local/bin/gtar"`.
    #[serde(default)]
    pub utilities: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tmp_root: default_tmp_root(),
            command_timeout_secs: None,
            storage_concurrency: default_storage_concurrency(),
            utilities: HashMap::new(),
        }
    }
}

impl Settings {
    /// Applies `BACKUP_TMP_ROOT` from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(TMP_ROOT_ENV).filter(|s| !s.trim().is_empty()) {
            debug!(tmp_root = %root, "tmp_root overridden from environment");
            self.tmp_root = PathBuf::from(root);
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdapterEntry {
    pub adapter: String,
    #[serde(default)]
    pub options: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveEntry {
    pub name: String,
    #[serde(default)]
    pub add: Vec<PathBuf>,
    #[serde(default)]
    pub exclude: Vec<PathBuf>,
}

/// Declarative definition of one backup job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub trigger: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub databases: Vec<AdapterEntry>,
    #[serde(default)]
    pub archives: Vec<ArchiveEntry>,
    #[serde(default)]
    pub compressors: Vec<AdapterEntry>,
    #[serde(default)]
    pub storages: Vec<AdapterEntry>,
}

impl JobConfig {
    /// Registers every entry, in file order, on a new model.
    pub fn build(&self, ctx: &Context) -> crate::errors::Result<Model> {
        Model::new(&self.trigger, &self.label, ctx, |m| {
            for entry in &self.databases {
                m.database(&entry.adapter, AdapterOptions::new(entry.options.clone()))?;
            }
            for entry in &self.archives {
                m.archive(&entry.name, |archive| {
                    for path in &entry.add {
                        archive.add(path);
                    }
                    for path in &entry.exclude {
                        archive.exclude(path);
                    }
                });
            }
            for entry in &self.compressors {
                m.compress_with(&entry.adapter, AdapterOptions::new(entry.options.clone()))?;
            }
            for entry in &self.storages {
                m.store_to(&entry.adapter, AdapterOptions::new(entry.options.clone()))?;
            }
            Ok(())
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
    pub jobs: Vec<JobConfig>,
}

impl AppConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        let config = Self::from_json_str(&config_content).with_context(|| {
            format!("Failed to parse config file at {}", config_path.display())
        })?;
        info!(
            path = %config_path.display(),
            jobs = config.jobs.len(),
            tmp_root = %config.settings.tmp_root.display(),
            "loaded configuration"
        );
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(content).context("Invalid JSON in config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.jobs.is_empty() {
            anyhow::bail!("config must define at least one job");
        }
        let mut seen = HashSet::new();
        for job in &self.jobs {
            if !seen.insert(job.trigger.as_str()) {
                anyhow::bail!("duplicate job trigger '{}'", job.trigger);
            }
        }
        Ok(())
    }

    /// The jobs named by `triggers`, or every job when `triggers` is empty.
    pub fn select_jobs(&self, triggers: &[String]) -> Result<Vec<&JobConfig>> {
        if triggers.is_empty() {
            return Ok(self.jobs.iter().collect());
        }
        triggers
            .iter()
            .map(|trigger| {
                self.jobs
                    .iter()
                    .find(|job| &job.trigger == trigger)
                    .with_context(|| format!("no job with trigger '{}' in config", trigger))
            })
            .collect()
    }
}
