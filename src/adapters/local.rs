// backuptool/src/adapters/local.rs
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{AdapterOptions, Storage};
use crate::backup::naming::TIME_FORMAT;
use crate::errors::{BackupError, Result};
use crate::utils::Toolbox;

const ADAPTER: &str = "Local";

#[derive(Debug, Deserialize)]
struct LocalOptions {
    path: PathBuf,
    #[serde(default)]
    keep: Option<usize>,
}

/// Copies the artifact into a directory on this machine.
///
/// With `keep`, only the newest `keep` artifacts of the same job stay in the
/// directory; older ones are removed after a successful copy.
#[derive(Debug, Clone)]
pub struct Local {
    path: PathBuf,
    keep: Option<usize>,
}

impl Local {
    pub fn from_options(options: &AdapterOptions) -> Result<Self> {
        let options: LocalOptions = options.parse(ADAPTER)?;
        if options.path.as_os_str().is_empty() {
            return Err(BackupError::Config("Local storage path cannot be empty".to_string()));
        }
        if options.keep == Some(0) {
            return Err(BackupError::Config("Local storage keep must be at least 1".to_string()));
        }
        Ok(Self {
            path: options.path,
            keep: options.keep,
        })
    }

    /// Applies `keep` after a successful copy. The artifact is already stored,
    /// so failures here only warn.
    async fn retain(&self, artifact_name: &str, keep: usize) {
        if let Err(e) = self.cycle(artifact_name, keep).await {
            warn!(storage = ADAPTER, path = %self.path.display(), error = %e, "failed to apply retention");
        }
    }

    async fn cycle(&self, artifact_name: &str, keep: usize) -> Result<()> {
        let Some(job_suffix) = job_suffix(artifact_name) else {
            return Ok(());
        };

        let mut siblings = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if job_suffix_matches(&name, job_suffix) {
                siblings.push(name);
            }
        }
        // The timestamp prefix sorts chronologically.
        siblings.sort();

        let excess = siblings.len().saturating_sub(keep);
        for old in siblings.into_iter().take(excess) {
            info!(storage = ADAPTER, file = %old, "removing old artifact");
            if let Err(e) = tokio::fs::remove_file(self.path.join(&old)).await {
                warn!(storage = ADAPTER, file = %old, error = %e, "failed to remove old artifact");
            }
        }
        Ok(())
    }
}

/// `<time>.<trigger>.<extension>` without the `<time>.` prefix.
fn job_suffix(name: &str) -> Option<&str> {
    let time_len = "2000.01.01.00.00.00".len();
    let time = name.get(..time_len)?;
    let suffix = name.get(time_len..)?.strip_prefix('.')?;
    chrono::NaiveDateTime::parse_from_str(time, TIME_FORMAT).ok()?;
    if suffix.is_empty() { None } else { Some(suffix) }
}

fn job_suffix_matches(name: &str, suffix: &str) -> bool {
    job_suffix(name) == Some(suffix)
}

#[async_trait]
impl Storage for Local {
    fn name(&self) -> &str {
        ADAPTER
    }

    async fn transfer(&self, artifact: &Path, _toolbox: &Toolbox) -> Result<()> {
        let file_name = artifact
            .file_name()
            .ok_or_else(|| BackupError::Config(format!("artifact has no file name: {}", artifact.display())))?;
        tokio::fs::create_dir_all(&self.path).await?;
        let destination = self.path.join(file_name);

        info!(storage = ADAPTER, destination = %destination.display(), "copying artifact");
        tokio::fs::copy(artifact, &destination).await?;

        if let Some(keep) = self.keep {
            self.retain(&file_name.to_string_lossy(), keep).await;
        }
        Ok(())
    }
}
