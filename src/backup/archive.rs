// backuptool/src/backup/archive.rs
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::errors::Result;
use crate::utils::{shell_quote, Toolbox};

/// A named set of filesystem paths folded into the workspace as
/// `<workspace>/archive/<name>.tar`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    name: String,
    paths: Vec<PathBuf>,
    excludes: Vec<PathBuf>,
}

impl Archive {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            paths: Vec::new(),
            excludes: Vec::new(),
        }
    }

    pub fn add(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.paths.push(path.into());
        self
    }

    pub fn exclude(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.excludes.push(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn excludes(&self) -> &[PathBuf] {
        &self.excludes
    }

    pub fn target(&self, workspace: &Path) -> PathBuf {
        workspace.join("archive").join(format!("{}.tar", self.name))
    }

    pub async fn perform(&self, workspace: &Path, toolbox: &Toolbox) -> Result<()> {
        if self.paths.is_empty() {
            warn!(archive = %self.name, "archive has no paths to include, skipping");
            return Ok(());
        }

        let target = self.target(workspace);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!(archive = %self.name, paths = self.paths.len(), "archiving paths into workspace");
        let tar = toolbox.utility("tar")?;
        toolbox.run(&self.command(&tar, &target)).await
    }

    fn command(&self, tar: &str, target: &Path) -> String {
        let mut parts = vec![tar.to_string(), "-c".to_string()];
        parts.extend(
            self.excludes
                .iter()
                .map(|path| format!("--exclude={}", shell_quote(path))),
        );
        parts.extend(self.paths.iter().map(|path| shell_quote(path)));
        parts.push(format!("2> /dev/null > {}", shell_quote(target)));
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;

    #[test]
    fn builds_tar_command_with_excludes() {
        let mut archive = Archive::new("uploads");
        archive.add("/srv/uploads").add("/etc/app.conf").exclude("/srv/uploads/cache");

        let command = archive.command("tar", &archive.target(Path::new("/tmp/root/job")));
        assert_eq!(
            command,
            "tar -c --exclude='/srv/uploads/cache' '/srv/uploads' '/etc/app.conf' \
             2> /dev/null > '/tmp/root/job/archive/uploads.tar'"
        );
    }

    #[tokio::test]
    async fn empty_archive_issues_no_command() -> anyhow::Result<()> {
        let runner = RecordingRunner::new();
        let workspace = tempfile::tempdir()?;
        Archive::new("nothing").perform(workspace.path(), &runner.toolbox()).await?;
        assert!(runner.commands().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn perform_creates_archive_directory() -> anyhow::Result<()> {
        let runner = RecordingRunner::new();
        let workspace = tempfile::tempdir()?;
        let mut archive = Archive::new("logs");
        archive.add("/var/log/app");

        archive.perform(workspace.path(), &runner.toolbox()).await?;

        assert!(workspace.path().join("archive").is_dir());
        assert_eq!(runner.commands().len(), 1);
        Ok(())
    }
}
