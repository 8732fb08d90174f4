use tracing::info;

use super::naming::NamingScheme;
use crate::errors::Result;
use crate::utils::{shell_quote, Toolbox};

/// Removes the workspace and the final artifact under its current extension.
pub async fn clean(naming: &NamingScheme, toolbox: &Toolbox) -> Result<()> {
    let rm = toolbox.utility("rm")?;
    let command = format!(
        "{} -rf {} {}",
        rm,
        shell_quote(&naming.tmp_path()),
        shell_quote(&naming.file())
    );
    info!(workspace = %naming.tmp_path().display(), "removing temporary files");
    toolbox.run(&command).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BackupError;
    use crate::testing::RecordingRunner;
    use chrono::Local;

    #[tokio::test]
    async fn removes_workspace_and_bundle() -> anyhow::Result<()> {
        let runner = RecordingRunner::new();
        let naming = NamingScheme::new("/tmp/backups", "mysql-s3", Local::now());

        clean(&naming, &runner.toolbox()).await?;

        let expected = format!(
            "rm -rf '/tmp/backups/mysql-s3' '/tmp/backups/{}.mysql-s3.tar'",
            naming.time()
        );
        assert_eq!(runner.commands(), vec![expected]);
        Ok(())
    }

    #[tokio::test]
    async fn targets_the_compressed_artifact() -> anyhow::Result<()> {
        let runner = RecordingRunner::new();
        let mut naming = NamingScheme::new("/tmp/backups", "mysql-s3", Local::now());
        naming.set_extension("tar.gz");

        clean(&naming, &runner.toolbox()).await?;

        assert!(runner.commands()[0].ends_with(".mysql-s3.tar.gz'"));
        Ok(())
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_process_error() {
        let runner = RecordingRunner::new();
        runner.fail_when_starts_with("rm", 1);
        let naming = NamingScheme::new("/tmp/backups", "mysql-s3", Local::now());

        let err = clean(&naming, &runner.toolbox()).await.unwrap_err();
        assert_eq!(err.exit_status(), Some(1));
        assert!(matches!(err, BackupError::Process { .. }));
    }
}
