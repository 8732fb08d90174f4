use tracing::info;

use super::naming::NamingScheme;
use crate::errors::Result;
use crate::utils::{shell_quote, Toolbox};

/// Folds the workspace into the uncompressed bundle at `naming.file()`.
pub async fn package(naming: &NamingScheme, toolbox: &Toolbox) -> Result<()> {
    let tar = toolbox.utility("tar")?;
    let command = format!(
        "{} -c {} 2> /dev/null > {}",
        tar,
        shell_quote(&naming.tmp_path()),
        shell_quote(&naming.file())
    );
    info!(bundle = %naming.file().display(), "packaging workspace");
    toolbox.run(&command).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BackupError;
    use crate::testing::RecordingRunner;
    use chrono::Local;

    #[tokio::test]
    async fn issues_one_tar_command_over_the_workspace() -> anyhow::Result<()> {
        let runner = RecordingRunner::new();
        let naming = NamingScheme::new("/tmp/backups", "mysql-s3", Local::now());

        package(&naming, &runner.toolbox()).await?;

        let expected = format!(
            "tar -c '/tmp/backups/mysql-s3' 2> /dev/null > '/tmp/backups/{}.mysql-s3.tar'",
            naming.time()
        );
        assert_eq!(runner.commands(), vec![expected]);
        Ok(())
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_process_error() {
        let runner = RecordingRunner::new();
        runner.fail_when_starts_with("tar", 2);
        let naming = NamingScheme::new("/tmp/backups", "mysql-s3", Local::now());

        let err = package(&naming, &runner.toolbox()).await.unwrap_err();
        assert!(matches!(err, BackupError::Process { exit_status: Some(2), .. }));
    }
}
