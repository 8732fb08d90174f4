use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use super::{AdapterOptions, Compressor};
use crate::errors::{BackupError, Result};
use crate::utils::{shell_quote, Toolbox};

const ADAPTER: &str = "Gzip";

#[derive(Debug, Deserialize)]
struct GzipOptions {
    #[serde(default = "default_level")]
    level: u32,
}

fn default_level() -> u32 {
    9
}

/// Compresses the bundle in place with the system `gzip`, appending `.gz`.
#[derive(Debug, Clone)]
pub struct Gzip {
    level: u32,
}

impl Gzip {
    pub fn from_options(options: &AdapterOptions) -> Result<Self> {
        let options: GzipOptions = options.parse(ADAPTER)?;
        if !(1..=9).contains(&options.level) {
            return Err(BackupError::Config(format!(
                "gzip level must be between 1 and 9, got {}",
                options.level
            )));
        }
        Ok(Self { level: options.level })
    }
}

#[async_trait]
impl Compressor for Gzip {
    fn name(&self) -> &str {
        ADAPTER
    }

    async fn compress(&self, bundle: &Path, extension: &str, toolbox: &Toolbox) -> Result<String> {
        info!(bundle = %bundle.display(), level = self.level, "compressing bundle with gzip");
        let gzip = toolbox.utility("gzip")?;
        toolbox
            .run(&format!("{} -{} {}", gzip, self.level, shell_quote(bundle)))
            .await?;
        Ok(format!("{}.gz", extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;
    use serde_json::json;
    use std::path::PathBuf;

    #[tokio::test]
    async fn appends_gz_to_the_current_extension() -> anyhow::Result<()> {
        let runner = RecordingRunner::new();
        let toolbox = runner.toolbox();
        let gzip = Gzip::from_options(&AdapterOptions::none())?;

        let extension = gzip
            .compress(&PathBuf::from("/tmp/2026.10.14.03.00.00.db.tar"), "tar", &toolbox)
            .await?;

        assert_eq!(extension, "tar.gz");
        assert_eq!(runner.commands(), vec!["gzip -9 '/tmp/2026.10.14.03.00.00.db.tar'"]);
        Ok(())
    }

    #[test]
    fn rejects_out_of_range_level() {
        let err = Gzip::from_options(&AdapterOptions::new(json!({ "level": 12 }))).unwrap_err();
        assert!(matches!(err, BackupError::Config(_)));
    }
}
