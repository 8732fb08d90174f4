use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

pub const BASE_EXTENSION: &str = "tar";
pub const TIME_FORMAT: &str = "%Y.%m.%d.%H.%M.%S";

/// Path conventions for one run.
///
/// Workspace is `<tmp_root>/<trigger>`, the bundle is
/// `<tmp_root>/<time>.<trigger>.<extension>`. Both are derived on every call
/// so the bundle path follows the extension as compression rewrites it.
#[derive(Debug, Clone)]
pub struct NamingScheme {
    tmp_root: PathBuf,
    trigger: String,
    time: String,
    extension: String,
}

impl NamingScheme {
    pub fn new(tmp_root: impl Into<PathBuf>, trigger: &str, started_at: DateTime<Local>) -> Self {
        Self {
            tmp_root: tmp_root.into(),
            trigger: trigger.to_string(),
            time: started_at.format(TIME_FORMAT).to_string(),
            extension: BASE_EXTENSION.to_string(),
        }
    }

    pub fn tmp_root(&self) -> &Path {
        &self.tmp_root
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn tmp_path(&self) -> PathBuf {
        self.tmp_root.join(&self.trigger)
    }

    pub fn file(&self) -> PathBuf {
        self.tmp_root
            .join(format!("{}.{}.{}", self.time, self.trigger, self.extension))
    }

    pub fn set_extension(&mut self, extension: impl Into<String>) {
        self.extension = extension.into();
    }

    pub fn reset_extension(&mut self) {
        self.extension = BASE_EXTENSION.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scheme() -> NamingScheme {
        let at = Local.with_ymd_and_hms(2026, 10, 14, 3, 5, 9).unwrap();
        NamingScheme::new("/var/tmp/backup", "mysql-s3", at)
    }

    #[test]
    fn time_is_formatted_with_dots() {
        assert_eq!(scheme().time(), "2026.10.14.03.05.09");
    }

    #[test]
    fn workspace_is_trigger_under_root() {
        assert_eq!(scheme().tmp_path(), PathBuf::from("/var/tmp/backup/mysql-s3"));
    }

    #[test]
    fn bundle_starts_as_plain_tar() {
        let naming = scheme();
        assert_eq!(naming.extension(), "tar");
        assert_eq!(
            naming.file(),
            PathBuf::from("/var/tmp/backup/2026.10.14.03.05.09.mysql-s3.tar")
        );
    }

    #[test]
    fn bundle_follows_extension_changes() {
        let mut naming = scheme();
        naming.set_extension("tar.gz");
        assert_eq!(
            naming.file().file_name().and_then(|n| n.to_str()),
            Some("2026.10.14.03.05.09.mysql-s3.tar.gz")
        );
        naming.reset_extension();
        assert_eq!(naming.extension(), "tar");
        assert_eq!(naming.tmp_path(), PathBuf::from("/var/tmp/backup/mysql-s3"));
    }
}
