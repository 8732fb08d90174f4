// backuptool/src/adapters/postgresql.rs
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::info;
use url::Url;

use super::{AdapterOptions, Database};
use crate::errors::{BackupError, Result};
use crate::utils::{quote_str, shell_quote, Toolbox};

const ADAPTER: &str = "PostgreSQL";

#[derive(Deserialize)]
struct PostgreSqlOptions {
    url: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    additional_options: Vec<String>,
}

/// Dumps one database with `pg_dump` into `<workspace>/PostgreSQL/<name>.sql`.
///
/// A password in the URL is moved to `PGPASSWORD`, so it never shows up on the
/// command line, in errors or in logs.
pub struct PostgreSql {
    url: Url,
    password: Option<String>,
    name: String,
    additional_options: Vec<String>,
}

impl fmt::Debug for PostgreSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgreSql")
            .field("url", &self.url.as_str())
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .field("additional_options", &self.additional_options)
            .finish()
    }
}

impl PostgreSql {
    pub fn from_options(options: &AdapterOptions) -> Result<Self> {
        let options: PostgreSqlOptions = options.parse(ADAPTER)?;
        let mut url = Url::parse(&options.url)
            .map_err(|e| BackupError::Config(format!("invalid PostgreSQL URL: {}", e)))?;

        let name = match options.name {
            Some(name) => name,
            None => url.path().trim_start_matches('/').to_string(),
        };
        if name.is_empty() || name.contains(|c: char| !c.is_alphanumeric() && c != '_' && c != '-') {
            return Err(BackupError::Config(format!("invalid PostgreSQL database name: {:?}", name)));
        }
        url.set_path(&format!("/{}", name));

        let password = match url.password() {
            Some(encoded) => {
                let password = urlencoding::decode(encoded)
                    .map_err(|e| {
                        BackupError::Config(format!("invalid password encoding in PostgreSQL URL: {}", e))
                    })?
                    .into_owned();
                url.set_password(None)
                    .map_err(|_| BackupError::Config("PostgreSQL URL cannot carry a password".to_string()))?;
                Some(password)
            }
            None => None,
        };

        Ok(Self {
            url,
            password,
            name,
            additional_options: options.additional_options,
        })
    }

    pub fn database_name(&self) -> &str {
        &self.name
    }

    fn dump_command(&self, pg_dump: &str, dump_path: &Path) -> String {
        let mut parts = vec![pg_dump.to_string()];
        parts.extend(self.additional_options.iter().cloned());
        parts.push(format!("--file={}", shell_quote(dump_path)));
        parts.push(quote_str(self.url.as_str()));
        parts.join(" ")
    }
}

#[async_trait]
impl Database for PostgreSql {
    fn name(&self) -> &str {
        ADAPTER
    }

    async fn perform(&self, workspace: &Path, toolbox: &Toolbox) -> Result<()> {
        let dump_dir = workspace.join(ADAPTER);
        tokio::fs::create_dir_all(&dump_dir).await?;
        let dump_path = dump_dir.join(format!("{}.sql", self.name));

        info!(
            database = %self.name,
            host = self.url.host_str().unwrap_or("localhost"),
            "dumping PostgreSQL database"
        );
        let pg_dump = toolbox.utility("pg_dump")?;
        let envs: Vec<(&str, &str)> = self
            .password
            .as_deref()
            .map(|password| ("PGPASSWORD", password))
            .into_iter()
            .collect();
        toolbox.run_with_env(&self.dump_command(&pg_dump, &dump_path), &envs).await
    }
}
