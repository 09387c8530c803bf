//! Thin wrapper over the database command-line tools.
//!
//! Readiness is probed with `mysqladmin ping`; dumps are loaded by streaming
//! them into `mysql` on stdin. Gzip dumps go through `gzip -dc` piped into
//! the client. The root password, when configured, travels in the client's
//! `MYSQL_PWD` environment so it never shows up in the process list.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use dockhand_core::config::DatabaseConfig;
use dockhand_core::queue::{Compression, QueuedFile};
use tokio::process::Command;

use crate::supervisor::exit_code;

const ROOT_USER_ARG: &str = "-uroot";
const PASSWORD_ENV: &str = "MYSQL_PWD";
const GZIP_BIN: &str = "gzip";

/// Errors from loading a single dump. Never fatal for the entrypoint.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while loading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decompressing {} failed with exit code {exit_code}", path.display())]
    DecompressFailed { path: PathBuf, exit_code: i32 },

    #[error("client rejected {} with exit code {exit_code}", path.display())]
    ClientFailed { path: PathBuf, exit_code: i32 },
}

#[derive(Debug, Clone)]
pub struct MysqlClient {
    client_bin: String,
    admin_bin: String,
    root_password: Option<String>,
}

impl MysqlClient {
    pub fn new(
        client_bin: impl Into<String>,
        admin_bin: impl Into<String>,
        root_password: Option<String>,
    ) -> Self {
        Self {
            client_bin: client_bin.into(),
            admin_bin: admin_bin.into(),
            root_password,
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(
            config.client_bin.clone(),
            config.admin_bin.clone(),
            config.root_password.clone(),
        )
    }

    /// Whether the SQL client can be found (on `PATH`, or at the given path).
    pub fn client_available(&self) -> bool {
        which::which(&self.client_bin).is_ok()
    }

    /// Root-authenticated command for one of the database tools.
    fn command(&self, program: &str) -> Command {
        let mut cmd = Command::new(program);
        cmd.arg(ROOT_USER_ARG);
        match &self.root_password {
            Some(password) => cmd.env(PASSWORD_ENV, password),
            None => cmd.env_remove(PASSWORD_ENV),
        };
        cmd
    }

    /// One readiness probe. Any failure, including a missing binary, counts
    /// as "not ready".
    pub async fn ping(&self) -> bool {
        let status = self
            .command(&self.admin_bin)
            .args(["ping", "--silent"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;

        match status {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::debug!(program = %self.admin_bin, error = %e, "Readiness probe could not run");
                false
            }
        }
    }

    /// Load one queued dump.
    pub async fn load(&self, file: &QueuedFile) -> Result<(), LoadError> {
        match file.compression {
            Compression::Plain => self.load_plain(&file.path).await,
            Compression::Gzip => self.load_gzip(&file.path).await,
        }
    }

    async fn load_plain(&self, path: &Path) -> Result<(), LoadError> {
        let input = std::fs::File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let status = self
            .command(&self.client_bin)
            .stdin(Stdio::from(input))
            .status()
            .await
            .map_err(|source| LoadError::Spawn {
                program: self.client_bin.clone(),
                source,
            })?;

        if !status.success() {
            return Err(LoadError::ClientFailed {
                path: path.to_path_buf(),
                exit_code: exit_code(status),
            });
        }
        Ok(())
    }

    async fn load_gzip(&self, path: &Path) -> Result<(), LoadError> {
        if !path.is_file() {
            return Err(LoadError::Open {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }

        let mut decompress = Command::new(GZIP_BIN)
            .arg("-dc")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LoadError::Spawn {
                program: GZIP_BIN.to_string(),
                source,
            })?;

        let io_err = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let pipe: Stdio = decompress
            .stdout
            .take()
            .ok_or_else(|| io_err(std::io::Error::other("decompressor stdout not captured")))?
            .try_into()
            .map_err(io_err)?;

        let mut client = self
            .command(&self.client_bin)
            .stdin(pipe)
            .spawn()
            .map_err(|source| LoadError::Spawn {
                program: self.client_bin.clone(),
                source,
            })?;

        let (decompress_status, client_status) = tokio::join!(decompress.wait(), client.wait());
        let decompress_status = decompress_status.map_err(io_err)?;
        let client_status = client_status.map_err(io_err)?;

        if !decompress_status.success() {
            return Err(LoadError::DecompressFailed {
                path: path.to_path_buf(),
                exit_code: exit_code(decompress_status),
            });
        }
        if !client_status.success() {
            return Err(LoadError::ClientFailed {
                path: path.to_path_buf(),
                exit_code: exit_code(client_status),
            });
        }
        Ok(())
    }
}
