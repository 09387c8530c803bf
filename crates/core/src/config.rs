use std::path::PathBuf;
use std::time::Duration;

use crate::dirs::{DirectorySpec, OwnerSpec};
use crate::error::CoreError;
use crate::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};

pub const DEFAULT_INIT_SCRIPTS_DIR: &str = "/docker-entrypoint-init.d";
pub const DEFAULT_ENTRYPOINT_DIR: &str = "/entrypoint.d";
pub const DEFAULT_SERVER_BIN: &str = "mysqld";
pub const DEFAULT_CLIENT_BIN: &str = "mysql";
pub const DEFAULT_ADMIN_BIN: &str = "mysqladmin";
pub const DEFAULT_SCRIPT_SHELL: &str = "bash";

/// Database binaries and credentials used by the SQL bootstrapper.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Executable name matched against the workload program (`mysqld`).
    pub server_bin: String,
    /// SQL client that reads statements on stdin (`mysql`).
    pub client_bin: String,
    /// Administrative tool used for the readiness ping (`mysqladmin`).
    pub admin_bin: String,
    /// Root password; `None` means passwordless root.
    pub root_password: Option<String>,
    /// Readiness wait budget.
    pub readiness: RetryPolicy,
}

/// Entrypoint configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EntrypointConfig {
    /// Directories to create at startup (`INIT_DIRS` / `INIT_OWNER`).
    pub init_dirs: DirectorySpec,
    /// Directory of fatal-on-error init scripts.
    pub init_scripts_dir: PathBuf,
    /// Directory of scripts and SQL dumps.
    pub entrypoint_dir: PathBuf,
    /// Interpreter for `.sh` files.
    pub script_shell: String,
    pub database: DatabaseConfig,
}

impl EntrypointConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                        | Default                      |
    /// |--------------------------------|------------------------------|
    /// | `INIT_DIRS`                    | (empty)                      |
    /// | `INIT_OWNER`                   | (unset)                      |
    /// | `MYSQL_ROOT_PASSWORD`          | (unset)                      |
    /// | `DOCKHAND_INIT_SCRIPTS_DIR`    | `/docker-entrypoint-init.d`  |
    /// | `DOCKHAND_ENTRYPOINT_DIR`      | `/entrypoint.d`              |
    /// | `DOCKHAND_READY_ATTEMPTS`      | `30`                         |
    /// | `DOCKHAND_READY_INTERVAL_SECS` | `1`                          |
    /// | `DOCKHAND_SERVER_BIN`          | `mysqld`                     |
    /// | `DOCKHAND_CLIENT_BIN`          | `mysql`                      |
    /// | `DOCKHAND_ADMIN_BIN`           | `mysqladmin`                 |
    /// | `DOCKHAND_SCRIPT_SHELL`        | `bash`                       |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default = |key: &str, default: &str| non_empty(key).unwrap_or_else(|| default.into());

        let owner = non_empty("INIT_OWNER")
            .map(|raw| raw.parse::<OwnerSpec>())
            .transpose()?;
        let init_dirs = DirectorySpec::parse(&lookup("INIT_DIRS").unwrap_or_default(), owner);

        let max_attempts = match non_empty("DOCKHAND_READY_ATTEMPTS") {
            Some(raw) => parse_number::<u32>("DOCKHAND_READY_ATTEMPTS", &raw)?,
            None => DEFAULT_MAX_ATTEMPTS,
        };
        if max_attempts == 0 {
            return Err(CoreError::InvalidConfig {
                key: "DOCKHAND_READY_ATTEMPTS",
                message: "must be at least 1".into(),
            });
        }
        let interval_secs = match non_empty("DOCKHAND_READY_INTERVAL_SECS") {
            Some(raw) => parse_number::<u64>("DOCKHAND_READY_INTERVAL_SECS", &raw)?,
            None => 1,
        };

        // An empty password is still a password: the variable being set is
        // what selects the credential.
        let root_password = lookup("MYSQL_ROOT_PASSWORD");

        Ok(Self {
            init_dirs,
            init_scripts_dir: PathBuf::from(or_default(
                "DOCKHAND_INIT_SCRIPTS_DIR",
                DEFAULT_INIT_SCRIPTS_DIR,
            )),
            entrypoint_dir: PathBuf::from(or_default(
                "DOCKHAND_ENTRYPOINT_DIR",
                DEFAULT_ENTRYPOINT_DIR,
            )),
            script_shell: or_default("DOCKHAND_SCRIPT_SHELL", DEFAULT_SCRIPT_SHELL),
            database: DatabaseConfig {
                server_bin: or_default("DOCKHAND_SERVER_BIN", DEFAULT_SERVER_BIN),
                client_bin: or_default("DOCKHAND_CLIENT_BIN", DEFAULT_CLIENT_BIN),
                admin_bin: or_default("DOCKHAND_ADMIN_BIN", DEFAULT_ADMIN_BIN),
                root_password,
                readiness: RetryPolicy::new(max_attempts, Duration::from_secs(interval_secs)),
            },
        })
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, CoreError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| CoreError::InvalidConfig {
            key,
            message: format!("'{raw}': {e}"),
        })
}
