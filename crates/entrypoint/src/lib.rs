//! `dockhand-entrypoint` library crate.
//!
//! The container entrypoint pipeline. [`run`] executes it once, top to
//! bottom: directories, init scripts, entrypoint directory scan, SQL
//! bootstrap, then the supervised workload. The binary in `main.rs` only
//! wires up logging and configuration.

pub mod bootstrap;
pub mod collect;
pub mod error;
pub mod init;
pub mod mysql;
pub mod scripts;
pub mod signals;
pub mod supervisor;

use dockhand_core::command::WorkloadCommand;
use dockhand_core::config::EntrypointConfig;

use crate::bootstrap::Bootstrapper;
use crate::error::{EntrypointError, EntrypointResult};
use crate::mysql::MysqlClient;
use crate::scripts::ScriptRunner;
use crate::supervisor::{spawn_failure_exit_code, ChildRole, Supervisor};

/// Run the entrypoint and return the workload's exit code.
///
/// A workload that cannot be started because the program is missing or not
/// executable yields 127 or 126, as a shell would.
///
/// Signal handlers are installed first. Signals received before the
/// workload exists are relayed to the ephemeral database if one is running,
/// and dropped otherwise.
pub async fn run(config: &EntrypointConfig, workload: WorkloadCommand) -> EntrypointResult<i32> {
    let mut supervisor = Supervisor::install()?;

    let dirs = supervisor
        .forwarding(init::prepare_directories(&config.init_dirs))
        .await?;
    tracing::debug!(created = dirs.created.len(), chown_failed = dirs.chown_failed.len(), "Directories prepared");

    let runner = ScriptRunner::new(config.script_shell.as_str());
    let executed = supervisor
        .forwarding(scripts::run_init_scripts(&runner, &config.init_scripts_dir))
        .await?;
    tracing::info!(executed, dir = %config.init_scripts_dir.display(), "Init scripts complete");

    let mut queue = supervisor
        .forwarding(collect::collect_entrypoint_dir(&runner, &config.entrypoint_dir))
        .await?;

    let mut bootstrapper = Bootstrapper::new(
        MysqlClient::from_config(&config.database),
        config.database.readiness,
        config.database.server_bin.as_str(),
    );
    bootstrapper.run(&workload, &mut queue, &mut supervisor).await;

    match supervisor.spawn(&workload, ChildRole::Workload) {
        Ok(_) => supervisor.wait().await,
        Err(EntrypointError::Spawn { program, source }) => match spawn_failure_exit_code(&source) {
            Some(code) => {
                tracing::error!(%program, error = %source, exit_code = code, "Workload could not be started");
                Ok(code)
            }
            None => Err(EntrypointError::Spawn { program, source }),
        },
        Err(e) => Err(e),
    }
}
