//! `dockhand` -- container entrypoint and PID 1 supervisor.
//!
//! Prepares directories, runs init scripts, optionally loads SQL dumps into
//! the database, then runs the command given as arguments (an interactive
//! shell when there are none) and exits with its exit code.
//!
//! # Environment variables
//!
//! | Variable              | Required | Default | Description                               |
//! |-----------------------|----------|---------|-------------------------------------------|
//! | `INIT_DIRS`           | no       | --      | Colon-separated directories to create     |
//! | `INIT_OWNER`          | no       | --      | `user[:group]` applied with `chown -R`    |
//! | `MYSQL_ROOT_PASSWORD` | no       | --      | Root password for the readiness probe and loader |
//!
//! See [`dockhand_core::config::EntrypointConfig::from_env`] for the rest.

use dockhand_core::command::WorkloadCommand;
use dockhand_core::config::EntrypointConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit code used when the entrypoint itself fails before or while
/// supervising the workload.
const FAILURE_EXIT_CODE: i32 = 1;

const DEFAULT_LOG_FILTER: &str = "dockhand=info,dockhand_entrypoint=info,dockhand_core=info";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EntrypointConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(FAILURE_EXIT_CODE);
    });

    let workload = WorkloadCommand::from_args(std::env::args_os().skip(1));
    tracing::info!(command = %workload, "Starting dockhand");

    let code = match dockhand_entrypoint::run(&config, workload).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Entrypoint failed");
            FAILURE_EXIT_CODE
        }
    };

    std::process::exit(code);
}
