//! Conditional SQL bootstrap.
//!
//! When SQL dumps were queued, they are loaded before the workload starts:
//!
//! * [`BootstrapPlan::Ephemeral`]: the workload is the database server
//!   itself. A temporary copy is started with networking disabled, the dumps
//!   are loaded into it, and it is stopped again before the real server
//!   launches.
//! * [`BootstrapPlan::External`]: the workload is something else. Dumps are
//!   loaded into a server that is expected to be reachable already (for
//!   example a sidecar), provided the client binary exists. Nothing is
//!   started or stopped.
//!
//! Load failures are per-file and never fatal. A readiness timeout abandons
//! the whole queue without retrying.

use std::fmt;

use dockhand_core::command::WorkloadCommand;
use dockhand_core::queue::{QueuedFile, SqlQueue};
use dockhand_core::retry::{RetryOutcome, RetryPolicy};

use crate::mysql::MysqlClient;
use crate::supervisor::{ChildRole, Supervisor};

/// Flag appended to the server command for the ephemeral instance.
pub const SKIP_NETWORKING_FLAG: &str = "--skip-networking";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPlan {
    /// Nothing queued.
    Skip,
    /// Load into a temporary instance of the workload server.
    Ephemeral,
    /// Load into an already running server.
    External,
}

impl BootstrapPlan {
    pub fn decide(workload: &WorkloadCommand, queue: &SqlQueue, server_bin: &str) -> Self {
        if queue.is_empty() {
            Self::Skip
        } else if workload.is_server(server_bin) {
            Self::Ephemeral
        } else {
            Self::External
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Idle,
    Starting,
    WaitingReady,
    LoadingQueue,
    TimedOut,
    Stopped,
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::WaitingReady => "waiting_ready",
            Self::LoadingQueue => "loading_queue",
            Self::TimedOut => "timed_out",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyQueue,
    /// External plan, but the SQL client is not installed.
    ClientMissing,
    /// The ephemeral instance could not be spawned.
    StartFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Skipped(SkipReason),
    /// The server never became ready; `abandoned` dumps were dropped.
    TimedOut { abandoned: usize },
    Loaded { loaded: usize, failed: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapReport {
    pub plan: BootstrapPlan,
    pub outcome: BootstrapOutcome,
}

#[derive(Debug)]
pub struct Bootstrapper {
    client: MysqlClient,
    readiness: RetryPolicy,
    server_bin: String,
    state: BootstrapState,
}

impl Bootstrapper {
    pub fn new(client: MysqlClient, readiness: RetryPolicy, server_bin: impl Into<String>) -> Self {
        Self {
            client,
            readiness,
            server_bin: server_bin.into(),
            state: BootstrapState::Idle,
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Consume `queue` according to the plan chosen for `workload`.
    ///
    /// The queue is always empty afterwards. Any ephemeral instance has been
    /// stopped and reaped by the time this returns.
    pub async fn run(
        &mut self,
        workload: &WorkloadCommand,
        queue: &mut SqlQueue,
        supervisor: &mut Supervisor,
    ) -> BootstrapReport {
        let plan = BootstrapPlan::decide(workload, queue, &self.server_bin);
        tracing::info!(?plan, queued = queue.len(), "SQL bootstrap plan selected");

        let outcome = match plan {
            BootstrapPlan::Skip => BootstrapOutcome::Skipped(SkipReason::EmptyQueue),
            BootstrapPlan::Ephemeral => self.run_ephemeral(workload, queue, supervisor).await,
            BootstrapPlan::External => self.run_external(queue, supervisor).await,
        };

        tracing::info!(?plan, ?outcome, "SQL bootstrap finished");
        BootstrapReport { plan, outcome }
    }

    async fn run_ephemeral(
        &mut self,
        workload: &WorkloadCommand,
        queue: &mut SqlQueue,
        supervisor: &mut Supervisor,
    ) -> BootstrapOutcome {
        self.transition(BootstrapState::Starting);
        let ephemeral = workload.with_arg(SKIP_NETWORKING_FLAG);
        if let Err(e) = supervisor.spawn(&ephemeral, ChildRole::Ephemeral) {
            let abandoned = queue.take().len();
            tracing::error!(error = %e, abandoned, "Could not start ephemeral database; skipping SQL load");
            self.transition(BootstrapState::Stopped);
            return BootstrapOutcome::Skipped(SkipReason::StartFailed);
        }

        let outcome = self.wait_and_load(queue, supervisor).await;

        supervisor.terminate().await;
        self.transition(BootstrapState::Stopped);
        outcome
    }

    async fn run_external(
        &mut self,
        queue: &mut SqlQueue,
        supervisor: &mut Supervisor,
    ) -> BootstrapOutcome {
        if !self.client.client_available() {
            let abandoned = queue.take().len();
            tracing::warn!(abandoned, "SQL client not found; skipping SQL load");
            return BootstrapOutcome::Skipped(SkipReason::ClientMissing);
        }

        tracing::info!("Workload is not the database server; loading into an existing server");
        let outcome = self.wait_and_load(queue, supervisor).await;
        self.transition(BootstrapState::Stopped);
        outcome
    }

    async fn wait_and_load(
        &mut self,
        queue: &mut SqlQueue,
        supervisor: &mut Supervisor,
    ) -> BootstrapOutcome {
        self.transition(BootstrapState::WaitingReady);
        let client = &self.client;
        let readiness = supervisor
            .forwarding(self.readiness.run(move |_| client.ping()))
            .await;

        let files = queue.take();
        match readiness {
            RetryOutcome::Ready { attempts } => {
                tracing::info!(attempts, "Database is ready");
                self.transition(BootstrapState::LoadingQueue);
                let client = &self.client;
                let (loaded, failed) = supervisor.forwarding(load_all(client, &files)).await;
                BootstrapOutcome::Loaded { loaded, failed }
            }
            RetryOutcome::Exhausted { attempts } => {
                self.transition(BootstrapState::TimedOut);
                tracing::error!(
                    attempts,
                    abandoned = files.len(),
                    "Database did not become ready; abandoning SQL load",
                );
                BootstrapOutcome::TimedOut {
                    abandoned: files.len(),
                }
            }
        }
    }

    fn transition(&mut self, next: BootstrapState) {
        tracing::debug!(from = %self.state, to = %next, "Bootstrap state change");
        self.state = next;
    }
}

/// Load every file in order. Returns `(loaded, failed)`.
async fn load_all(client: &MysqlClient, files: &[QueuedFile]) -> (usize, usize) {
    let (mut loaded, mut failed) = (0, 0);
    for file in files {
        match client.load(file).await {
            Ok(()) => {
                tracing::info!(file = %file.path.display(), "Loaded SQL file");
                loaded += 1;
            }
            Err(e) => {
                tracing::error!(file = %file.path.display(), error = %e, "Failed to load SQL file");
                failed += 1;
            }
        }
    }
    (loaded, failed)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use dockhand_core::classify::EntryKind;

    use super::*;

    fn workload(parts: &[&str]) -> WorkloadCommand {
        WorkloadCommand::from_args(parts.iter().map(|s| s.to_string()))
    }

    fn queue_of(names: &[&str]) -> SqlQueue {
        let mut queue = SqlQueue::new();
        for name in names {
            let kind = dockhand_core::classify::classify(Path::new(name));
            assert_ne!(kind, EntryKind::Other);
            queue.push(QueuedFile::from_kind(Path::new(name), kind).expect("sql file"));
        }
        queue
    }

    #[test]
    fn plan_skips_empty_queue() {
        let plan = BootstrapPlan::decide(&workload(&["mysqld"]), &SqlQueue::new(), "mysqld");
        assert_eq!(plan, BootstrapPlan::Skip);
    }

    #[test]
    fn plan_ephemeral_for_server_workload() {
        let plan = BootstrapPlan::decide(
            &workload(&["/usr/sbin/mysqld", "--user=mysql"]),
            &queue_of(&["a.sql"]),
            "mysqld",
        );
        assert_eq!(plan, BootstrapPlan::Ephemeral);
    }

    #[test]
    fn plan_external_for_other_workload() {
        let plan = BootstrapPlan::decide(&workload(&["php-fpm"]), &queue_of(&["a.sql.gz"]), "mysqld");
        assert_eq!(plan, BootstrapPlan::External);
    }

    #[tokio::test]
    async fn empty_queue_leaves_state_idle() {
        let mut supervisor = Supervisor::install().expect("install");
        let mut bootstrapper = Bootstrapper::new(
            MysqlClient::new("mysql", "mysqladmin", None),
            RetryPolicy::default(),
            "mysqld",
        );
        let report = bootstrapper
            .run(&workload(&["mysqld"]), &mut SqlQueue::new(), &mut supervisor)
            .await;
        assert_eq!(report.outcome, BootstrapOutcome::Skipped(SkipReason::EmptyQueue));
        assert_eq!(bootstrapper.state(), BootstrapState::Idle);
        assert_eq!(supervisor.tracked_pid(), None);
    }

    #[tokio::test]
    async fn external_without_client_abandons_queue() {
        let mut supervisor = Supervisor::install().expect("install");
        let mut queue = queue_of(&["a.sql", "b.sql.gz"]);
        let mut bootstrapper = Bootstrapper::new(
            MysqlClient::new("dockhand-no-such-client", "mysqladmin", None),
            RetryPolicy::default(),
            "mysqld",
        );
        let report = bootstrapper
            .run(&workload(&["nginx"]), &mut queue, &mut supervisor)
            .await;
        assert_eq!(report.plan, BootstrapPlan::External);
        assert_eq!(report.outcome, BootstrapOutcome::Skipped(SkipReason::ClientMissing));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn ephemeral_start_failure_abandons_queue() {
        let mut supervisor = Supervisor::install().expect("install");
        let mut queue = queue_of(&["a.sql"]);
        let mut bootstrapper = Bootstrapper::new(
            MysqlClient::new("mysql", "mysqladmin", None),
            RetryPolicy::default(),
            "mysqld",
        );
        let report = bootstrapper
            .run(&workload(&["/nonexistent/mysqld"]), &mut queue, &mut supervisor)
            .await;
        assert_eq!(report.plan, BootstrapPlan::Ephemeral);
        assert_eq!(report.outcome, BootstrapOutcome::Skipped(SkipReason::StartFailed));
        assert_eq!(bootstrapper.state(), BootstrapState::Stopped);
        assert!(queue.is_empty());
    }
}
