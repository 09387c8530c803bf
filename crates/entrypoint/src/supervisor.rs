//! Child process supervision with signal forwarding.
//!
//! The [`Supervisor`] owns the [`SignalSet`] and at most one tracked child:
//! first the ephemeral database instance (if any), then the final workload.
//! Every signal received while the supervisor is waiting, or while it drives
//! a future through [`Supervisor::forwarding`], is relayed to the tracked
//! child's pid.

use std::fmt;
use std::future::Future;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use dockhand_core::command::WorkloadCommand;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};

use crate::error::{EntrypointError, EntrypointResult};
use crate::signals::SignalSet;

/// Exit code reported when the child's status carries neither a code nor a
/// signal.
const UNKNOWN_EXIT_CODE: i32 = 1;

/// Shell exit code for a command that does not exist.
pub const COMMAND_NOT_FOUND_EXIT_CODE: i32 = 127;

/// Shell exit code for a command that exists but cannot be executed.
pub const COMMAND_NOT_EXECUTABLE_EXIT_CODE: i32 = 126;

/// Which stage of the entrypoint a supervised child belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildRole {
    /// Temporary, network-isolated database used to load SQL dumps.
    Ephemeral,
    /// The container's real workload.
    Workload,
}

impl fmt::Display for ChildRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ephemeral => write!(f, "ephemeral database"),
            Self::Workload => write!(f, "workload"),
        }
    }
}

#[derive(Debug)]
struct TrackedChild {
    child: Child,
    pid: u32,
    role: ChildRole,
}

#[derive(Debug)]
pub struct Supervisor {
    signals: SignalSet,
    child: Option<TrackedChild>,
}

impl Supervisor {
    pub fn new(signals: SignalSet) -> Self {
        Self {
            signals,
            child: None,
        }
    }

    /// Install signal handlers and build a supervisor with no child.
    pub fn install() -> EntrypointResult<Self> {
        Ok(Self::new(SignalSet::install()?))
    }

    /// Pid of the tracked child, if any.
    pub fn tracked_pid(&self) -> Option<u32> {
        self.child.as_ref().map(|tracked| tracked.pid)
    }

    /// Spawn `command` with inherited stdio and start tracking it.
    pub fn spawn(&mut self, command: &WorkloadCommand, role: ChildRole) -> EntrypointResult<u32> {
        if let Some(tracked) = &self.child {
            return Err(EntrypointError::ChildAlreadyTracked {
                role: tracked.role,
                pid: tracked.pid,
            });
        }

        let spawn_err = |source| EntrypointError::Spawn {
            program: command.program.to_string_lossy().into_owned(),
            source,
        };

        let child = Command::new(&command.program)
            .args(&command.args)
            .spawn()
            .map_err(spawn_err)?;
        let pid = child
            .id()
            .ok_or_else(|| spawn_err(std::io::Error::other("process exited before its pid was read")))?;

        tracing::info!(%role, pid, command = %command, "Started child process");
        self.child = Some(TrackedChild { child, pid, role });
        Ok(pid)
    }

    /// Relay `signal` to the tracked child. Returns whether it was delivered.
    ///
    /// Failures are logged and swallowed: the child may already have exited.
    pub fn forward(&self, signal: Signal) -> bool {
        forward_to(self.child.as_ref(), signal)
    }

    /// Drive `fut` to completion, forwarding every signal that arrives in the
    /// meantime.
    pub async fn forwarding<F: Future>(&mut self, fut: F) -> F::Output {
        tokio::pin!(fut);
        loop {
            tokio::select! {
                output = &mut fut => return output,
                signal = self.signals.recv() => {
                    forward_to(self.child.as_ref(), signal);
                }
            }
        }
    }

    /// Block until the tracked child exits, forwarding signals meanwhile, and
    /// return its exit code (`128 + N` when killed by signal N).
    pub async fn wait(&mut self) -> EntrypointResult<i32> {
        let tracked = self.child.as_mut().ok_or(EntrypointError::NoChild)?;
        let (pid, role) = (tracked.pid, tracked.role);

        let status = loop {
            tokio::select! {
                status = tracked.child.wait() => {
                    break status.map_err(|source| EntrypointError::Wait { role, pid, source })?;
                }
                signal = self.signals.recv() => {
                    deliver(pid, role, signal);
                }
            }
        };

        self.child = None;
        let code = exit_code(status);
        tracing::info!(%role, pid, exit_code = code, "Child process exited");
        Ok(code)
    }

    /// Send SIGTERM to the tracked child and wait for it to exit.
    ///
    /// Best effort: delivery and wait failures are logged, never returned.
    pub async fn terminate(&mut self) {
        let Some(mut tracked) = self.child.take() else {
            return;
        };

        deliver(tracked.pid, tracked.role, Signal::SIGTERM);
        match tracked.child.wait().await {
            Ok(status) => tracing::info!(
                role = %tracked.role,
                pid = tracked.pid,
                exit_code = exit_code(status),
                "Child process stopped",
            ),
            Err(e) => tracing::warn!(
                role = %tracked.role,
                pid = tracked.pid,
                error = %e,
                "Failed to wait for child process to stop",
            ),
        }
    }
}

fn forward_to(child: Option<&TrackedChild>, signal: Signal) -> bool {
    match child {
        Some(tracked) => deliver(tracked.pid, tracked.role, signal),
        None => {
            tracing::info!(signal = %signal, "Received signal with no child to forward to");
            false
        }
    }
}

fn deliver(pid: u32, role: ChildRole, signal: Signal) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(raw), signal) {
        Ok(()) => {
            tracing::info!(%role, pid, signal = %signal, "Forwarded signal");
            true
        }
        Err(errno) => {
            tracing::debug!(%role, pid, signal = %signal, error = %errno, "Signal forwarding failed");
            false
        }
    }
}

/// Map a child status to a shell-style exit code.
pub fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => UNKNOWN_EXIT_CODE,
    }
}

/// Shell-style exit code for a child that could not be started, if the
/// cause is a bad command rather than an entrypoint failure.
pub fn spawn_failure_exit_code(error: &std::io::Error) -> Option<i32> {
    match error.kind() {
        std::io::ErrorKind::NotFound => Some(COMMAND_NOT_FOUND_EXIT_CODE),
        std::io::ErrorKind::PermissionDenied => Some(COMMAND_NOT_EXECUTABLE_EXIT_CODE),
        _ => None,
    }
}
