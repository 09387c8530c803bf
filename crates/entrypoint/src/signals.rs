//! Termination signals relayed to the supervised child.
//!
//! Registering a tokio signal stream replaces the default disposition, so
//! once a [`SignalSet`] exists the entrypoint itself no longer dies on
//! SIGINT, SIGTERM, SIGHUP or SIGQUIT; it only relays them.

use nix::sys::signal::Signal;
use tokio::signal::unix::{signal, SignalKind};

use crate::error::{EntrypointError, EntrypointResult};

/// Notification streams for SIGINT, SIGTERM, SIGHUP and SIGQUIT.
#[derive(Debug)]
pub struct SignalSet {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
}

impl SignalSet {
    /// Register handlers for all forwarded signals.
    ///
    /// Must be called from within a tokio runtime.
    pub fn install() -> EntrypointResult<Self> {
        let register = |kind| signal(kind).map_err(EntrypointError::Signals);
        Ok(Self {
            interrupt: register(SignalKind::interrupt())?,
            terminate: register(SignalKind::terminate())?,
            hangup: register(SignalKind::hangup())?,
            quit: register(SignalKind::quit())?,
        })
    }

    /// Wait for the next forwarded signal.
    ///
    /// Deliveries that arrive while nobody is waiting are coalesced per
    /// signal and reported on the next call.
    pub async fn recv(&mut self) -> Signal {
        tokio::select! {
            _ = self.interrupt.recv() => Signal::SIGINT,
            _ = self.terminate.recv() => Signal::SIGTERM,
            _ = self.hangup.recv() => Signal::SIGHUP,
            _ = self.quit.recv() => Signal::SIGQUIT,
        }
    }
}
