// src/supervisor/hook.rs

//! Stop supervised servers when the host process is asked to terminate.
//!
//! Supervisors register here right after spawning. One listener task per
//! process waits for Ctrl-C (and SIGTERM on Unix); when it fires, every
//! registered supervisor is stopped through the same path as an explicit
//! `stop()`.
//!
//! Exiting the host afterwards is opt-in ([`exit_on_termination`]): an
//! embedding application keeps its own shutdown sequence unless it asks for
//! `128 + signal`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::state::StopTrigger;
use super::Supervisor;

const SIGINT: i32 = 2;
#[cfg(unix)]
const SIGTERM: i32 = 15;

static REGISTRY: OnceLock<HookRegistry> = OnceLock::new();
static EXIT_ON_TERMINATION: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Default)]
struct HookRegistry {
    entries: Mutex<HashMap<u64, Weak<Supervisor>>>,
    next_id: AtomicU64,
    listener: Mutex<Option<JoinHandle<()>>>,
}

fn registry() -> &'static HookRegistry {
    REGISTRY.get_or_init(HookRegistry::default)
}

impl HookRegistry {
    fn insert(&self, supervisor: Weak<Supervisor>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, supervisor);
        self.ensure_listener();
        id
    }

    fn remove(&self, id: u64) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Take every entry whose supervisor is still alive.
    fn drain_live(&self) -> Vec<Arc<Supervisor>> {
        let entries = std::mem::take(&mut *self.entries.lock().unwrap_or_else(|e| e.into_inner()));
        entries.into_values().filter_map(|w| w.upgrade()).collect()
    }

    /// Spawn the signal listener unless one is already running.
    ///
    /// A listener dies with the runtime it was spawned on, so a finished
    /// handle is replaced.
    fn ensure_listener(&self) {
        let mut listener = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        let running = listener.as_ref().is_some_and(|h| !h.is_finished());
        if !running {
            *listener = Some(tokio::spawn(listen_for_termination()));
            debug!("termination hook listener started");
        }
    }
}

/// Registration of one supervisor with the termination hook.
///
/// Dropping it unregisters the supervisor.
#[derive(Debug)]
pub struct TerminationHook {
    id: u64,
}

impl TerminationHook {
    /// Must be called from within a Tokio runtime.
    pub fn register(supervisor: &Arc<Supervisor>) -> Self {
        let id = registry().insert(Arc::downgrade(supervisor));
        debug!(id, "registered termination hook");
        Self { id }
    }
}

impl Drop for TerminationHook {
    fn drop(&mut self) {
        registry().remove(self.id);
        debug!(id = self.id, "unregistered termination hook");
    }
}

/// Number of supervisors currently registered.
pub fn registered_hooks() -> usize {
    registry().len()
}

/// Exit the host with `128 + signal` once the termination hook has stopped
/// every supervisor. Off by default.
pub fn exit_on_termination(enabled: bool) {
    EXIT_ON_TERMINATION.store(enabled, Ordering::SeqCst);
}

/// Stop every registered supervisor that is still alive, as the termination
/// hook does. Returns how many were stopped without error.
pub async fn stop_registered() -> usize {
    let supervisors = registry().drain_live();
    let mut stopped = 0;

    for supervisor in supervisors {
        match supervisor.shutdown(StopTrigger::TerminationSignal).await {
            Ok(()) => stopped += 1,
            Err(e) => {
                error!(port = supervisor.port(), error = %e, "stopping server on termination failed")
            }
        }
    }
    stopped
}

async fn listen_for_termination() {
    let Some(signal) = wait_for_termination_signal().await else {
        return;
    };

    warn!(
        signal,
        supervisors = registered_hooks(),
        "termination signal received; stopping supervised servers"
    );
    let stopped = stop_registered().await;

    if EXIT_ON_TERMINATION.load(Ordering::SeqCst) {
        info!(signal, stopped, "supervised servers stopped; exiting");
        std::process::exit(128 + signal);
    }
    info!(signal, stopped, "supervised servers stopped");
}

#[cfg(unix)]
async fn wait_for_termination_signal() -> Option<i32> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(error = %e, "failed to listen for SIGTERM");
            None
        }
    };

    let sigterm = async {
        match terminate.as_mut() {
            Some(s) => s.recv().await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => match res {
            Ok(()) => Some(SIGINT),
            Err(e) => {
                error!(error = %e, "failed to listen for Ctrl+C");
                None
            }
        },
        Some(()) = sigterm => Some(SIGTERM),
    }
}

#[cfg(not(unix))]
async fn wait_for_termination_signal() -> Option<i32> {
    match tokio::signal::ctrl_c().await {
        Ok(()) => Some(SIGINT),
        Err(e) => {
            error!(error = %e, "failed to listen for Ctrl+C");
            None
        }
    }
}
