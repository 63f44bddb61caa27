//! Run Controller
//!
//! Sessions never exit the process themselves. When a session decides the
//! run is over (a bye packet was answered, or the script turned out to be
//! invalid) it sends a [`RunSignal`] to the controller, and the top level
//! decides and performs the shutdown:
//!
//! ```text
//!   session ──┐
//!   session ──┼── RunSignal ──► RunController::wait() ──► shutdown()
//!   accept  ──┘                                              ├─ stop accept loop
//!                                                            └─ close live sockets
//! ```

use std::collections::HashMap;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use crate::error::{MockError, Result};

// =============================================================================
// Session Ids
// =============================================================================

/// Process-wide "next id" capability
///
/// Ids start at 1 and are unique and increasing at the time of assignment.
#[derive(Debug, Clone, Default)]
pub struct SessionIds {
    last: Arc<AtomicU64>,
}

impl SessionIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next session id
    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }
}

// =============================================================================
// Connection Registry
// =============================================================================

/// Live server connections, so shutdown can close them
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    streams: Arc<Mutex<HashMap<u64, TcpStream>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a connection under its session id
    pub fn register(&self, session: u64, stream: &TcpStream) -> Result<()> {
        let handle = stream.try_clone()?;
        self.streams.lock().insert(session, handle);
        Ok(())
    }

    /// Forget a connection whose session has ended on its own
    pub fn deregister(&self, session: u64) {
        self.streams.lock().remove(&session);
    }

    /// Number of tracked connections
    pub fn len(&self) -> usize {
        self.streams.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shut down every tracked connection, returning how many were closed
    pub fn close_all(&self) -> usize {
        let drained: Vec<(u64, TcpStream)> = self.streams.lock().drain().collect();

        for (session, stream) in &drained {
            let peer = stream
                .peer_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            tracing::debug!("[{}] closing connection {}", session, peer);
            // The peer may already be gone
            let _ = stream.shutdown(Shutdown::Both);
        }

        drained.len()
    }
}

// =============================================================================
// Run Signals
// =============================================================================

/// Events workers report to the controller
#[derive(Debug)]
pub enum RunSignal {
    /// A session answered an item flagged `bye_packet`
    ByePacket { session: u64 },

    /// A session hit an error that invalidates the whole run
    Fatal(MockError),

    /// The accept loop ended; no new sessions will start
    AcceptStopped,

    /// A session ended on its own and left the registry
    SessionClosed { session: u64 },
}

/// Top-level owner of the shutdown decision
pub struct RunController {
    tx: Sender<RunSignal>,
    rx: Receiver<RunSignal>,
    shutdown: Arc<AtomicBool>,
    ids: SessionIds,
    registry: ConnectionRegistry,
}

impl RunController {
    pub fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self {
            tx,
            rx,
            shutdown: Arc::new(AtomicBool::new(false)),
            ids: SessionIds::new(),
            registry: ConnectionRegistry::new(),
        }
    }

    /// Capability handed to worker threads
    pub fn handle(&self) -> ControlHandle {
        ControlHandle {
            tx: self.tx.clone(),
            shutdown: Arc::clone(&self.shutdown),
            ids: self.ids.clone(),
            registry: self.registry.clone(),
        }
    }

    /// Block until the next worker signal
    pub fn wait(&self) -> RunSignal {
        // The controller keeps its own sender, so the channel never disconnects
        self.rx.recv().unwrap_or(RunSignal::AcceptStopped)
    }

    /// Stop accepting and close every live connection
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let closed = self.registry.close_all();
        tracing::debug!("Shutdown closed {} connection(s)", closed);
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }
}

impl Default for RunController {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker-side view of the controller
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: Sender<RunSignal>,
    shutdown: Arc<AtomicBool>,
    ids: SessionIds,
    registry: ConnectionRegistry,
}

impl ControlHandle {
    /// Allocate an id for a new session
    pub fn next_session(&self) -> u64 {
        self.ids.next()
    }

    /// Report an event to the controller
    pub fn signal(&self, event: RunSignal) {
        // Only fails once the controller is gone, at which point nobody is listening
        let _ = self.tx.send(event);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }
}
