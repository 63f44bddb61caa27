//! TCP Server
//!
//! Accepts connections and gives each one its own session thread.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::{MockConfig, RunOptions};
use crate::control::{ControlHandle, RunController, RunSignal};
use crate::dump::DumpSink;
use crate::error::{MockError, Result};
use super::connection::{ServerSession, SessionEnd};
use super::resolve;

/// How a server run ended without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerExit {
    /// A session answered a `bye_packet` item
    ByePacket { session: u64 },

    /// Accepting failed and every running session has finished
    AcceptStopped,
}

/// TCP server replaying the script to every connection
pub struct Server {
    config: Arc<MockConfig>,
    listener: TcpListener,
    dump: DumpSink,
    capacity: usize,
    poll_interval: Duration,
    controller: RunController,
}

impl Server {
    /// Resolve and bind once; no retry
    pub fn bind(config: &MockConfig, options: &RunOptions) -> Result<Self> {
        let addr = resolve(&config.addr())?;
        let listener = TcpListener::bind(addr)
            .map_err(|e| MockError::Network(format!("cannot listen on {}: {}", addr, e)))?;

        let dump = DumpSink::create(&options.dump_root, config.dump_request)?;
        tracing::info!("Listening: {}", listener.local_addr()?);

        Ok(Self {
            config: Arc::new(config.clone()),
            listener,
            dump,
            capacity: options.buffer_capacity,
            poll_interval: options.accept_poll_interval,
            controller: RunController::new(),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn dump(&self) -> &DumpSink {
        &self.dump
    }

    /// Serve until a bye packet, a fatal script error, or the end of accepting
    pub fn run(self) -> Result<ServerExit> {
        let Server {
            config,
            listener,
            dump,
            capacity,
            poll_interval,
            controller,
        } = self;

        listener.set_nonblocking(true)?;

        let handle = controller.handle();
        let acceptor = thread::Builder::new()
            .name("mocktcp-accept".to_string())
            .spawn(move || accept_loop(listener, config, dump, capacity, poll_interval, handle))?;

        let mut accept_stopped = false;
        let outcome = loop {
            match controller.wait() {
                RunSignal::ByePacket { session } => break Ok(ServerExit::ByePacket { session }),
                RunSignal::Fatal(e) => break Err(e),
                RunSignal::AcceptStopped => {
                    accept_stopped = true;
                    if controller.registry().is_empty() {
                        break Ok(ServerExit::AcceptStopped);
                    }
                    tracing::info!(
                        "Accept loop ended; waiting for {} session(s)",
                        controller.registry().len()
                    );
                }
                RunSignal::SessionClosed { .. } => {
                    if accept_stopped && controller.registry().is_empty() {
                        break Ok(ServerExit::AcceptStopped);
                    }
                }
            }
        };

        controller.shutdown();
        if acceptor.join().is_err() {
            tracing::warn!("Accept thread panicked");
        }

        outcome
    }
}

fn accept_loop(
    listener: TcpListener,
    config: Arc<MockConfig>,
    dump: DumpSink,
    capacity: usize,
    poll_interval: Duration,
    handle: ControlHandle,
) {
    loop {
        if handle.is_shutdown() {
            tracing::debug!("Accept loop stopping on shutdown");
            return;
        }

        match listener.accept() {
            Ok((stream, peer)) => {
                let session = handle.next_session();
                tracing::info!("[{}] client connected: {}", session, peer);
                spawn_session(stream, session, &config, &dump, capacity, &handle);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(poll_interval),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::error!("Accept failed: {}", e);
                handle.signal(RunSignal::AcceptStopped);
                return;
            }
        }
    }
}

fn spawn_session(
    stream: TcpStream,
    session: u64,
    config: &Arc<MockConfig>,
    dump: &DumpSink,
    capacity: usize,
    handle: &ControlHandle,
) {
    // Accepted sockets may inherit the listener's non-blocking mode
    if let Err(e) = stream.set_nonblocking(false) {
        tracing::warn!("[{}] cannot switch to blocking mode: {}", session, e);
        return;
    }
    if let Err(e) = stream.set_nodelay(true) {
        tracing::warn!("[{}] cannot disable Nagle: {}", session, e);
    }
    if let Err(e) = handle.registry().register(session, &stream) {
        tracing::warn!("[{}] cannot track connection: {}", session, e);
    }

    let config = Arc::clone(config);
    let dump = dump.clone();
    let worker = handle.clone();

    let spawned = thread::Builder::new()
        .name(format!("mocktcp-session-{}", session))
        .spawn(move || {
            let mut session_loop =
                ServerSession::new(stream, session, &config.requests, &dump, capacity);

            match session_loop.run() {
                SessionEnd::PeerClosed => tracing::info!("[{}] connection closed", session),
                SessionEnd::ReadFailed(e) => tracing::warn!("[{}] read failed: {}", session, e),
                SessionEnd::WriteFailed(e) => tracing::warn!("[{}] write failed: {}", session, e),
                SessionEnd::ByePacket => worker.signal(RunSignal::ByePacket { session }),
                SessionEnd::Fatal(e) => {
                    tracing::error!("[{}] invalid script item: {}", session, e);
                    worker.signal(RunSignal::Fatal(e));
                }
            }

            // The registry holds a clone of the socket; it closes once both are gone
            drop(session_loop);
            worker.registry().deregister(session);
            worker.signal(RunSignal::SessionClosed { session });
        });

    if let Err(e) = spawned {
        tracing::error!("[{}] cannot spawn session thread: {}", session, e);
        handle.registry().deregister(session);
    }
}
