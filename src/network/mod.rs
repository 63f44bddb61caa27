//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Server: single acceptor thread, one thread per accepted connection,
//!   every session matching against the same read-only script
//! - Client: one connection driven through the script synchronously
//! - Fatal conditions are reported to a [`RunController`](crate::control::RunController)
//!   instead of exiting from worker threads

mod client;
mod connection;
mod server;

pub use client::{Client, ClientScript, ScriptReport, ALL_MATCHED, NO_MATCH};
pub use connection::{first_match, ServerSession, SessionEnd, NOTHING_MATCHED};
pub use server::{Server, ServerExit};

use std::net::{SocketAddr, ToSocketAddrs};

use crate::error::{MockError, Result};

/// Resolve `host:port`, preferring an IPv4 address
pub fn resolve(addr: &str) -> Result<SocketAddr> {
    let candidates: Vec<SocketAddr> = addr
        .to_socket_addrs()
        .map_err(|e| MockError::Network(format!("cannot resolve {}: {}", addr, e)))?
        .collect();

    candidates
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| candidates.first())
        .copied()
        .ok_or_else(|| MockError::Network(format!("no address found for {}", addr)))
}
