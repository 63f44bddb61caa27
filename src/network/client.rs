//! Client Script Driver
//!
//! Walks the script in order, one round-trip per item:
//!
//! ```text
//!   item i: write(request) ──► read once ──► contains(response)?
//!              │                               ├─ yes: item i+1
//!              └─ error: abort                 └─ no:  "no match." + abort
//! ```

use std::io::{self, Read, Write};
use std::net::TcpStream;

use crate::config::{MockConfig, RequestItem, RunOptions};
use crate::control::SessionIds;
use crate::dump::DumpSink;
use crate::error::{MockError, Result};
use crate::protocol::{encode, encode_hex, matches};
use super::resolve;

/// Marker printed once every item matched
pub const ALL_MATCHED: &str = "all requests matched.";

/// Marker printed when a response does not contain what the script expects
pub const NO_MATCH: &str = "no match.";

/// Summary of a fully matched script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptReport {
    /// Session id the run was logged and dumped under
    pub session: u64,

    /// Number of completed round-trips
    pub exchanges: usize,
}

/// Drives an ordered script over any byte stream
pub struct ClientScript<'a> {
    items: &'a [RequestItem],
    dump: &'a DumpSink,
    capacity: usize,
}

impl<'a> ClientScript<'a> {
    pub fn new(items: &'a [RequestItem], dump: &'a DumpSink, capacity: usize) -> Self {
        Self {
            items,
            dump,
            capacity: capacity.max(1),
        }
    }

    /// Run every item in order against `stream`
    ///
    /// Stops at the first error or mismatch; later items are never sent.
    pub fn run<S: Read + Write>(&self, stream: &mut S, session: u64) -> Result<ScriptReport> {
        let mut buf = vec![0u8; self.capacity];

        for (index, item) in self.items.iter().enumerate() {
            let request = encode(&item.request_type, &item.request_data)?;

            let sent = stream.write(&request)?;
            if sent < request.len() {
                return Err(MockError::Network(format!(
                    "short write: {} of {} bytes",
                    sent,
                    request.len()
                )));
            }
            tracing::info!("[{}] sent {} bytes", session, sent);

            let received = loop {
                match stream.read(&mut buf) {
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    other => break other?,
                }
            };
            if received == 0 {
                return Err(MockError::Network(
                    "connection closed by peer before response".to_string(),
                ));
            }
            let response = &buf[..received];
            tracing::info!("[{}] received {} bytes", session, received);
            tracing::trace!("[{}] payload {}", session, encode_hex(response));

            self.dump.record(session, response);

            if !matches(response, &item.response_type, &item.response_data)? {
                println!("{}", NO_MATCH);
                tracing::warn!(
                    "[{}] request #{} expected {}:{}",
                    session,
                    index,
                    item.response_type,
                    item.response_data
                );
                return Err(MockError::MatchFailure {
                    index,
                    expected: item.response_data.clone(),
                });
            }

            tracing::info!(
                "[{}] [matched {}:{}] {}",
                session,
                item.response_type,
                item.response_data,
                item.request_data
            );
        }

        println!("{}", ALL_MATCHED);
        Ok(ScriptReport {
            session,
            exchanges: self.items.len(),
        })
    }
}

/// A dialed connection ready to run the script
pub struct Client {
    config: MockConfig,
    stream: TcpStream,
    dump: DumpSink,
    capacity: usize,
}

impl Client {
    /// Resolve and dial once; no retry
    pub fn connect(config: &MockConfig, options: &RunOptions) -> Result<Self> {
        let addr = resolve(&config.addr())?;
        let stream = TcpStream::connect(addr)
            .map_err(|e| MockError::Network(format!("cannot connect to {}: {}", addr, e)))?;
        stream.set_nodelay(true)?;

        let dump = DumpSink::create(&options.dump_root, config.dump_request)?;
        tracing::info!("Sending to: {}", config.addr());

        Ok(Self {
            config: config.clone(),
            stream,
            dump,
            capacity: options.buffer_capacity,
        })
    }

    /// Run the script; the connection is closed when this returns
    pub fn run(mut self) -> Result<ScriptReport> {
        // The client run is always the first and only session
        let session = SessionIds::new().next();
        let peer = self
            .stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        tracing::info!("[{}] connected to server: {}", session, peer);

        let script = ClientScript::new(&self.config.requests, &self.dump, self.capacity);
        script.run(&mut self.stream, session)
    }

    /// Directory receiving dumps, when enabled
    pub fn dump(&self) -> &DumpSink {
        &self.dump
    }
}
