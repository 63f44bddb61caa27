//! Server Session Matcher
//!
//! Handles one accepted connection. Every read is matched against the whole
//! script in declared order; items are never consumed, so the same item may
//! answer any number of reads.

use std::io::{self, Read, Write};

use crate::config::RequestItem;
use crate::dump::DumpSink;
use crate::error::{MockError, Result};
use crate::protocol::{encode, encode_hex, matches};

/// Marker printed when a read matches no scripted item
pub const NOTHING_MATCHED: &str = "nothing matched.";

/// Why a session loop stopped
#[derive(Debug)]
pub enum SessionEnd {
    /// Zero-length read
    PeerClosed,

    /// Read failed; only this session is affected
    ReadFailed(io::Error),

    /// Write failed or was short; only this session is affected
    WriteFailed(MockError),

    /// A `bye_packet` item was answered; the whole run should end
    ByePacket,

    /// The script is invalid; the whole run should end
    Fatal(MockError),
}

/// Index and item of the first scripted request contained in `received`
///
/// Items are evaluated in declared order and the scan stops at the first
/// match. An invalid item is an error even if a later item would match.
pub fn first_match<'a>(
    items: &'a [RequestItem],
    received: &[u8],
) -> Result<Option<(usize, &'a RequestItem)>> {
    for (index, item) in items.iter().enumerate() {
        if matches(received, &item.request_type, &item.request_data)? {
            return Ok(Some((index, item)));
        }
    }
    Ok(None)
}

/// Reactive matcher bound to one connection
pub struct ServerSession<'a, S> {
    stream: S,
    session: u64,
    items: &'a [RequestItem],
    dump: &'a DumpSink,
    capacity: usize,
}

impl<'a, S: Read + Write> ServerSession<'a, S> {
    pub fn new(
        stream: S,
        session: u64,
        items: &'a [RequestItem],
        dump: &'a DumpSink,
        capacity: usize,
    ) -> Self {
        Self {
            stream,
            session,
            items,
            dump,
            capacity: capacity.max(1),
        }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Loop until the peer goes away or the run must end
    pub fn run(&mut self) -> SessionEnd {
        let mut buf = vec![0u8; self.capacity];

        loop {
            let received = match self.stream.read(&mut buf) {
                Ok(0) => return SessionEnd::PeerClosed,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return SessionEnd::ReadFailed(e),
            };
            tracing::info!("[{}] received {} bytes", self.session, received);

            let request = &buf[..received];
            tracing::trace!("[{}] payload {}", self.session, encode_hex(request));
            self.dump.record(self.session, request);

            let (index, item) = match first_match(self.items, request) {
                Ok(Some(hit)) => hit,
                Ok(None) => {
                    println!("{}", NOTHING_MATCHED);
                    tracing::warn!("[{}] no scripted request matched", self.session);
                    continue;
                }
                Err(e) => return SessionEnd::Fatal(e),
            };

            tracing::info!(
                "[{}] [matched #{} {}:{}] {}",
                self.session,
                index,
                item.request_type,
                item.request_data,
                item.response_data
            );

            let response = match encode(&item.response_type, &item.response_data) {
                Ok(bytes) => bytes,
                Err(e) => return SessionEnd::Fatal(e),
            };

            if let Err(e) = self.send(&response) {
                return SessionEnd::WriteFailed(e);
            }

            if item.bye_packet {
                tracing::info!("[{}] bye packet sent", self.session);
                return SessionEnd::ByePacket;
            }
        }
    }

    /// One write call; a short write counts as a failure
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        let sent = self.stream.write(payload)?;
        if sent < payload.len() {
            return Err(MockError::Network(format!(
                "short write: {} of {} bytes",
                sent,
                payload.len()
            )));
        }
        tracing::info!("[{}] sent {} bytes", self.session, sent);
        Ok(())
    }
}
