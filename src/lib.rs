//! # mocktcp
//!
//! A scriptable TCP peer for testing real clients and servers:
//! - Server mode: answer inbound data that contains a scripted request
//! - Client mode: send scripted requests in order and verify each response
//! - Optional raw dumps of everything received
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    run(config, options)                      │
//! │                  (Connection Orchestrator)                   │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │ server                        │ client
//! ┌──────────────▼──────────────┐  ┌─────────────▼──────────────┐
//! │  Server: accept loop         │  │  Client: dial once          │
//! │  one ServerSession / conn    │  │  ClientScript, in order     │
//! └──────────────┬──────────────┘  └─────────────┬──────────────┘
//!                │                               │
//!          ┌─────┴─────────────┬─────────────────┘
//!          ▼                   ▼
//!   ┌─────────────┐     ┌─────────────┐
//!   │  protocol   │     │    dump     │
//!   │ encode/match│     │  (per run)  │
//!   └─────────────┘     └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod dump;
pub mod control;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ErrorClass, MockError, Result};
pub use config::{MockConfig, Mode, RequestItem, RunOptions};
pub use network::{Client, ScriptReport, Server, ServerExit};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of mocktcp
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Orchestrator
// =============================================================================

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Client mode: every scripted response matched
    ScriptPassed(ScriptReport),

    /// Server mode: a bye packet was answered
    ByePacket { session: u64 },

    /// Server mode: the accept loop ended and all sessions finished
    AcceptStopped,
}

/// Run the script in whichever mode it declares
///
/// Every failure comes back as an error; mapping it to an exit status is
/// left to the caller.
pub fn run(config: &MockConfig, options: &RunOptions) -> Result<RunOutcome> {
    match config.mode {
        Mode::Client => {
            let report = Client::connect(config, options)?.run()?;
            Ok(RunOutcome::ScriptPassed(report))
        }
        Mode::Server => match Server::bind(config, options)?.run()? {
            ServerExit::ByePacket { session } => Ok(RunOutcome::ByePacket { session }),
            ServerExit::AcceptStopped => Ok(RunOutcome::AcceptStopped),
        },
    }
}
