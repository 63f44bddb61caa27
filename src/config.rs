//! Configuration for mocktcp
//!
//! Two layers:
//! - [`MockConfig`]: the script, loaded once from JSON and read-only afterwards
//! - [`RunOptions`]: runtime knobs with sensible defaults

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MockError, Result};
use crate::protocol::{decode_hex, PayloadType};

/// Which side of the conversation this process plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Server,
    Client,
}

/// One scripted exchange unit
///
/// Type tags are kept as written in the script; they are interpreted by the
/// payload codec each time the item is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestItem {
    /// Encoding of `request_data`: `string` or `byte`
    pub request_type: String,

    /// Sent by the client, matched against inbound data by the server
    pub request_data: String,

    /// Encoding of `response_data`: `string` or `byte`
    pub response_type: String,

    /// Matched against inbound data by the client, sent back by the server
    pub response_data: String,

    /// Server side: terminate the whole run once this item's response is sent
    #[serde(default)]
    pub bye_packet: bool,
}

impl RequestItem {
    /// Plain-text item, handy for tests and small scripts
    pub fn string(request: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            request_type: PayloadType::String.to_string(),
            request_data: request.into(),
            response_type: PayloadType::String.to_string(),
            response_data: response.into(),
            bye_packet: false,
        }
    }

    /// Hex-encoded item
    pub fn bytes(request_hex: impl Into<String>, response_hex: impl Into<String>) -> Self {
        Self {
            request_type: PayloadType::Byte.to_string(),
            request_data: request_hex.into(),
            response_type: PayloadType::Byte.to_string(),
            response_data: response_hex.into(),
            bye_packet: false,
        }
    }

    /// Mark this item as the end-of-test packet
    pub fn bye(mut self) -> Self {
        self.bye_packet = true;
        self
    }
}

/// The whole script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockConfig {
    pub mode: Mode,
    pub host: String,
    pub port: u16,

    /// Persist every received buffer under a per-run directory
    #[serde(default)]
    pub dump_request: bool,

    /// Client: interaction order. Server: match priority.
    #[serde(default)]
    pub requests: Vec<RequestItem>,
}

impl MockConfig {
    /// Parse a script from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| MockError::Config(e.to_string()))
    }

    /// Load a script from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            MockError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// `host:port` as handed to the resolver
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check every tag and hex payload up front
    ///
    /// Running a script never calls this; invalid items are only fatal when
    /// they are actually used.
    pub fn validate(&self) -> Result<()> {
        for (index, item) in self.requests.iter().enumerate() {
            check_payload(index, "request", &item.request_type, &item.request_data)?;
            check_payload(index, "response", &item.response_type, &item.response_data)?;
        }
        Ok(())
    }
}

fn check_payload(index: usize, side: &str, tag: &str, data: &str) -> Result<()> {
    let annotate = |e: MockError| MockError::Config(format!("requests[{}].{}: {}", index, side, e));

    match tag.parse::<PayloadType>().map_err(annotate)? {
        PayloadType::String => Ok(()),
        PayloadType::Byte => decode_hex(data).map(|_| ()).map_err(annotate),
    }
}

// =============================================================================
// Runtime Options
// =============================================================================

/// Reference capacity of a single read
pub const DEFAULT_BUFFER_CAPACITY: usize = 2048;

/// Runtime knobs that are not part of the script
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Capacity of the single read that captures one message.
    /// Longer messages are truncated.
    pub buffer_capacity: usize,

    /// Parent of the per-run dump directories
    pub dump_root: PathBuf,

    /// How often the accept loop checks for shutdown
    pub accept_poll_interval: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            dump_root: PathBuf::from("./dump"),
            accept_poll_interval: Duration::from_millis(50),
        }
    }
}

impl RunOptions {
    /// Create a new options builder
    pub fn builder() -> RunOptionsBuilder {
        RunOptionsBuilder::default()
    }
}

/// Builder for RunOptions
#[derive(Default)]
pub struct RunOptionsBuilder {
    options: RunOptions,
}

impl RunOptionsBuilder {
    /// Set the read buffer capacity (in bytes, at least 1)
    pub fn buffer_capacity(mut self, bytes: usize) -> Self {
        self.options.buffer_capacity = bytes.max(1);
        self
    }

    /// Set the directory under which run directories are created
    pub fn dump_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.dump_root = path.into();
        self
    }

    /// Set the accept loop poll interval
    pub fn accept_poll_interval(mut self, interval: Duration) -> Self {
        self.options.accept_poll_interval = interval;
        self
    }

    pub fn build(self) -> RunOptions {
        self.options
    }
}
