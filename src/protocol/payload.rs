//! Payload codec
//!
//! Converts tagged script payloads into raw bytes.

use std::fmt;
use std::str::FromStr;

use hex::FromHexError;

use crate::error::{MockError, Result};

/// Encoding tag of a script payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadType {
    /// Literal text
    String,

    /// Hex-encoded bytes
    Byte,
}

impl PayloadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadType::String => "string",
            PayloadType::Byte => "byte",
        }
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayloadType {
    type Err = MockError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "string" => Ok(PayloadType::String),
            "byte" => Ok(PayloadType::Byte),
            other => Err(MockError::InvalidEncoding(other.to_string())),
        }
    }
}

/// Encode a script payload to the bytes that go on the wire
pub fn encode(tag: &str, data: &str) -> Result<Vec<u8>> {
    match tag.parse::<PayloadType>()? {
        PayloadType::String => Ok(data.as_bytes().to_vec()),
        PayloadType::Byte => decode_hex(data),
    }
}

/// Decode a hex string (either case) into bytes
pub fn decode_hex(text: &str) -> Result<Vec<u8>> {
    hex::decode(text).map_err(|e| {
        MockError::InvalidHexPayload(match e {
            FromHexError::InvalidHexCharacter { c, index } => {
                format!("invalid hex digit {:?} at offset {} in {:?}", c, index, text)
            }
            FromHexError::OddLength => format!("odd length {} in {:?}", text.len(), text),
            other => format!("{} in {:?}", other, text),
        })
    })
}

/// Lowercase hex rendering, used for logs
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
