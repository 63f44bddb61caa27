//! Protocol Module
//!
//! There is no framing on the wire: every send is one write, every receive is
//! one read of whatever the transport delivers up to the buffer capacity.
//! This module only deals with turning script payloads into bytes and
//! deciding whether a received buffer contains an expected pattern.
//!
//! ## Payload Types
//! - `string`: the text is used verbatim (UTF-8 bytes, no escaping)
//! - `byte`:   the text is hex, e.g. `"0a0bff"` -> `[0x0a, 0x0b, 0xff]`

mod payload;
mod matcher;

pub use payload::{decode_hex, encode, encode_hex, PayloadType};
pub use matcher::{contains, matches};
