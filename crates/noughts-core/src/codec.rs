//! JSON text-frame codec for the noughts WebSocket protocol.
//!
//! Wire format: one JSON object per WebSocket text frame.

use crate::error::{NoughtsError, NoughtsResult};

/// Maximum accepted inbound frame length in bytes.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Encode a serializable value into a JSON text frame.
pub fn encode<T: serde::Serialize>(value: &T) -> NoughtsResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode a JSON text frame into a typed value.
pub fn decode<T: serde::de::DeserializeOwned>(text: &str) -> NoughtsResult<T> {
    if text.len() > MAX_FRAME_SIZE {
        return Err(NoughtsError::Codec(format!(
            "frame too large: {} bytes (max {})",
            text.len(),
            MAX_FRAME_SIZE
        )));
    }
    Ok(serde_json::from_str(text)?)
}
