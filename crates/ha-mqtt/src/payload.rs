//! Payload encoding

use std::borrow::Cow;

use tracing::warn;

use crate::error::{MqttError, MqttResult};

/// A received payload after decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    /// Raw bytes, for an empty `encoding`
    Bytes(Vec<u8>),
}

impl Payload {
    /// The payload as text, replacing invalid UTF-8 in raw payloads
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Payload::Text(text) => Cow::Borrowed(text),
            Payload::Bytes(bytes) => String::from_utf8_lossy(bytes),
        }
    }
}

fn is_text_encoding(encoding: &str) -> bool {
    matches!(
        encoding.to_ascii_lowercase().as_str(),
        "utf-8" | "utf8" | "ascii"
    )
}

/// Check that `encoding` is one payloads can be decoded with
pub fn validate_encoding(encoding: &str) -> MqttResult<()> {
    if encoding.is_empty() || is_text_encoding(encoding) {
        Ok(())
    } else {
        Err(MqttError::Encoding(encoding.to_string()))
    }
}

/// Decode a received payload
///
/// Returns None for a payload that is not valid in `encoding`; the message
/// should be dropped.
pub fn decode_payload(bytes: &[u8], encoding: &str) -> Option<Payload> {
    if encoding.is_empty() {
        return Some(Payload::Bytes(bytes.to_vec()));
    }
    if !is_text_encoding(encoding) {
        warn!(encoding, "Dropping message with unsupported encoding");
        return None;
    }
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(encoding, error = %e, "Can't decode payload, dropping message");
            return None;
        }
    };
    if encoding.eq_ignore_ascii_case("ascii") && !text.is_ascii() {
        warn!(encoding, "Payload is not ascii, dropping message");
        return None;
    }
    Some(Payload::Text(text.to_string()))
}

/// Bytes to publish for `text`
pub fn encode_payload(text: &str, encoding: &str) -> Vec<u8> {
    if encoding.eq_ignore_ascii_case("ascii") && !text.is_ascii() {
        warn!("Payload is not ascii, publishing it as utf-8");
    }
    text.as_bytes().to_vec()
}
