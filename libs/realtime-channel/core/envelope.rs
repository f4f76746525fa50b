//! Wire framing
//!
//! Every frame in either direction is one JSON object:
//!
//! ```text
//! { "type": "<tag>", "payload": <any JSON value> }
//! ```
//!
//! A missing `payload` decodes as `null`. Binary frames are accepted when they
//! carry the same UTF-8 JSON.

use crate::traits::{ChannelError, Result, WsMessage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoded inbound frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

/// Borrowed outbound frame, serialized without cloning the payload
#[derive(Serialize)]
struct OutboundEnvelope<'a, T: Serialize + ?Sized> {
    #[serde(rename = "type")]
    kind: &'a str,
    payload: &'a T,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Decode a received frame
    pub fn decode(message: &WsMessage) -> Result<Self> {
        serde_json::from_slice(message.as_bytes())
            .map_err(|e| ChannelError::Decode(format!("{} ({} bytes)", e, message.len())))
    }

    pub fn encode(&self) -> Result<String> {
        encode_frame(&self.kind, &self.payload)
    }
}

/// Serialize `{type, payload}` into a text frame body
pub fn encode_frame<T>(kind: &str, payload: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    serde_json::to_string(&OutboundEnvelope { kind, payload })
        .map_err(|e| ChannelError::Encode(e.to_string()))
}
