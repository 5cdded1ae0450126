//! Wire representation of a gossip message.
//!
//! Strings and bytes pass through unchanged; arbitrary structured values
//! are encoded as compact JSON with sorted keys — matching the Python
//! original's `_encode_message`/`_decode_message`.

use chain_types::CoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GossipMessage {
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl GossipMessage {
    /// Encodes the message as a line of wire format for the external
    /// back-end: non-JSON-serializable content is never produced, since
    /// every variant here already serializes.
    pub fn encode_line(&self) -> Result<String, CoreError> {
        let json = serde_json::to_string(self).map_err(CoreError::from)?;
        Ok(json)
    }

    pub fn decode_line(line: &str) -> Result<Self, CoreError> {
        serde_json::from_str(line).map_err(CoreError::from)
    }
}

impl From<String> for GossipMessage {
    fn from(value: String) -> Self {
        GossipMessage::Text(value)
    }
}

impl From<serde_json::Value> for GossipMessage {
    fn from(value: serde_json::Value) -> Self {
        GossipMessage::Json(value)
    }
}
