//! Message encoding boundary.
//!
//! Channels fan out opaque byte payloads; building those payloads is the
//! encoder's job. The trait sits upstream of `Channel::broadcast` so a
//! server can swap in its real wire format while tests and tools use the
//! JSON encoder.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::session::{Session, SessionId};

/// A chat message as handed to an encoder: sender attribution, the
/// channel's display name, and the text body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    pub sender_id: SessionId,
    pub target: String,
    pub text: String,
}

impl ChatMessage {
    /// Build a message from the sending session, stamped with the target
    /// channel's display name.
    pub fn new(sender: &dyn Session, target: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.username().to_string(),
            sender_id: sender.id(),
            target: target.into(),
            text: text.into(),
        }
    }
}

/// Produces the wire payload for a chat message.
pub trait MessageEncoder: Send + Sync {
    fn encode(&self, message: &ChatMessage) -> Bytes;
}

/// JSON wire encoding of chat messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMessageEncoder;

impl MessageEncoder for JsonMessageEncoder {
    fn encode(&self, message: &ChatMessage) -> Bytes {
        match serde_json::to_vec(message) {
            Ok(buf) => Bytes::from(buf),
            Err(err) => {
                tracing::error!(error = %err, "failed to encode chat message");
                Bytes::new()
            }
        }
    }
}
