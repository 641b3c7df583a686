//! Session boundary: the slice of a connected client a channel can see.
//!
//! A channel never owns a session. It holds `Arc<dyn Session>` handles and
//! uses exactly three capabilities: a stable numeric identity, a display
//! name for message attribution, and a non-blocking enqueue into the
//! session's outbound queue. The session's own connection task drains that
//! queue onto the wire.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::EnqueueError;

/// Stable numeric identity of a connected session.
///
/// The surrounding game protocol stamps this id into packets, so it is a
/// plain integer rather than an opaque token.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capabilities a channel needs from a connected session.
///
/// `enqueue` must not block: a full or closed queue is reported as an
/// error for the session's owner to handle (drop, disconnect, or apply
/// backpressure). Broadcast fan-out relies on this to stay non-blocking
/// while holding a membership read lock.
pub trait Session: Send + Sync {
    /// Stable identity of this session.
    fn id(&self) -> SessionId;

    /// Display name used for message attribution.
    fn username(&self) -> &str;

    /// Push an opaque payload into the session's outbound queue.
    fn enqueue(&self, payload: Bytes) -> Result<(), EnqueueError>;
}

/// Non-owning handle to a session, as held by channels.
pub type SessionRef = Arc<dyn Session>;

/// A [`Session`] backed by a bounded `mpsc` queue.
///
/// The constructor hands back the receiver half; the connection task that
/// owns the session drains it onto the socket. `enqueue` uses `try_send`,
/// so a stalled connection surfaces as [`EnqueueError::QueueFull`] instead
/// of stalling whoever is broadcasting.
pub struct QueuedSession {
    id: SessionId,
    username: String,
    outbound: mpsc::Sender<Bytes>,
}

impl QueuedSession {
    /// Create a session with an outbound queue of `capacity` payloads.
    pub fn new(
        id: SessionId,
        username: impl Into<String>,
        capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity);
        let session = Arc::new(Self {
            id,
            username: username.into(),
            outbound: tx,
        });
        (session, rx)
    }
}

impl Session for QueuedSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn username(&self) -> &str {
        &self.username
    }

    fn enqueue(&self, payload: Bytes) -> Result<(), EnqueueError> {
        self.outbound.try_send(payload).map_err(|err| match err {
            TrySendError::Full(_) => EnqueueError::QueueFull {
                capacity: self.outbound.max_capacity(),
            },
            TrySendError::Closed(_) => EnqueueError::QueueClosed,
        })
    }
}

impl std::fmt::Debug for QueuedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedSession")
            .field("id", &self.id)
            .field("username", &self.username)
            .finish()
    }
}
