//! Chat channel and broadcast fan-out core for multiplayer game servers.
//!
//! Groups connected client sessions into channels, relays text messages
//! and presence changes among them, and accounts for membership. Channels
//! are the unit of pub/sub fan-out and access gating; ephemeral instance
//! channels (one per multiplayer lobby or spectated player) dissolve
//! themselves when their last member departs.
//!
//! Transport, authentication, persistence and the wire protocol live in
//! collaborating components; this crate exposes the membership and
//! fan-out machinery they compose.

pub mod access;
pub mod channels;
pub mod error;
pub mod session;

pub use access::AccessLevel;
pub use channels::{
    Channel, ChannelConfig, ChannelDirectory, ChannelSummary, ChatMessage, Directory,
    JsonMessageEncoder, LeaveOutcome, MessageEncoder, display_name,
};
pub use error::{ChannelError, DirectoryError, EnqueueError, Error, Result};
pub use session::{QueuedSession, Session, SessionId, SessionRef};
