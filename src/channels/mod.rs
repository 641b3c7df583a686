//! Chat channels and their registry.
//!
//! A channel groups connected sessions and relays messages among them.
//! The directory owns the set of live channels; instance channels ask it
//! to drop them when their last member leaves.
//!
//! ```text
//! session task ──► join(channel)
//! session task ──► broadcast(sender, payload) ──► each member's queue
//! session task ──► leave(channel) ──► last member of an instance?
//!                                       └──► directory.remove_channel
//! ```

mod channel;
mod directory;
mod encoder;

pub use channel::{
    Channel, ChannelConfig, ChannelSummary, LeaveOutcome, MULTIPLAYER_ALIAS, MULTIPLAYER_PREFIX,
    SPECTATOR_ALIAS, SPECTATOR_PREFIX, display_name,
};
pub use directory::{ChannelDirectory, Directory};
pub use encoder::{ChatMessage, JsonMessageEncoder, MessageEncoder};
