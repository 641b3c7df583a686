//! A single chat channel: membership, topic, and message fan-out.
//!
//! A channel is shared mutable state touched by many session tasks at
//! once. All membership mutation and every fan-out pass go through one
//! `RwLock` over [`ChannelState`], so iteration never observes a join or
//! leave mid-flight, and the "last member leaving an instance channel"
//! check is atomic with the removal itself.

use std::sync::{OnceLock, Weak};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::access::AccessLevel;
use crate::channels::directory::Directory;
use crate::error::ChannelError;
use crate::session::{Session, SessionId, SessionRef};

/// Internal-name prefix of per-spectator instance channels.
pub const SPECTATOR_PREFIX: &str = "#spec_";
/// Internal-name prefix of per-lobby multiplayer instance channels.
pub const MULTIPLAYER_PREFIX: &str = "#multi_";
/// Display alias shared by all spectator instances.
pub const SPECTATOR_ALIAS: &str = "#spectator";
/// Display alias shared by all multiplayer instances.
pub const MULTIPLAYER_ALIAS: &str = "#multiplayer";

/// Map an internal channel name to the name shown to clients.
///
/// Instanced channels stay individually addressable internally
/// (`#spec_1001`, `#multi_73`) while presenting one conceptual identity
/// to clients. Any other name passes through unchanged.
pub fn display_name(internal_name: &str) -> &str {
    if internal_name.starts_with(SPECTATOR_PREFIX) {
        SPECTATOR_ALIAS
    } else if internal_name.starts_with(MULTIPLAYER_PREFIX) {
        MULTIPLAYER_ALIAS
    } else {
        internal_name
    }
}

fn default_auto_join() -> bool {
    true
}

/// Construction parameters for a [`Channel`].
///
/// Static channels typically come from the server's config file; instance
/// channels are built with [`ChannelConfig::spectator`] and
/// [`ChannelConfig::multiplayer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Canonical internal name (e.g. `#general`, `#multi_73`).
    pub internal_name: String,
    /// Topic string shown in channel listings.
    pub topic: String,
    /// Minimum level required to observe the channel.
    #[serde(default)]
    pub read_level: AccessLevel,
    /// Minimum level required to post in the channel.
    #[serde(default)]
    pub write_level: AccessLevel,
    /// Whether session bootstrap should join the channel automatically.
    #[serde(default = "default_auto_join")]
    pub auto_join: bool,
    /// Whether the channel dissolves itself when its last member leaves.
    #[serde(default)]
    pub instance: bool,
}

impl ChannelConfig {
    /// Config for a persistent channel with baseline access levels.
    pub fn new(internal_name: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            internal_name: internal_name.into(),
            topic: topic.into(),
            read_level: AccessLevel::default(),
            write_level: AccessLevel::default(),
            auto_join: true,
            instance: false,
        }
    }

    /// Config for the instance channel of a spectated session.
    pub fn spectator(host: SessionId) -> Self {
        Self {
            internal_name: format!("{SPECTATOR_PREFIX}{host}"),
            topic: "Spectator chat".to_string(),
            read_level: AccessLevel::default(),
            write_level: AccessLevel::default(),
            auto_join: false,
            instance: true,
        }
    }

    /// Config for the instance channel of a multiplayer lobby.
    pub fn multiplayer(match_id: u64) -> Self {
        Self {
            internal_name: format!("{MULTIPLAYER_PREFIX}{match_id}"),
            topic: "Multiplayer chat".to_string(),
            read_level: AccessLevel::default(),
            write_level: AccessLevel::default(),
            auto_join: false,
            instance: true,
        }
    }

    /// Builder: set the minimum level required to read.
    pub fn with_read_level(mut self, level: AccessLevel) -> Self {
        self.read_level = level;
        self
    }

    /// Builder: set the minimum level required to post.
    pub fn with_write_level(mut self, level: AccessLevel) -> Self {
        self.write_level = level;
        self
    }

    /// Builder: set whether session bootstrap joins the channel.
    pub fn with_auto_join(mut self, auto_join: bool) -> Self {
        self.auto_join = auto_join;
        self
    }
}

/// Point-in-time listing entry: display name, topic, member count.
///
/// The count is read at call time, not snapshotted; treat it as already
/// stale once the call returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSummary {
    pub name: String,
    pub topic: String,
    pub member_count: usize,
}

/// What a completed [`Channel::leave`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The member was removed; the channel lives on.
    Left,
    /// The last member left an instance channel; the channel closed and
    /// detached itself from its directory.
    Dissolved,
}

struct Member {
    session: SessionRef,
    joined_at: DateTime<Utc>,
}

/// Membership plus the lifecycle flag, guarded as one unit.
struct ChannelState {
    /// Insertion-ordered, unique by session identity.
    members: Vec<Member>,
    /// Set once; no operation is valid afterwards.
    closed: bool,
}

impl ChannelState {
    fn position(&self, session: SessionId) -> Option<usize> {
        self.members.iter().position(|m| m.session.id() == session)
    }
}

/// One chat/broadcast scope: holds the authoritative membership set and
/// performs message fan-out.
///
/// Channels are constructed by a directory collaborator and are not
/// self-registering. An instance channel requests its own removal from
/// the directory the moment its last member leaves.
pub struct Channel {
    internal_name: String,
    topic: RwLock<String>,
    read_level: AccessLevel,
    write_level: AccessLevel,
    auto_join: bool,
    instance: bool,
    created_at: DateTime<Utc>,
    state: RwLock<ChannelState>,
    directory: OnceLock<Weak<dyn Directory>>,
}

impl Channel {
    /// Create a channel from its config. The channel starts empty and
    /// unregistered.
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            internal_name: config.internal_name,
            topic: RwLock::new(config.topic),
            read_level: config.read_level,
            write_level: config.write_level,
            auto_join: config.auto_join,
            instance: config.instance,
            created_at: Utc::now(),
            state: RwLock::new(ChannelState {
                members: Vec::new(),
                closed: false,
            }),
            directory: OnceLock::new(),
        }
    }

    /// Bind the directory this channel will ask to remove it when it
    /// dissolves. A channel belongs to at most one directory; a second
    /// bind is ignored.
    pub fn bind_directory(&self, directory: Weak<dyn Directory>) {
        if self.directory.set(directory).is_err() {
            tracing::warn!(
                channel = %self.internal_name,
                "channel is already bound to a directory, ignoring rebind"
            );
        }
    }

    /// Canonical internal name.
    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    /// User-facing name: reserved instance prefixes collapse to their
    /// shared alias, anything else passes through.
    pub fn display_name(&self) -> &str {
        display_name(&self.internal_name)
    }

    /// Current topic.
    pub async fn topic(&self) -> String {
        self.topic.read().await.clone()
    }

    /// Replace the topic. Privilege checks happen in the caller.
    pub async fn set_topic(&self, topic: impl Into<String>) {
        *self.topic.write().await = topic.into();
    }

    /// Minimum level required to observe the channel.
    pub fn read_level(&self) -> AccessLevel {
        self.read_level
    }

    /// Minimum level required to post in the channel.
    pub fn write_level(&self) -> AccessLevel {
        self.write_level
    }

    /// Whether a session at `level` may observe this channel. Callers
    /// gate sends on this; the channel does not re-check on fan-out.
    pub fn can_read(&self, level: AccessLevel) -> bool {
        level.permits(self.read_level)
    }

    /// Whether a session at `level` may post in this channel.
    pub fn can_write(&self, level: AccessLevel) -> bool {
        level.permits(self.write_level)
    }

    /// Whether session bootstrap should join this channel automatically.
    pub fn auto_join(&self) -> bool {
        self.auto_join
    }

    /// Whether this channel dissolves when its last member leaves.
    pub fn is_instance(&self) -> bool {
        self.instance
    }

    /// When the channel was constructed.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the channel has reached its terminal state.
    pub async fn is_closed(&self) -> bool {
        self.state.read().await.closed
    }

    /// Whether `session` is a fully committed member.
    pub async fn contains(&self, session: SessionId) -> bool {
        self.state.read().await.position(session).is_some()
    }

    /// Number of current members.
    pub async fn member_count(&self) -> usize {
        self.state.read().await.members.len()
    }

    /// Member identities in join order.
    pub async fn member_ids(&self) -> Vec<SessionId> {
        self.state
            .read()
            .await
            .members
            .iter()
            .map(|m| m.session.id())
            .collect()
    }

    /// Listing entry: display name, topic, member count.
    pub async fn summary(&self) -> ChannelSummary {
        let member_count = self.state.read().await.members.len();
        ChannelSummary {
            name: self.display_name().to_string(),
            topic: self.topic.read().await.clone(),
            member_count,
        }
    }

    /// Add `session` to the membership set, preserving join order.
    ///
    /// Capacity and permission checks are the caller's responsibility.
    /// Joining twice is rejected with [`ChannelError::AlreadyJoined`] and
    /// never produces a duplicate entry; joining a closed channel is
    /// rejected with [`ChannelError::Closed`].
    pub async fn join(&self, session: SessionRef) -> Result<(), ChannelError> {
        let mut state = self.state.write().await;
        if state.closed {
            return Err(ChannelError::Closed {
                channel: self.internal_name.clone(),
            });
        }
        if state.position(session.id()).is_some() {
            return Err(ChannelError::AlreadyJoined {
                channel: self.internal_name.clone(),
                session: session.id(),
            });
        }

        tracing::debug!(
            channel = %self.internal_name,
            session = %session.id(),
            "session joined channel"
        );
        state.members.push(Member {
            session,
            joined_at: Utc::now(),
        });
        Ok(())
    }

    /// Remove `session` from the membership set.
    ///
    /// If this was the last member of an instance channel, the channel
    /// transitions to closed in the same critical section as the removal
    /// (a racing `join` either lands first and keeps the channel alive,
    /// or observes the closed state and is rejected), then asks its
    /// directory to drop it. A failed detach is reported as
    /// [`ChannelError::Teardown`] and is not retried.
    pub async fn leave(&self, session: SessionId) -> Result<LeaveOutcome, ChannelError> {
        let dissolved = {
            let mut state = self.state.write().await;
            if state.closed {
                return Err(ChannelError::Closed {
                    channel: self.internal_name.clone(),
                });
            }
            let index = state
                .position(session)
                .ok_or_else(|| ChannelError::NotAMember {
                    channel: self.internal_name.clone(),
                    session,
                })?;
            let member = state.members.remove(index);
            tracing::debug!(
                channel = %self.internal_name,
                session = %session,
                member_since = %member.joined_at,
                "session left channel"
            );
            if self.instance && state.members.is_empty() {
                state.closed = true;
                true
            } else {
                false
            }
        };

        if !dissolved {
            return Ok(LeaveOutcome::Left);
        }

        // The state lock is released here; the directory may take its
        // registry lock without ordering against any channel lock.
        tracing::info!(
            channel = %self.internal_name,
            "last member left instance channel, dissolving"
        );
        if let Some(directory) = self.directory.get().and_then(Weak::upgrade) {
            directory
                .remove_channel(&self.internal_name)
                .await
                .map_err(|source| ChannelError::Teardown {
                    channel: self.internal_name.clone(),
                    source,
                })?;
        }
        Ok(LeaveOutcome::Dissolved)
    }

    /// Fan `payload` out to every member except `sender`, or to every
    /// member including `sender` when `include_sender` is set.
    ///
    /// The payload is already wire-encoded and stamped with the sender's
    /// identity and this channel's display name. Returns the number of
    /// recipients whose queue accepted the payload.
    pub async fn broadcast(
        &self,
        sender: SessionId,
        payload: Bytes,
        include_sender: bool,
    ) -> Result<usize, ChannelError> {
        let sender_only = [sender];
        let immune: &[SessionId] = if include_sender { &[] } else { &sender_only };
        self.enqueue_raw(payload, immune).await
    }

    /// Fan `payload` out to every member whose identity is not in
    /// `immune`. Used directly for channel-scoped system messages that
    /// have no sending session.
    ///
    /// A recipient whose queue rejects the payload is logged and skipped;
    /// the pass always runs to completion over the remaining members.
    pub async fn enqueue_raw(
        &self,
        payload: Bytes,
        immune: &[SessionId],
    ) -> Result<usize, ChannelError> {
        let state = self.state.read().await;
        if state.closed {
            return Err(ChannelError::Closed {
                channel: self.internal_name.clone(),
            });
        }

        let mut delivered = 0;
        for member in &state.members {
            if immune.contains(&member.session.id()) {
                continue;
            }
            match member.session.enqueue(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::warn!(
                        channel = %self.internal_name,
                        session = %member.session.id(),
                        error = %err,
                        "failed to enqueue payload to channel member"
                    );
                }
            }
        }
        Ok(delivered)
    }

    /// Deliver `payload` to exactly `targets`, regardless of membership.
    ///
    /// Used for targeted notifications (e.g. replies) framed with this
    /// channel's identity; `sender` is the originating session, used for
    /// logging only. Returns the number of accepted deliveries.
    pub async fn send_selective(
        &self,
        sender: SessionId,
        payload: Bytes,
        targets: &[SessionRef],
    ) -> Result<usize, ChannelError> {
        if self.state.read().await.closed {
            return Err(ChannelError::Closed {
                channel: self.internal_name.clone(),
            });
        }

        let mut delivered = 0;
        for target in targets {
            match target.enqueue(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::warn!(
                        channel = %self.internal_name,
                        sender = %sender,
                        target = %target.id(),
                        error = %err,
                        "failed to enqueue selective payload"
                    );
                }
            }
        }
        Ok(delivered)
    }

    /// Administrative teardown: mark the channel closed and drop all
    /// member handles. Idempotent.
    pub(crate) async fn close(&self) {
        let mut state = self.state.write().await;
        if state.closed {
            return;
        }
        state.closed = true;
        state.members.clear();
        tracing::debug!(channel = %self.internal_name, "channel closed");
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.internal_name)
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("internal_name", &self.internal_name)
            .field("instance", &self.instance)
            .finish()
    }
}
