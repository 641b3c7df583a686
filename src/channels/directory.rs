//! The server-wide registry of live channels.
//!
//! The directory owns the `name -> channel` map. Channels are created
//! through it, looked up by internal name, and removed either by an
//! administrative call or by an instance channel dissolving itself. The
//! registry lock and a channel's state lock are never held at the same
//! time: `Channel::leave` releases its state lock before calling
//! [`Directory::remove_channel`], and [`ChannelDirectory::remove`] drops
//! the registry lock before closing the channel.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::channels::channel::{Channel, ChannelConfig, ChannelSummary};
use crate::error::DirectoryError;

/// The one capability a channel needs from its registry: the ability to
/// request its own removal when it dissolves.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Unlink the named channel. Invoked exactly once per dissolution,
    /// at the moment an instance channel's membership reaches zero.
    async fn remove_channel(&self, internal_name: &str) -> Result<(), DirectoryError>;
}

/// In-memory channel registry keyed by internal name.
pub struct ChannelDirectory {
    channels: RwLock<HashMap<String, Arc<Channel>>>,
    /// Handed to each created channel as its removal callback.
    self_ref: Weak<ChannelDirectory>,
}

impl ChannelDirectory {
    /// Create an empty directory.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            channels: RwLock::new(HashMap::new()),
            self_ref: weak.clone(),
        })
    }

    /// Construct a channel from `config`, bind it to this directory, and
    /// register it under its internal name.
    pub async fn create(&self, config: ChannelConfig) -> Result<Arc<Channel>, DirectoryError> {
        let mut channels = self.channels.write().await;
        if channels.contains_key(&config.internal_name) {
            return Err(DirectoryError::NameTaken {
                name: config.internal_name,
            });
        }

        let channel = Arc::new(Channel::new(config));
        let weak: Weak<dyn Directory> = self.self_ref.clone();
        channel.bind_directory(weak);
        tracing::debug!(channel = %channel.internal_name(), "channel registered");
        channels.insert(channel.internal_name().to_string(), channel.clone());
        Ok(channel)
    }

    /// Look up a live channel by internal name.
    pub async fn get(&self, internal_name: &str) -> Option<Arc<Channel>> {
        self.channels.read().await.get(internal_name).cloned()
    }

    /// Administrative removal: unlink the channel and close it.
    ///
    /// Returns the closed channel so the caller can notify members that
    /// were dropped with it.
    pub async fn remove(&self, internal_name: &str) -> Result<Arc<Channel>, DirectoryError> {
        let channel = {
            let mut channels = self.channels.write().await;
            channels
                .remove(internal_name)
                .ok_or_else(|| DirectoryError::NotFound {
                    name: internal_name.to_string(),
                })?
        };
        channel.close().await;
        tracing::info!(channel = %internal_name, "channel removed by administrative action");
        Ok(channel)
    }

    /// Channels that session bootstrap should join automatically, in
    /// internal-name order.
    pub async fn auto_join(&self) -> Vec<Arc<Channel>> {
        let channels = self.channels.read().await;
        let mut auto: Vec<Arc<Channel>> = channels
            .values()
            .filter(|c| c.auto_join())
            .cloned()
            .collect();
        auto.sort_by(|a, b| a.internal_name().cmp(b.internal_name()));
        auto
    }

    /// Listing entries for every live channel, in internal-name order.
    pub async fn summaries(&self) -> Vec<ChannelSummary> {
        let mut channels: Vec<Arc<Channel>> =
            self.channels.read().await.values().cloned().collect();
        channels.sort_by(|a, b| a.internal_name().cmp(b.internal_name()));

        let mut summaries = Vec::with_capacity(channels.len());
        for channel in channels {
            summaries.push(channel.summary().await);
        }
        summaries
    }

    /// Number of live channels.
    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Whether the directory holds no channels.
    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }
}

#[async_trait]
impl Directory for ChannelDirectory {
    async fn remove_channel(&self, internal_name: &str) -> Result<(), DirectoryError> {
        let mut channels = self.channels.write().await;
        match channels.remove(internal_name) {
            Some(_) => {
                tracing::debug!(channel = %internal_name, "dissolved channel unlinked");
                Ok(())
            }
            None => Err(DirectoryError::NotFound {
                name: internal_name.to_string(),
            }),
        }
    }
}
