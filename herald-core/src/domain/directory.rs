//! Channel lookups used to resolve recipients of channel-scoped events

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::types::{ChannelRecord, Entity, EntityChange, Lifecycle};
use crate::event::RecipientId;

/// Source of current channel state (visibility and membership).
///
/// Implemented by whatever owns channel persistence; the hub only reads.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    /// Current state of a channel, `None` if unknown or removed
    async fn channel(&self, channel_id: &str) -> Option<ChannelRecord>;
}

/// Directory kept in memory as a projection of channel and membership
/// changes flowing through the hub.
#[derive(Default)]
pub struct InMemoryChannelDirectory {
    channels: RwLock<HashMap<String, ChannelRecord>>,
}

impl InMemoryChannelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, channel: ChannelRecord) {
        self.channels.write().await.insert(channel.id.clone(), channel);
    }

    pub async fn remove(&self, channel_id: &str) -> Option<ChannelRecord> {
        self.channels.write().await.remove(channel_id)
    }

    /// Add a member; returns false if the channel is unknown
    pub async fn add_member(&self, channel_id: &str, user_id: RecipientId) -> bool {
        match self.channels.write().await.get_mut(channel_id) {
            Some(channel) => {
                channel.member_ids.insert(user_id);
                true
            }
            None => false,
        }
    }

    /// Remove a member; returns false if the channel is unknown
    pub async fn remove_member(&self, channel_id: &str, user_id: &RecipientId) -> bool {
        match self.channels.write().await.get_mut(channel_id) {
            Some(channel) => {
                channel.member_ids.remove(user_id);
                true
            }
            None => false,
        }
    }

    /// Fold a change into the projection. Changes to other entity kinds are
    /// ignored.
    pub async fn apply(&self, change: &EntityChange) {
        match (&change.entity, change.lifecycle) {
            (Entity::Channel(channel), Lifecycle::Created | Lifecycle::Updated) => {
                self.upsert(channel.clone()).await;
            }
            (Entity::Channel(channel), Lifecycle::Removed) => {
                self.remove(&channel.id).await;
            }
            (Entity::Membership(membership), Lifecycle::Created) => {
                if !self
                    .add_member(&membership.channel_id, membership.user_id.clone())
                    .await
                {
                    debug!(channel = %membership.channel_id, "Membership for unknown channel");
                }
            }
            (Entity::Membership(membership), Lifecycle::Removed) => {
                if !self
                    .remove_member(&membership.channel_id, &membership.user_id)
                    .await
                {
                    debug!(channel = %membership.channel_id, "Membership for unknown channel");
                }
            }
            _ => {}
        }
    }

    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }
}

#[async_trait]
impl ChannelDirectory for InMemoryChannelDirectory {
    async fn channel(&self, channel_id: &str) -> Option<ChannelRecord> {
        self.channels.read().await.get(channel_id).cloned()
    }
}
