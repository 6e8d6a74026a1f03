//! Translation of domain lifecycle notifications into hub events
//!
//! | Entity     | Created            | Updated            | Removed            | Recipients                      |
//! |------------|--------------------|--------------------|--------------------|---------------------------------|
//! | Message    | message-created    | message-updated    | message-deleted    | channel members                 |
//! | Channel    | channel-created    | channel-updated    | channel-deleted    | everyone if public, else members|
//! | Membership | channel-updated    | channel-updated    | channel-updated    | members after the change        |
//! | Invitation | invitation-created | invitation-updated | invitation-deleted | invitee (+ inviter on upd/del)  |

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::directory::ChannelDirectory;
use super::types::{Entity, EntityChange, EntityKind, Lifecycle};
use crate::event::{EventId, Recipients};
use crate::hub::Hub;

/// Event name for an entity kind and lifecycle
pub const fn event_name(kind: EntityKind, lifecycle: Lifecycle) -> &'static str {
    match (kind, lifecycle) {
        (EntityKind::Message, Lifecycle::Created) => "message-created",
        (EntityKind::Message, Lifecycle::Updated) => "message-updated",
        (EntityKind::Message, Lifecycle::Removed) => "message-deleted",
        (EntityKind::Channel, Lifecycle::Created) => "channel-created",
        (EntityKind::Channel, Lifecycle::Updated) => "channel-updated",
        (EntityKind::Channel, Lifecycle::Removed) => "channel-deleted",
        (EntityKind::Membership, _) => "channel-updated",
        (EntityKind::Invitation, Lifecycle::Created) => "invitation-created",
        (EntityKind::Invitation, Lifecycle::Updated) => "invitation-updated",
        (EntityKind::Invitation, Lifecycle::Removed) => "invitation-deleted",
    }
}

/// A routed event ready to publish
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub name: &'static str,
    pub payload: serde_json::Value,
    pub recipients: Recipients,
}

/// Converts entity changes into routed hub events
pub struct DomainEventAdapter {
    directory: Arc<dyn ChannelDirectory>,
}

impl DomainEventAdapter {
    pub fn new(directory: Arc<dyn ChannelDirectory>) -> Self {
        Self { directory }
    }

    /// Resolve name, payload and recipients for a change.
    ///
    /// `None` means the change produces no event: unknown entity kind,
    /// unresolvable channel, nobody to notify, or an unserializable payload.
    pub async fn route(&self, change: &EntityChange) -> Option<Route> {
        let Some(kind) = change.entity.kind() else {
            debug!(lifecycle = ?change.lifecycle, "Ignoring change for unrouted entity kind");
            return None;
        };
        let name = event_name(kind, change.lifecycle);

        let (payload, recipients) = match &change.entity {
            Entity::Message(message) => {
                let channel = self.lookup(&message.channel_id, name).await?;
                (to_payload(message)?, Recipients::Only(channel.member_ids))
            }
            Entity::Channel(channel) => {
                let recipients = if channel.public {
                    Recipients::All
                } else if channel.member_ids.is_empty() {
                    // Deletions often carry only the id; use the known members
                    let members = self
                        .directory
                        .channel(&channel.id)
                        .await
                        .map(|known| known.member_ids)
                        .unwrap_or_default();
                    Recipients::Only(members)
                } else {
                    Recipients::Only(channel.member_ids.clone())
                };
                (to_payload(channel)?, recipients)
            }
            Entity::Membership(membership) => {
                let channel = self.lookup(&membership.channel_id, name).await?;
                let payload = to_payload(&channel)?;
                (payload, Recipients::Only(channel.member_ids))
            }
            Entity::Invitation(invitation) => {
                let recipients = match change.lifecycle {
                    Lifecycle::Created => Recipients::only([invitation.invitee_id.clone()]),
                    Lifecycle::Updated | Lifecycle::Removed => Recipients::only([
                        invitation.invitee_id.clone(),
                        invitation.inviter_id.clone(),
                    ]),
                };
                (to_payload(invitation)?, recipients)
            }
            Entity::Unknown => return None,
        };

        if matches!(&recipients, Recipients::Only(ids) if ids.is_empty()) {
            debug!(name, "No recipients for change, skipping");
            return None;
        }

        Some(Route {
            name,
            payload,
            recipients,
        })
    }

    /// Route a change and publish it. Returns the event id, or `None` when
    /// the change was ignored.
    pub async fn publish(&self, hub: &Hub, change: &EntityChange) -> Option<EventId> {
        let route = self.route(change).await?;
        let id = hub
            .publish(route.name, Some(route.payload), route.recipients)
            .await;
        Some(id)
    }

    async fn lookup(&self, channel_id: &str, name: &str) -> Option<super::types::ChannelRecord> {
        let channel = self.directory.channel(channel_id).await;
        if channel.is_none() {
            debug!(channel = %channel_id, name, "Channel not found, skipping change");
        }
        channel
    }
}

fn to_payload<T: Serialize>(record: &T) -> Option<serde_json::Value> {
    serde_json::to_value(record)
        .inspect_err(|e| warn!(error = %e, "Failed to serialize change payload"))
        .ok()
}
