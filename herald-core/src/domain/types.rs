//! Domain change notifications emitted by the persistence layer

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::event::RecipientId;

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Created,
    Updated,
    Removed,
}

/// Kinds of entity the hub knows how to route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Message,
    Channel,
    Membership,
    Invitation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub channel_id: String,
    pub author_id: RecipientId,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub public: bool,
    pub owner_id: RecipientId,
    #[serde(default)]
    pub member_ids: BTreeSet<RecipientId>,
}

/// A user joining or leaving a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub channel_id: String,
    pub user_id: RecipientId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationRecord {
    pub id: String,
    pub channel_id: String,
    pub inviter_id: RecipientId,
    pub invitee_id: RecipientId,
    #[serde(default)]
    pub status: InvitationStatus,
}

/// The changed entity, tagged by kind on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Message(MessageRecord),
    Channel(ChannelRecord),
    Membership(MembershipRecord),
    Invitation(InvitationRecord),
    /// Any kind the hub does not route
    #[serde(other)]
    Unknown,
}

impl Entity {
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            Entity::Message(_) => Some(EntityKind::Message),
            Entity::Channel(_) => Some(EntityKind::Channel),
            Entity::Membership(_) => Some(EntityKind::Membership),
            Entity::Invitation(_) => Some(EntityKind::Invitation),
            Entity::Unknown => None,
        }
    }
}

/// A lifecycle notification for one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityChange {
    pub lifecycle: Lifecycle,
    pub entity: Entity,
}

impl EntityChange {
    pub fn new(lifecycle: Lifecycle, entity: Entity) -> Self {
        Self { lifecycle, entity }
    }

    pub fn created(entity: Entity) -> Self {
        Self::new(Lifecycle::Created, entity)
    }

    pub fn updated(entity: Entity) -> Self {
        Self::new(Lifecycle::Updated, entity)
    }

    pub fn removed(entity: Entity) -> Self {
        Self::new(Lifecycle::Removed, entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_deserializes_from_tagged_json() {
        let json = serde_json::json!({
            "lifecycle": "created",
            "entity": {
                "kind": "message",
                "id": "m1",
                "channel_id": "c1",
                "author_id": "u1",
                "content": "hi"
            }
        });

        let change: EntityChange = serde_json::from_value(json).unwrap();
        assert_eq!(change.lifecycle, Lifecycle::Created);
        assert_eq!(change.entity.kind(), Some(EntityKind::Message));
        match change.entity {
            Entity::Message(message) => {
                assert_eq!(message.channel_id, "c1");
                assert_eq!(message.author_id, RecipientId::from("u1"));
            }
            other => panic!("unexpected entity {:?}", other),
        }
    }

    #[test]
    fn unknown_kind_deserializes_to_unknown() {
        let json = serde_json::json!({
            "lifecycle": "updated",
            "entity": { "kind": "user", "id": "u1", "email": "x@example.com" }
        });

        let change: EntityChange = serde_json::from_value(json).unwrap();
        assert_eq!(change.entity, Entity::Unknown);
        assert_eq!(change.entity.kind(), None);
    }

    #[test]
    fn channel_defaults_to_private_without_members() {
        let json = serde_json::json!({
            "kind": "channel",
            "id": "c1",
            "name": "general",
            "owner_id": "u1"
        });

        let entity: Entity = serde_json::from_value(json).unwrap();
        match entity {
            Entity::Channel(channel) => {
                assert!(!channel.public);
                assert!(channel.member_ids.is_empty());
            }
            other => panic!("unexpected entity {:?}", other),
        }
    }

    #[test]
    fn invitation_status_defaults_to_pending() {
        let json = serde_json::json!({
            "kind": "invitation",
            "id": "i1",
            "channel_id": "c1",
            "inviter_id": "u1",
            "invitee_id": "u2"
        });

        let entity: Entity = serde_json::from_value(json).unwrap();
        assert!(matches!(
            entity,
            Entity::Invitation(InvitationRecord { status: InvitationStatus::Pending, .. })
        ));
    }
}
