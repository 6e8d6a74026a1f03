//! Domain event adapter
//!
//! Turns lifecycle notifications for messages, channels, memberships and
//! invitations into named hub events addressed to the right recipients.

mod adapter;
mod directory;
mod types;

pub use adapter::{DomainEventAdapter, Route, event_name};
pub use directory::{ChannelDirectory, InMemoryChannelDirectory};
pub use types::{
    ChannelRecord, Entity, EntityChange, EntityKind, InvitationRecord, InvitationStatus,
    Lifecycle, MembershipRecord, MessageRecord,
};
