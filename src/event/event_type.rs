//! # Event Types
//!
//! The closed set of event kinds the platform gateway can emit, plus a handful
//! of synthetic kinds raised by the client itself (connect, disconnect, rate
//! limit). Every kind gets exactly one waiting list in the
//! [`EventWaiter`](super::event_waiter::EventWaiter).
//!
//! The string form of each kind is the gateway name (`MESSAGE_CREATE`,
//! `INTERACTION_CREATE`, ...). Synthetic kinds use a double-underscore form
//! (`__CONNECT__`) so they can never collide with a real gateway name.

use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // Channel
    ChannelCreate,
    ChannelDelete,
    ChannelPinsUpdate,
    ChannelUpdate,
    // Guild
    GuildBanAdd,
    GuildBanRemove,
    GuildCreate,
    GuildDelete,
    GuildEmojisUpdate,
    GuildIntegrationsUpdate,
    GuildMemberAdd,
    GuildMemberRemove,
    GuildMemberUpdate,
    GuildMembersChunk,
    GuildRoleCreate,
    GuildRoleDelete,
    GuildRoleUpdate,
    GuildUpdate,
    // Interaction
    #[default]
    InteractionCreate,
    // Message
    MessageAck,
    MessageCreate,
    MessageDelete,
    MessageDeleteBulk,
    MessageReactionAdd,
    MessageReactionRemove,
    MessageReactionRemoveAll,
    MessageUpdate,
    // Presence / user
    PresenceUpdate,
    PresencesReplace,
    Ready,
    RelationshipAdd,
    RelationshipRemove,
    Resumed,
    TypingStart,
    UserGuildSettingsUpdate,
    UserNoteUpdate,
    UserSettingsUpdate,
    UserUpdate,
    VoiceServerUpdate,
    VoiceStateUpdate,
    WebhooksUpdate,
    // Synthetic
    #[strum(serialize = "__INTERFACE__")]
    #[serde(rename = "__INTERFACE__")]
    Interface,
    #[strum(serialize = "__CONNECT__")]
    #[serde(rename = "__CONNECT__")]
    Connect,
    #[strum(serialize = "__DISCONNECT__")]
    #[serde(rename = "__DISCONNECT__")]
    Disconnect,
    #[strum(serialize = "__EVENT__")]
    #[serde(rename = "__EVENT__")]
    Event,
    #[strum(serialize = "__RATE_LIMIT__")]
    #[serde(rename = "__RATE_LIMIT__")]
    RateLimit,
}

/// Broad grouping of event kinds, mostly useful for choosing a log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum EventCategory {
    Lifecycle,
    Channel,
    Guild,
    Interaction,
    Message,
    Reaction,
    User,
    Synthetic,
}

impl EventType {
    pub fn category(&self) -> EventCategory {
        match self {
            EventType::Ready | EventType::Resumed => EventCategory::Lifecycle,
            EventType::ChannelCreate
            | EventType::ChannelDelete
            | EventType::ChannelPinsUpdate
            | EventType::ChannelUpdate
            | EventType::WebhooksUpdate => EventCategory::Channel,
            EventType::GuildBanAdd
            | EventType::GuildBanRemove
            | EventType::GuildCreate
            | EventType::GuildDelete
            | EventType::GuildEmojisUpdate
            | EventType::GuildIntegrationsUpdate
            | EventType::GuildMemberAdd
            | EventType::GuildMemberRemove
            | EventType::GuildMemberUpdate
            | EventType::GuildMembersChunk
            | EventType::GuildRoleCreate
            | EventType::GuildRoleDelete
            | EventType::GuildRoleUpdate
            | EventType::GuildUpdate => EventCategory::Guild,
            EventType::InteractionCreate => EventCategory::Interaction,
            EventType::MessageAck
            | EventType::MessageCreate
            | EventType::MessageDelete
            | EventType::MessageDeleteBulk
            | EventType::MessageUpdate
            | EventType::TypingStart => EventCategory::Message,
            EventType::MessageReactionAdd
            | EventType::MessageReactionRemove
            | EventType::MessageReactionRemoveAll => EventCategory::Reaction,
            EventType::PresenceUpdate
            | EventType::PresencesReplace
            | EventType::RelationshipAdd
            | EventType::RelationshipRemove
            | EventType::UserGuildSettingsUpdate
            | EventType::UserNoteUpdate
            | EventType::UserSettingsUpdate
            | EventType::UserUpdate
            | EventType::VoiceServerUpdate
            | EventType::VoiceStateUpdate => EventCategory::User,
            EventType::Interface
            | EventType::Connect
            | EventType::Disconnect
            | EventType::Event
            | EventType::RateLimit => EventCategory::Synthetic,
        }
    }

    /// True for kinds raised by the client rather than the gateway.
    pub fn is_synthetic(&self) -> bool {
        self.category() == EventCategory::Synthetic
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_gateway_names() {
        assert_eq!(EventType::MessageCreate.to_string(), "MESSAGE_CREATE");
        assert_eq!(
            EventType::MessageReactionRemoveAll.to_string(),
            "MESSAGE_REACTION_REMOVE_ALL"
        );
        assert_eq!(EventType::RateLimit.to_string(), "__RATE_LIMIT__");
        assert_eq!(
            EventType::from_str("INTERACTION_CREATE").unwrap(),
            EventType::InteractionCreate
        );
        assert_eq!(
            EventType::from_str("__CONNECT__").unwrap(),
            EventType::Connect
        );
        assert!(EventType::from_str("NOT_A_KIND").is_err());
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<String> = EventType::iter().map(|e| e.to_string()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
        assert_eq!(total, 46);
    }

    #[test]
    fn test_serde_uses_gateway_names() {
        let json = serde_json::to_string(&EventType::GuildMemberAdd).unwrap();
        assert_eq!(json, "\"GUILD_MEMBER_ADD\"");
        let parsed: EventType = serde_json::from_str("\"__DISCONNECT__\"").unwrap();
        assert_eq!(parsed, EventType::Disconnect);
    }

    #[test]
    fn test_category() {
        assert_eq!(
            EventType::InteractionCreate.category(),
            EventCategory::Interaction
        );
        assert!(EventType::Connect.is_synthetic());
        assert!(!EventType::MessageCreate.is_synthetic());
    }
}
