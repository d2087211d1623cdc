//! # Event Payloads
//!
//! An [`Event`] pairs an [`EventType`] with a payload. The waiting machinery
//! never looks inside the payload; interpreting it is left to the predicates
//! and handlers supplied by callers.

use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event_type::EventType;

pub type MessageId = String;
pub type ChannelId = String;
pub type UserId = String;

/// A single inbound occurrence from the messaging platform.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    pub event_type: EventType,
    pub payload: Payload,
    pub received_at: DateTime<Utc>,
}

impl Event {
    pub fn new(event_type: EventType, payload: Payload) -> Self {
        Self {
            event_type,
            payload,
            received_at: Utc::now(),
        }
    }

    pub fn interaction(interaction: Interaction) -> Self {
        Self::new(
            EventType::InteractionCreate,
            Payload::Interaction(interaction),
        )
    }

    pub fn message_create(message: Message) -> Self {
        Self::new(EventType::MessageCreate, Payload::Message(message))
    }

    pub fn reaction_add(reaction: Reaction) -> Self {
        Self::new(EventType::MessageReactionAdd, Payload::Reaction(reaction))
    }

    pub fn as_interaction(&self) -> Option<&Interaction> {
        match &self.payload {
            Payload::Interaction(interaction) => Some(interaction),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match &self.payload {
            Payload::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_reaction(&self) -> Option<&Reaction> {
        match &self.payload {
            Payload::Reaction(reaction) => Some(reaction),
            _ => None,
        }
    }

    pub fn parameter(&self, key: &str) -> Option<&Value> {
        match &self.payload {
            Payload::Parameters(parameters) => parameters.get(key),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    Interaction(Interaction),
    Message(Message),
    Reaction(Reaction),
    /// Free-form payload for kinds without a dedicated shape.
    Parameters(HashMap<String, Value>),
    #[default]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionKind {
    Ping,
    ApplicationCommand,
    #[default]
    MessageComponent,
    Autocomplete,
    ModalSubmit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComponentType {
    ActionRow,
    #[default]
    Button,
    SelectMenu,
    TextInput,
}

/// A user-triggered interaction, typically a button press on a rendered message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub kind: InteractionKind,
    pub component_type: Option<ComponentType>,
    /// The custom id of the pressed component; routes to a widget handler.
    pub action_id: String,
    pub user_id: UserId,
    pub channel_id: ChannelId,
    /// The message the component belongs to.
    pub message_id: Option<MessageId>,
}

impl Interaction {
    /// True when this is a button press on `message_id`.
    pub fn is_button_on(&self, message_id: &str) -> bool {
        self.kind == InteractionKind::MessageComponent
            && self.component_type == Some(ComponentType::Button)
            && self.message_id.as_deref() == Some(message_id)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub author_is_bot: bool,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reaction {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub emoji: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    List(Vec<Value>),
    Duration(Duration),
    Map(HashMap<String, Value>),
    Null,
}

impl<T: Into<String>> From<T> for Value
where
    T: AsRef<str>,
{
    fn from(value: T) -> Self {
        Value::String(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button_press(message_id: Option<&str>) -> Interaction {
        Interaction {
            id: "i1".to_string(),
            kind: InteractionKind::MessageComponent,
            component_type: Some(ComponentType::Button),
            action_id: "Next".to_string(),
            user_id: "u1".to_string(),
            channel_id: "c1".to_string(),
            message_id: message_id.map(str::to_string),
        }
    }

    #[test]
    fn test_is_button_on() {
        assert!(button_press(Some("m1")).is_button_on("m1"));
        assert!(!button_press(Some("m2")).is_button_on("m1"));
        assert!(!button_press(None).is_button_on("m1"));

        let mut select = button_press(Some("m1"));
        select.component_type = Some(ComponentType::SelectMenu);
        assert!(!select.is_button_on("m1"));

        let mut command = button_press(Some("m1"));
        command.kind = InteractionKind::ApplicationCommand;
        assert!(!command.is_button_on("m1"));
    }

    #[test]
    fn test_payload_accessors() {
        let event = Event::interaction(button_press(Some("m1")));
        assert_eq!(event.event_type, EventType::InteractionCreate);
        assert!(event.as_interaction().is_some());
        assert!(event.as_message().is_none());

        let mut params = HashMap::new();
        params.insert("retry_after".to_string(), Value::Integer(5));
        let event = Event::new(EventType::RateLimit, Payload::Parameters(params));
        assert_eq!(event.parameter("retry_after"), Some(&Value::Integer(5)));
        assert_eq!(event.parameter("missing"), None);
    }
}
