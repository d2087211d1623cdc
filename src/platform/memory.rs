//! In-process platform: keeps rendered messages in memory and lets callers
//! inject inbound events. Backs the demo binary and the test suites.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, trace};
use uuid::Uuid;

use super::{EventCallback, EventSource, Platform, PlatformError, PlatformResult};
use crate::{
    event::{
        ChannelId, ComponentType, Event, EventType, Interaction, InteractionKind, Message,
        MessageId, UserId,
    },
    ui::component::MessageContent,
};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub content: MessageContent,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

/// One outbound call, in the order the platform received it.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    Send {
        channel_id: ChannelId,
        message_id: MessageId,
    },
    Update {
        message_id: MessageId,
        interaction_id: String,
    },
    ClearControls {
        message_id: MessageId,
    },
    Delete {
        message_id: MessageId,
    },
}

#[derive(Default)]
pub struct InMemoryPlatform {
    handlers: DashMap<EventType, Vec<EventCallback>>,
    messages: DashMap<MessageId, StoredMessage>,
    calls: Mutex<Vec<PlatformCall>>,
    offline: AtomicBool,
    interaction_seq: AtomicU64,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every outbound call fail until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }

    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Acquire)
    }

    /// Hands `event` to every callback registered for its kind and returns
    /// how many were invoked. Must be called from within a Tokio runtime when
    /// an [`EventWaiter`](crate::event::EventWaiter) is attached.
    pub fn emit(&self, event: Event) -> usize {
        let callbacks = match self.handlers.get(&event.event_type) {
            Some(callbacks) => callbacks.clone(),
            None => return 0,
        };
        trace!(event_type = %event.event_type, callbacks = callbacks.len(), "emitting event");
        for callback in &callbacks {
            callback(event.clone());
        }
        callbacks.len()
    }

    /// Simulates `user_id` pressing the button `action_id` on `message_id`.
    pub fn click(&self, user_id: &str, message_id: &str, action_id: &str) -> Interaction {
        let channel_id = self
            .messages
            .get(message_id)
            .map(|m| m.channel_id.clone())
            .unwrap_or_default();
        let seq = self.interaction_seq.fetch_add(1, Ordering::Relaxed);
        let interaction = Interaction {
            id: format!("interaction-{}", seq),
            kind: InteractionKind::MessageComponent,
            component_type: Some(ComponentType::Button),
            action_id: action_id.to_string(),
            user_id: user_id.to_string(),
            channel_id,
            message_id: Some(message_id.to_string()),
        };
        self.emit(Event::interaction(interaction.clone()));
        interaction
    }

    /// Simulates `author_id` posting `content` in `channel_id`.
    pub fn say(&self, channel_id: &str, author_id: &str, content: &str) -> Message {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            channel_id: channel_id.to_string(),
            author_id: author_id.to_string(),
            author_is_bot: false,
            content: content.to_string(),
        };
        self.messages.insert(
            message.id.clone(),
            StoredMessage {
                id: message.id.clone(),
                channel_id: message.channel_id.clone(),
                content: MessageContent::text(content),
                created_at: Utc::now(),
                edited_at: None,
            },
        );
        self.emit(Event::message_create(message.clone()));
        message
    }

    pub fn message(&self, message_id: &str) -> Option<StoredMessage> {
        self.messages.get(message_id).map(|m| m.clone())
    }

    pub async fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().await.clone()
    }

    /// Id of the most recently sent message, if any.
    pub async fn last_sent(&self) -> Option<MessageId> {
        self.calls
            .lock()
            .await
            .iter()
            .rev()
            .find_map(|call| match call {
                PlatformCall::Send { message_id, .. } => Some(message_id.clone()),
                _ => None,
            })
    }

    pub async fn clear_count(&self, message_id: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| {
                matches!(call, PlatformCall::ClearControls { message_id: id } if id == message_id)
            })
            .count()
    }

    async fn record(&self, call: PlatformCall) {
        self.calls.lock().await.push(call);
    }
}

impl EventSource for InMemoryPlatform {
    fn add_handler(&self, event_type: EventType, callback: EventCallback) {
        self.handlers.entry(event_type).or_default().push(callback);
    }
}

#[async_trait]
impl Platform for InMemoryPlatform {
    async fn send(&self, channel_id: &str, content: &MessageContent) -> PlatformResult<MessageId> {
        if self.is_offline() {
            return Err(PlatformError::SendFailed {
                channel_id: channel_id.to_string(),
                message: "platform offline".to_string(),
            });
        }
        let id = Uuid::new_v4().to_string();
        self.messages.insert(
            id.clone(),
            StoredMessage {
                id: id.clone(),
                channel_id: channel_id.to_string(),
                content: content.clone(),
                created_at: Utc::now(),
                edited_at: None,
            },
        );
        debug!(channel_id, message_id = %id, "message sent");
        self.record(PlatformCall::Send {
            channel_id: channel_id.to_string(),
            message_id: id.clone(),
        })
        .await;
        Ok(id)
    }

    async fn update(
        &self,
        message_id: &str,
        content: &MessageContent,
        interaction: &Interaction,
    ) -> PlatformResult<()> {
        if self.is_offline() {
            return Err(PlatformError::UpdateFailed {
                message_id: message_id.to_string(),
                message: "platform offline".to_string(),
            });
        }
        {
            let mut stored = self
                .messages
                .get_mut(message_id)
                .ok_or_else(|| PlatformError::MessageNotFound(message_id.to_string()))?;
            stored.content = content.clone();
            stored.edited_at = Some(Utc::now());
        }
        self.record(PlatformCall::Update {
            message_id: message_id.to_string(),
            interaction_id: interaction.id.clone(),
        })
        .await;
        Ok(())
    }

    async fn clear_controls(&self, _channel_id: &str, message_id: &str) -> PlatformResult<()> {
        if self.is_offline() {
            return Err(PlatformError::UpdateFailed {
                message_id: message_id.to_string(),
                message: "platform offline".to_string(),
            });
        }
        {
            let mut stored = self
                .messages
                .get_mut(message_id)
                .ok_or_else(|| PlatformError::MessageNotFound(message_id.to_string()))?;
            stored.content.components.clear();
            stored.edited_at = Some(Utc::now());
        }
        self.record(PlatformCall::ClearControls {
            message_id: message_id.to_string(),
        })
        .await;
        Ok(())
    }

    async fn delete(&self, _channel_id: &str, message_id: &str) -> PlatformResult<()> {
        if self.is_offline() {
            return Err(PlatformError::DeleteFailed {
                message_id: message_id.to_string(),
                message: "platform offline".to_string(),
            });
        }
        self.messages
            .remove(message_id)
            .ok_or_else(|| PlatformError::MessageNotFound(message_id.to_string()))?;
        self.record(PlatformCall::Delete {
            message_id: message_id.to_string(),
        })
        .await;
        Ok(())
    }
}
