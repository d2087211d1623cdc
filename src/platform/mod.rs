//! # Platform Boundary
//!
//! The gateway/REST client lives outside this crate. Everything herald needs
//! from it is captured by two traits:
//!
//! - [`EventSource`]: register a callback for each raw inbound event of a kind
//! - [`Platform`]: send, update, strip controls from, and delete messages
//!
//! [`memory::InMemoryPlatform`] implements both in-process.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    event::{ChannelId, Event, EventType, Interaction, MessageId},
    ui::component::MessageContent,
};

/// Callback invoked for every raw inbound event of one kind.
pub type EventCallback = Arc<dyn Fn(Event) + Send + Sync>;

pub trait EventSource: Send + Sync {
    fn add_handler(&self, event_type: EventType, callback: EventCallback);
}

#[mockall::automock]
#[async_trait]
pub trait Platform: Send + Sync {
    /// Sends a new message and returns its id.
    async fn send(&self, channel_id: &str, content: &MessageContent) -> PlatformResult<MessageId>;

    /// Re-renders `message_id` in response to `interaction`, acknowledging it in place.
    async fn update(
        &self,
        message_id: &str,
        content: &MessageContent,
        interaction: &Interaction,
    ) -> PlatformResult<()>;

    /// Removes every interactive component from a rendered message.
    async fn clear_controls(&self, channel_id: &str, message_id: &str) -> PlatformResult<()>;

    async fn delete(&self, channel_id: &str, message_id: &str) -> PlatformResult<()>;
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlatformError {
    #[error("Failed to send message to {channel_id}: {message}")]
    SendFailed {
        channel_id: ChannelId,
        message: String,
    },
    #[error("Failed to update message {message_id}: {message}")]
    UpdateFailed {
        message_id: MessageId,
        message: String,
    },
    #[error("Failed to delete message {message_id}: {message}")]
    DeleteFailed {
        message_id: MessageId,
        message: String,
    },
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),
}

pub type PlatformResult<T> = Result<T, PlatformError>;
