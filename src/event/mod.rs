//! # Event Distribution
//!
//! Lets any number of call sites wait for "the next event like this one"
//! without owning the gateway connection.
//!
//! ## Components
//!
//! - **EventType**: the closed taxonomy of platform and synthetic event kinds
//! - **Event / Payload**: an inbound occurrence, opaque to the waiting machinery
//! - **WaitingList**: per-kind list of one-shot, predicate-gated subscriptions
//! - **EventWaiter**: kind → list registry with the blocking `wait_for`
//!
//! ## Lifecycle of a Subscription
//!
//! ```text
//!  wait_for ──▶ add to list ──▶ traverse pass ──match──▶ delivered ──▶ unlinked
//!                   │                  │
//!                   │               no match ──▶ retained
//!                   │
//!                   └── timeout ──▶ closed ──▶ unlinked on the next pass
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! # use herald::event::{EventType, EventWaiter};
//! # use std::{sync::Arc, time::Duration};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let waiter = Arc::new(EventWaiter::new());
//!
//! let reply = waiter
//!     .wait_for(EventType::MessageCreate, Duration::from_secs(30), |event| {
//!         event.as_message().is_some_and(|m| m.author_id == "1234")
//!     })
//!     .await?;
//! println!("{:?}", reply.as_message());
//! # Ok(())
//! # }
//! ```

pub mod event_type;
pub mod event_waiter;
pub mod payload;
pub mod waiting_list;

pub use event_type::{EventCategory, EventType};
pub use event_waiter::{EventWaiter, WaitError, WaitResult};
pub use payload::{
    ChannelId, ComponentType, Event, Interaction, InteractionKind, Message, MessageId, Payload,
    Reaction, UserId, Value,
};
pub use waiting_list::{PendingEvent, Subscription, SubscriptionId, WaitingList};
