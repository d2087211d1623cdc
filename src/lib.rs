//! # herald
//!
//! Event waiting and interactive message widgets for chat bots.
//!
//! - [`event`]: one-shot waits on inbound platform events, routed by kind
//! - [`ui`]: the [`Widget`](ui::Widget) control loop and the
//!   [`Paginator`](ui::Paginator) built on it
//! - [`platform`]: the boundary to the messaging client, plus an in-memory
//!   implementation
//! - [`config`]: JSON configuration for timeouts, whitelists and paging

pub mod config;
pub mod error;
pub mod event;
pub mod platform;
pub mod ui;

// Re-exports
pub use error::*;
pub use event::{Event, EventType, EventWaiter};
pub use ui::{Paginator, Widget, WidgetPhase};
