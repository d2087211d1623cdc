//! # Interactive UI
//!
//! [`Widget`] runs a button-driven control loop on one rendered message;
//! [`Paginator`] specializes it for page navigation. [`component`] holds the
//! renderable content both of them send to the platform.

pub mod component;
pub mod paginator;
pub mod widget;

pub use component::{ActionRow, Button, ButtonStyle, Embed, MessageContent};
pub use paginator::Paginator;
pub use widget::{Widget, WidgetError, WidgetHandler, WidgetPhase, WidgetResult};
