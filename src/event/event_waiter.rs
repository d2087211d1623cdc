//! # Event Waiter
//!
//! Maps every known [`EventType`] to its [`WaitingList`] and exposes the one
//! suspension point of the subsystem, [`EventWaiter::wait_for`].
//!
//! The mapping is built once in the constructor and never mutated afterwards,
//! so lookups take no lock. Share the waiter behind an `Arc` and hand it to
//! whatever needs to wait.
//!
//! ## Wiring
//!
//! ```text
//! ┌──────────┐ raw event ┌─────────────┐ by kind ┌─────────────┐ match ┌────────┐
//! │EventSource│─────────▶│ EventWaiter │────────▶│ WaitingList │──────▶│ waiter │
//! └──────────┘ (1 task)  └─────────────┘         └─────────────┘       └────────┘
//! ```

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{debug, instrument, trace};

use super::{
    event_type::EventType,
    payload::Event,
    waiting_list::{PendingEvent, Subscription, WaitingList},
};
use crate::platform::EventSource;

#[derive(Debug)]
pub struct EventWaiter {
    lists: HashMap<EventType, Arc<WaitingList>>,
    next_id: AtomicU64,
}

impl Default for EventWaiter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventWaiter {
    /// Creates a waiter with one list for every known event kind.
    pub fn new() -> Self {
        Self::with_kinds(EventType::iter())
    }

    /// Creates a waiter that only tracks the given kinds.
    pub fn with_kinds(kinds: impl IntoIterator<Item = EventType>) -> Self {
        let lists = kinds
            .into_iter()
            .map(|kind| (kind, Arc::new(WaitingList::new(kind))))
            .collect();
        Self {
            lists,
            next_id: AtomicU64::new(0),
        }
    }

    pub fn get(&self, event_type: EventType) -> Option<&Arc<WaitingList>> {
        self.lists.get(&event_type)
    }

    pub fn kinds(&self) -> impl Iterator<Item = EventType> + '_ {
        self.lists.keys().copied()
    }

    /// Registers a one-shot subscription and returns its receiving side
    /// without waiting on it.
    pub async fn subscribe<F>(&self, event_type: EventType, predicate: F) -> WaitResult<PendingEvent>
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        let list = self
            .get(event_type)
            .ok_or(WaitError::UnregisteredKind(event_type))?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (subscription, pending) = Subscription::new(id, event_type, predicate);
        list.add(subscription).await;
        Ok(pending)
    }

    /// Waits for the next event of `event_type` that satisfies `predicate`.
    ///
    /// Returns the event, or [`WaitError::Timeout`] when nothing matched in
    /// time. A delivery that lands while the timer fires still wins: exactly
    /// one of the two outcomes is reported.
    #[instrument(skip(self, predicate))]
    pub async fn wait_for<F>(
        &self,
        event_type: EventType,
        timeout: Duration,
        predicate: F,
    ) -> WaitResult<Event>
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        let mut pending = self.subscribe(event_type, predicate).await?;

        match tokio::time::timeout(timeout, &mut pending).await {
            Ok(Some(event)) => {
                debug!(id = pending.id(), "event delivered");
                Ok(event)
            }
            Ok(None) => Err(WaitError::ChannelClosed),
            Err(_) => match pending.close() {
                Some(event) => {
                    debug!(id = pending.id(), "event delivered as the timer fired");
                    Ok(event)
                }
                None => {
                    debug!(id = pending.id(), "wait timed out");
                    Err(WaitError::Timeout {
                        event_type,
                        timeout,
                    })
                }
            },
        }
    }

    /// Runs a traverse pass for `event` on its kind's list.
    pub async fn dispatch(&self, event: &Event) -> usize {
        match self.lists.get(&event.event_type) {
            Some(list) => list.traverse(event).await,
            None => {
                trace!(event_type = %event.event_type, "no waiting list for event kind");
                0
            }
        }
    }

    /// Registers one callback per tracked kind on `source`. Each inbound
    /// event is traversed on its own task.
    pub fn attach<S>(self: &Arc<Self>, source: &S)
    where
        S: EventSource + ?Sized,
    {
        for event_type in self.kinds() {
            let waiter = Arc::clone(self);
            source.add_handler(
                event_type,
                Arc::new(move |event: Event| {
                    let waiter = Arc::clone(&waiter);
                    tokio::spawn(async move {
                        waiter.dispatch(&event).await;
                    });
                }),
            );
        }
        debug!(kinds = self.lists.len(), "event waiter attached to source");
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WaitError {
    #[error("Wait for {event_type} timed out after {timeout:?}")]
    Timeout {
        event_type: EventType,
        timeout: Duration,
    },
    #[error("Subscription channel closed before delivery")]
    ChannelClosed,
    #[error("No waiting list registered for {0}")]
    UnregisteredKind(EventType),
}

pub type WaitResult<T> = Result<T, WaitError>;

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::event::payload::{Message, Payload, Value};

    fn message_from(author: &str, content: &str) -> Event {
        Event::message_create(Message {
            id: format!("m-{}", content),
            channel_id: "c1".to_string(),
            author_id: author.to_string(),
            content: content.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_every_kind_registered() {
        let waiter = EventWaiter::new();
        for kind in EventType::iter() {
            assert!(waiter.get(kind).is_some(), "missing list for {}", kind);
        }
    }

    #[tokio::test]
    async fn test_wait_for_receives_match() {
        let waiter = Arc::new(EventWaiter::new());

        let task = tokio::spawn({
            let waiter = waiter.clone();
            async move {
                waiter
                    .wait_for(EventType::MessageCreate, Duration::from_secs(1), |e| {
                        e.as_message().is_some_and(|m| m.author_id == "alice")
                    })
                    .await
            }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(waiter.dispatch(&message_from("bob", "hi")).await, 0);
        assert_eq!(waiter.dispatch(&message_from("alice", "hello")).await, 1);

        let event = task.await.unwrap().unwrap();
        assert_eq!(event.as_message().unwrap().content, "hello");
    }

    #[tokio::test]
    async fn test_wait_for_times_out_and_is_pruned() {
        let waiter = EventWaiter::new();
        let result = waiter
            .wait_for(EventType::MessageCreate, Duration::from_millis(30), |_| true)
            .await;

        assert_eq!(
            result,
            Err(WaitError::Timeout {
                event_type: EventType::MessageCreate,
                timeout: Duration::from_millis(30),
            })
        );

        let list = waiter.get(EventType::MessageCreate).unwrap();
        // Still linked until the next pass.
        assert_eq!(list.len().await, 1);
        assert_eq!(waiter.dispatch(&message_from("alice", "late")).await, 0);
        assert!(list.is_empty().await);
    }

    #[tokio::test]
    async fn test_unregistered_kind() {
        let waiter = EventWaiter::with_kinds([EventType::MessageCreate]);
        let result = waiter
            .wait_for(EventType::Ready, Duration::from_millis(10), |_| true)
            .await;
        assert_eq!(result, Err(WaitError::UnregisteredKind(EventType::Ready)));

        let mut params = HashMap::new();
        params.insert("session".to_string(), Value::from("s1"));
        let ready = Event::new(EventType::Ready, Payload::Parameters(params));
        assert_eq!(waiter.dispatch(&ready).await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_then_drop_closes() {
        let waiter = EventWaiter::new();
        let pending = waiter
            .subscribe(EventType::MessageCreate, |_| true)
            .await
            .unwrap();
        drop(pending);

        assert_eq!(waiter.dispatch(&message_from("alice", "x")).await, 0);
        assert!(waiter
            .get(EventType::MessageCreate)
            .unwrap()
            .is_empty()
            .await);
    }
}
