//! # Waiting List
//!
//! A per-kind registry of one-shot subscriptions. Each inbound event of the
//! list's kind triggers one traverse pass that walks every subscription once:
//!
//! ```text
//!   closed?  ──yes──▶ unlink, no delivery
//!     │no
//!   predicate(event)? ──yes──▶ deliver through the oneshot, unlink
//!     │no
//!   retain in the rebuilt live set
//! ```
//!
//! The live set replaces the old one at the end of the pass, so pruning needs
//! no separate sweep. All mutation and traversal serialize on one lock per
//! list; lists hold active waiters only, so they stay short.

use std::{
    future::Future,
    panic::{catch_unwind, AssertUnwindSafe},
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    task::{Context, Poll},
};

use tokio::sync::{oneshot, Mutex};
use tracing::{trace, warn};

use super::{event_type::EventType, payload::Event};

pub type SubscriptionId = u64;

/// Predicate deciding whether a subscription wants a given event.
pub type Predicate = Box<dyn Fn(&Event) -> bool + Send + Sync>;

/// The list-side half of a one-shot subscription.
///
/// Owned by the [`WaitingList`] that holds it until it is delivered or pruned.
pub struct Subscription {
    id: SubscriptionId,
    predicate: Predicate,
    sender: oneshot::Sender<Event>,
    closed: Arc<AtomicBool>,
}

impl Subscription {
    /// Creates a subscription together with the [`PendingEvent`] that receives its delivery.
    pub fn new<F>(id: SubscriptionId, event_type: EventType, predicate: F) -> (Self, PendingEvent)
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let closed = Arc::new(AtomicBool::new(false));
        (
            Self {
                id,
                predicate: Box::new(predicate),
                sender,
                closed: closed.clone(),
            },
            PendingEvent {
                id,
                event_type,
                receiver,
                closed,
            },
        )
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Closed either explicitly or because the receiving side went away.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.sender.is_closed()
    }

    /// `None` if the predicate panicked.
    fn matches(&self, event: &Event) -> Option<bool> {
        catch_unwind(AssertUnwindSafe(|| (self.predicate)(event))).ok()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// The waiting side of a subscription. Resolves to the delivered event, or to
/// `None` if the subscription was dropped without a delivery.
///
/// Dropping a `PendingEvent` closes its subscription; the list unlinks it on
/// its next traverse pass.
#[derive(Debug)]
pub struct PendingEvent {
    id: SubscriptionId,
    event_type: EventType,
    receiver: oneshot::Receiver<Event>,
    closed: Arc<AtomicBool>,
}

impl PendingEvent {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Closes the subscription and returns an event if one was delivered
    /// before the close took effect. No delivery can happen afterwards.
    pub fn close(&mut self) -> Option<Event> {
        self.closed.store(true, Ordering::Release);
        self.receiver.close();
        self.receiver.try_recv().ok()
    }
}

impl Future for PendingEvent {
    type Output = Option<Event>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(Result::ok)
    }
}

impl Drop for PendingEvent {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct WaitingList {
    event_type: EventType,
    nodes: Mutex<Vec<Subscription>>,
}

impl WaitingList {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            nodes: Mutex::new(Vec::new()),
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Appends a subscription to the tail of the list.
    pub async fn add(&self, subscription: Subscription) {
        let mut nodes = self.nodes.lock().await;
        trace!(
            event_type = %self.event_type,
            id = subscription.id,
            "subscription added"
        );
        nodes.push(subscription);
    }

    /// Runs one pass over the list for `event` and returns how many
    /// subscriptions received it.
    ///
    /// After the pass the list holds exactly the subscriptions that were open
    /// and did not match. A subscription is delivered at most once.
    pub async fn traverse(&self, event: &Event) -> usize {
        let mut nodes = self.nodes.lock().await;
        if nodes.is_empty() {
            return 0;
        }

        let mut live = Vec::with_capacity(nodes.len());
        let mut delivered = 0;
        let mut pruned = 0;

        for node in nodes.drain(..) {
            if node.is_closed() {
                pruned += 1;
                continue;
            }
            let matched = match node.matches(event) {
                Some(matched) => matched,
                None => {
                    warn!(event_type = %self.event_type, id = node.id, "predicate panicked, dropping subscription");
                    pruned += 1;
                    continue;
                }
            };
            if matched {
                let id = node.id;
                // The receiver may have closed since the check above.
                match node.sender.send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(_) => {
                        trace!(event_type = %self.event_type, id, "receiver gone, skipping");
                        pruned += 1;
                    }
                }
                continue;
            }
            live.push(node);
        }

        trace!(
            event_type = %self.event_type,
            delivered,
            pruned,
            remaining = live.len(),
            "traverse pass complete"
        );
        *nodes = live;
        delivered
    }

    pub async fn len(&self) -> usize {
        self.nodes.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.lock().await.is_empty()
    }
}
