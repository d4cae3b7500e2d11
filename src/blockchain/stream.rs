//! Broadcast log of chain-head events.
//!
//! The log is a singly linked list that only grows at the tail. Each node's
//! `next` link is written once, under the writer lock, and never changes
//! afterwards, so subscribers walk already-published nodes without locking.
//! Every subscriber keeps its own cursor into the list and its own wake
//! channel; a slow subscriber never holds up the writer or anyone else.
//!
//! Wake channels have room for exactly one token. A push that finds the
//! buffer full skips it: the pending token already tells the subscriber to
//! look again. A subscriber therefore cannot sleep through an event that was
//! linked after it last checked, no matter when the push happens.

use super::event::Event;
use crossbeam_channel::{select, Receiver, Sender, TryRecvError, TrySendError};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

struct EventNode {
    event: Arc<Event>,
    next: OnceCell<Arc<EventNode>>,
}

impl EventNode {
    fn new(event: Arc<Event>) -> Self {
        Self {
            event,
            next: OnceCell::new(),
        }
    }
}

impl Drop for EventNode {
    // Unlink iteratively; a long unobserved chain would otherwise be freed
    // by recursion and overflow the stack.
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut node) => next = node.next.take(),
                Err(_) => break,
            }
        }
    }
}

/// A subscriber as the writer sees it.
struct Registration {
    wake: Sender<()>,
    // Disconnects once the subscription is cancelled.
    cancelled: Receiver<()>,
}

impl Registration {
    /// Deliver a wake token; `false` once the subscription is gone or
    /// cancelled and the registration should be dropped.
    fn notify(&self) -> bool {
        if let Err(TryRecvError::Disconnected) = self.cancelled.try_recv() {
            return false;
        }
        match self.wake.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Disconnected(())) => false,
        }
    }
}

struct StreamInner {
    tail: Arc<EventNode>,
    subscribers: Vec<Registration>,
}

/// Single-writer, multi-reader log of [`Event`]s.
///
/// Nodes are reference counted: the stream itself only holds the tail, so a
/// node is freed once every subscription has moved past it.
pub struct EventStream {
    inner: Mutex<StreamInner>,
    pushed: AtomicU64,
}

impl EventStream {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StreamInner {
                tail: Arc::new(EventNode::new(Arc::new(Event::default()))),
                subscribers: Vec::new(),
            }),
            pushed: AtomicU64::new(0),
        }
    }

    /// Append an event and wake every subscriber.
    ///
    /// Cost is linear in the number of registered subscribers. Subscriptions
    /// that were dropped or cancelled are unregistered during the scan.
    pub fn push(&self, event: Event) {
        let node = Arc::new(EventNode::new(Arc::new(event)));

        let mut inner = self.inner.lock();
        let linked = inner.tail.next.set(Arc::clone(&node)).is_ok();
        debug_assert!(linked, "tail already had a successor");
        inner.tail = node;
        let seq = self.pushed.fetch_add(1, Ordering::Relaxed) + 1;

        let before = inner.subscribers.len();
        inner.subscribers.retain(Registration::notify);
        let pruned = before - inner.subscribers.len();
        if pruned > 0 {
            debug!(pruned, "removed closed subscriptions");
        }
        trace!(seq, subscribers = inner.subscribers.len(), "chain event pushed");
    }

    /// Start a subscription that sees every event pushed from now on.
    pub fn subscribe(&self) -> Subscription {
        let (wake_tx, wake_rx) = crossbeam_channel::bounded(1);
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded(0);

        let mut inner = self.inner.lock();
        inner.subscribers.push(Registration {
            wake: wake_tx,
            cancelled: cancel_rx.clone(),
        });
        let cursor = Arc::clone(&inner.tail);
        let subscribers = inner.subscribers.len();
        drop(inner);

        debug!(subscribers, "new chain event subscription");
        Subscription {
            cursor,
            wake_rx,
            cancel_rx,
            cancel: Arc::new(CancelSignal {
                tx: Mutex::new(Some(cancel_tx)),
            }),
        }
    }

    /// Registered subscriptions, including ones dropped or cancelled since
    /// the last push.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    pub fn events_pushed(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }
}

impl Default for EventStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation state shared between a subscription and its closers.
/// Dropping the sender disconnects the receiver, which stays readable.
struct CancelSignal {
    tx: Mutex<Option<Sender<()>>>,
}

impl CancelSignal {
    fn cancel(&self) {
        match self.tx.lock().take() {
            Some(tx) => drop(tx),
            None => panic!("subscription cancelled twice"),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.tx.lock().is_none()
    }
}

/// A reader's position in an [`EventStream`].
pub struct Subscription {
    cursor: Arc<EventNode>,
    wake_rx: Receiver<()>,
    cancel_rx: Receiver<()>,
    cancel: Arc<CancelSignal>,
}

impl Subscription {
    fn advance(&mut self) -> Option<Arc<Event>> {
        let next = Arc::clone(self.cursor.next.get()?);
        self.cursor = next;
        Some(Arc::clone(&self.cursor.event))
    }

    /// Block until the next event is available and return it.
    ///
    /// Events are returned once each, in push order. Returns `None` once the
    /// subscription is cancelled or the stream is dropped and every event
    /// already linked has been returned.
    pub fn retrieve(&mut self) -> Option<Arc<Event>> {
        loop {
            if let Some(event) = self.advance() {
                return Some(event);
            }

            let stream_gone = select! {
                recv(self.wake_rx) -> msg => msg.is_err(),
                recv(self.cancel_rx) -> _ => return None,
            };
            if stream_gone {
                // Nothing can be linked anymore.
                return self.advance();
            }
        }
    }

    /// Return the next event if one is already linked, without blocking.
    pub fn try_retrieve(&mut self) -> Option<Arc<Event>> {
        self.advance()
    }

    /// Stop the subscription, waking a blocked [`Subscription::retrieve`].
    ///
    /// # Panics
    ///
    /// Cancelling the same subscription twice, through this method or a
    /// [`SubscriptionCloser`], is a bug in the caller and panics.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A handle that can cancel this subscription from another thread while
    /// it is blocked in [`Subscription::retrieve`].
    pub fn closer(&self) -> SubscriptionCloser {
        SubscriptionCloser {
            cancel: Arc::clone(&self.cancel),
        }
    }
}

impl Iterator for Subscription {
    type Item = Arc<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.retrieve()
    }
}

pub struct SubscriptionCloser {
    cancel: Arc<CancelSignal>,
}

impl SubscriptionCloser {
    /// See [`Subscription::cancel`].
    pub fn cancel(self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::header::tests::sample_header;
    use std::thread;
    use std::time::Duration;

    fn event_at(height: u64) -> Event {
        let mut event = Event::new();
        event.add_new_header(&sample_header(height));
        event
    }

    fn height(event: &Event) -> u64 {
        event.new_head().map(|h| h.height).unwrap_or(u64::MAX)
    }

    #[test]
    fn test_in_order_delivery() {
        let stream = EventStream::new();
        let mut sub = stream.subscribe();

        for h in 1..=5 {
            stream.push(event_at(h));
        }

        let got: Vec<u64> = (0..5).map(|_| height(&sub.retrieve().unwrap())).collect();
        assert_eq!(got, vec![1, 2, 3, 4, 5]);
        assert!(sub.try_retrieve().is_none());
        assert_eq!(stream.events_pushed(), 5);
    }

    #[test]
    fn test_late_subscriber_skips_history() {
        let stream = EventStream::new();
        stream.push(event_at(1));
        stream.push(event_at(2));

        let mut sub = stream.subscribe();
        assert!(sub.try_retrieve().is_none());

        stream.push(event_at(3));
        assert_eq!(height(&sub.retrieve().unwrap()), 3);
    }

    #[test]
    fn test_wake_token_is_level_triggered() {
        let stream = EventStream::new();
        let sub = stream.subscribe();

        // nobody is waiting, yet the wake is kept for the next check
        stream.push(event_at(1));
        assert_eq!(sub.wake_rx.len(), 1);

        // further pushes do not queue more tokens
        stream.push(event_at(2));
        assert_eq!(sub.wake_rx.len(), 1);
    }

    #[test]
    fn test_dropped_subscriptions_are_pruned() {
        let stream = EventStream::new();
        let keep = stream.subscribe();
        let gone = stream.subscribe();
        assert_eq!(stream.subscriber_count(), 2);

        drop(gone);
        stream.push(event_at(1));
        assert_eq!(stream.subscriber_count(), 1);
        drop(keep);
    }

    #[test]
    fn test_cancelled_subscription_is_unregistered() {
        let stream = EventStream::new();
        let mut live = stream.subscribe();
        let mut stopped = stream.subscribe();
        stopped.closer().cancel();
        assert_eq!(stream.subscriber_count(), 2);

        stream.push(event_at(1));
        assert_eq!(stream.subscriber_count(), 1);
        assert_eq!(stopped.wake_rx.len(), 0);

        // events linked before the push are still drained, then it closes
        assert_eq!(height(&stopped.retrieve().unwrap()), 1);
        assert!(stopped.retrieve().is_none());
        assert_eq!(height(&live.retrieve().unwrap()), 1);
    }

    #[test]
    fn test_cancel_wakes_blocked_retrieve() {
        let stream = EventStream::new();
        let mut sub = stream.subscribe();
        let closer = sub.closer();

        let reader = thread::spawn(move || sub.retrieve());
        thread::sleep(Duration::from_millis(50));
        closer.cancel();

        assert!(reader.join().unwrap().is_none());
    }

    #[test]
    fn test_retrieve_after_cancel_returns_none() {
        let stream = EventStream::new();
        let mut sub = stream.subscribe();
        sub.cancel();
        assert!(sub.is_cancelled());
        assert!(sub.retrieve().is_none());
        assert!(sub.retrieve().is_none());
    }

    #[test]
    #[should_panic(expected = "subscription cancelled twice")]
    fn test_double_cancel_panics() {
        let stream = EventStream::new();
        let sub = stream.subscribe();
        sub.closer().cancel();
        sub.cancel();
    }

    #[test]
    fn test_dropped_stream_drains_then_closes() {
        let stream = EventStream::new();
        let mut sub = stream.subscribe();
        stream.push(event_at(1));
        stream.push(event_at(2));
        drop(stream);

        let rest: Vec<u64> = sub.by_ref().map(|e| height(&e)).collect();
        assert_eq!(rest, vec![1, 2]);
        assert!(sub.retrieve().is_none());
    }

    #[test]
    fn test_long_chain_drops_without_recursion() {
        let stream = EventStream::new();
        let sub = stream.subscribe();
        for _ in 0..200_000 {
            stream.push(Event::new());
        }
        // the subscription holds the only reference to the head of the chain
        drop(sub);
        drop(stream);
    }
}
