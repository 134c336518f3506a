use std::fmt;

/// An event that can be routed by key.
pub trait Keyed {
    type Key: Copy + Eq + fmt::Debug;

    fn key(&self) -> Self::Key;
}

/// Failure reported by an event handler.
///
/// A failing handler aborts the remaining handlers of the same publish.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("event handler failed: {message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Handler<E> = Box<dyn FnMut(&E) -> Result<(), HandlerError>>;

struct Subscription<E: Keyed> {
    id: SubscriptionId,
    key: E::Key,
    handler: Handler<E>,
}

/// Keyed publish/subscribe dispatch.
///
/// Handlers run synchronously, in subscription order, on the thread that
/// publishes. There is no priority and no cancellation.
///
/// # Example
///
/// ```
/// use std::{cell::Cell, rc::Rc};
///
/// use flapevo_engine::{EventBus, EventKey, GameEvent};
///
/// let mut bus = EventBus::new();
/// let stops = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&stops);
/// bus.subscribe(EventKey::Stop, move |_| {
///     counter.set(counter.get() + 1);
///     Ok(())
/// });
///
/// bus.publish(&GameEvent::Stop).unwrap();
/// bus.publish(&GameEvent::Start).unwrap();
/// assert_eq!(stops.get(), 1);
/// ```
pub struct EventBus<E: Keyed> {
    subscriptions: Vec<Subscription<E>>,
    next_id: u64,
}

impl<E: Keyed> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Keyed> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field(
                "subscriptions",
                &self
                    .subscriptions
                    .iter()
                    .map(|s| (s.id, s.key))
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl<E: Keyed> EventBus<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: vec![],
            next_id: 0,
        }
    }

    /// Registers `handler` for events with the given key.
    pub fn subscribe<F>(&mut self, key: E::Key, handler: F) -> SubscriptionId
    where
        F: FnMut(&E) -> Result<(), HandlerError> + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            key,
            handler: Box::new(handler),
        });
        id
    }

    /// Removes a handler. Returns `false` if it was not registered under `key`.
    pub fn unsubscribe(&mut self, key: E::Key, id: SubscriptionId) -> bool {
        let Some(index) = self
            .subscriptions
            .iter()
            .position(|s| s.id == id && s.key == key)
        else {
            return false;
        };
        self.subscriptions.remove(index);
        true
    }

    /// Returns the number of handlers registered under `key`.
    #[must_use]
    pub fn subscriber_count(&self, key: E::Key) -> usize {
        self.subscriptions.iter().filter(|s| s.key == key).count()
    }

    /// Invokes every handler registered under the event's key.
    ///
    /// Stops at the first handler that fails and returns its error.
    pub fn publish(&mut self, event: &E) -> Result<(), HandlerError> {
        let key = event.key();
        for subscription in self.subscriptions.iter_mut().filter(|s| s.key == key) {
            (subscription.handler)(event)?;
        }
        Ok(())
    }
}
