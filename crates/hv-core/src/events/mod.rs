use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;

/// Event bus owned by one visual
///
/// Handlers run synchronously inside `publish` and must not publish on the
/// same bus.
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<std::any::TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Selection lifecycle events
pub mod events {
    use super::Event;
    use crate::hypercube::ElementId;
    use crate::session::SelectionPath;

    /// A selection scope was opened
    #[derive(Debug, Clone)]
    pub struct SelectionStarted {
        pub path: SelectionPath,
    }

    /// The engine acknowledged a commit
    #[derive(Debug, Clone)]
    pub struct SelectionsConfirmed {
        pub path: SelectionPath,
        pub values: Vec<ElementId>,
    }

    /// A commit was rejected; the selection is pending again
    #[derive(Debug, Clone)]
    pub struct SelectionCommitFailed {
        pub path: SelectionPath,
        pub error: String,
    }

    /// The in-progress selection was reverted
    #[derive(Debug, Clone)]
    pub struct SelectionCancelled {
        pub path: SelectionPath,
    }

    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(
        SelectionStarted,
        SelectionsConfirmed,
        SelectionCommitFailed,
        SelectionCancelled
    );
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_insert_with(Vec::new).push(handler);
    }

    /// Subscribe a typed closure
    pub fn on<E, F>(&self, mut f: F)
    where
        E: Event,
        F: FnMut(&E) + Send + Sync + 'static,
    {
        self.subscribe::<E>(handler_from_fn(move |event| {
            if let Some(event) = event.as_any().downcast_ref::<E>() {
                f(event);
            }
        }));
    }

    /// Publish an event
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();

        if let Some(event_handlers) = handlers.get_mut(&type_id) {
            for handler in event_handlers.iter_mut() {
                handler.handle(&event);
            }
        }
    }

    /// Number of handlers registered for `E`
    pub fn handler_count<E: Event>(&self) -> usize {
        let type_id = std::any::TypeId::of::<E>();
        self.handlers.lock().get(&type_id).map(Vec::len).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::events::{SelectionCancelled, SelectionsConfirmed};
    use crate::hypercube::ElementId;
    use crate::session::SelectionPath;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_typed_subscription_only_sees_its_type() {
        let bus = EventBus::new();
        let confirmed = Arc::new(AtomicUsize::new(0));

        let counter = confirmed.clone();
        bus.on::<SelectionsConfirmed, _>(move |event| {
            counter.fetch_add(event.values.len(), Ordering::SeqCst);
        });

        bus.publish(SelectionCancelled { path: SelectionPath::hypercube(0) });
        bus.publish(SelectionsConfirmed {
            path: SelectionPath::hypercube(0),
            values: vec![ElementId(1), ElementId(2)],
        });

        assert_eq!(confirmed.load(Ordering::SeqCst), 2);
        assert_eq!(bus.handler_count::<SelectionsConfirmed>(), 1);
        assert_eq!(bus.handler_count::<SelectionCancelled>(), 0);
    }
}
