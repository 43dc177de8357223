//! Document-level pointer events
//!
//! A [`PointerHub`] is created by the host application and handed to each
//! visual. Visuals receive clicks through a [`PointerSubscription`] that
//! unregisters itself when dropped.

use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use parking_lot::Mutex;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A click somewhere in the host surface, in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
}

impl PointerEvent {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned screen rectangle of a visual
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Edges are inside
    pub fn contains(&self, event: &PointerEvent) -> bool {
        event.x >= self.min_x
            && event.x <= self.max_x
            && event.y >= self.min_y
            && event.y <= self.max_y
    }
}

type Subscribers = Mutex<AHashMap<u64, UnboundedSender<PointerEvent>>>;

/// Fan-out of pointer events to subscribed visuals
pub struct PointerHub {
    subscribers: Arc<Subscribers>,
    next_id: AtomicU64,
}

impl PointerHub {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(AHashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a new listener
    pub fn subscribe(&self) -> PointerSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().insert(id, sender);
        tracing::debug!("Pointer subscription {} registered", id);

        PointerSubscription {
            id,
            receiver,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Deliver an event to every live subscription. Returns how many received it.
    pub fn dispatch(&self, event: PointerEvent) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|_, sender| !sender.is_closed());
        subscribers
            .values()
            .filter(|sender| sender.send(event).is_ok())
            .count()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl Default for PointerHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of a hub registration
pub struct PointerSubscription {
    id: u64,
    receiver: UnboundedReceiver<PointerEvent>,
    subscribers: Weak<Subscribers>,
}

impl PointerSubscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next event. `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<PointerEvent> {
        self.receiver.recv().await
    }

    /// Next queued event, if any
    pub fn try_recv(&mut self) -> Option<PointerEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for PointerSubscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.lock().remove(&self.id);
            tracing::debug!("Pointer subscription {} released", self.id);
        }
    }
}
