//! One-way push from the refresh pipeline to attached display surfaces.
//!
//! Each subscriber gets its own unbounded queue, so delivery is ordered per
//! subscriber and a slow subscriber never blocks the publisher. Nothing is
//! replayed: a surface that attaches late reads the cache to catch up.

use metrics::counter;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::model::{AssetClass, SentimentSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    DataUpdated {
        snapshot: SentimentSnapshot,
        asset_class: AssetClass,
    },
    ErrorOccurred {
        message: String,
    },
    /// Update-channel payloads are passed through untouched.
    UpdateAvailable(Value),
    UpdateDownloadProgress(Value),
}

impl PushEvent {
    /// Event name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            PushEvent::DataUpdated { .. } => "data-updated",
            PushEvent::ErrorOccurred { .. } => "error-occurred",
            PushEvent::UpdateAvailable(_) => "update-available",
            PushEvent::UpdateDownloadProgress(_) => "update-download-progress",
        }
    }

    /// Wire payload. `data-updated` carries the snapshot fields plus `indexType`.
    pub fn payload_json(&self) -> Value {
        match self {
            PushEvent::DataUpdated {
                snapshot,
                asset_class,
            } => {
                let mut v = serde_json::to_value(snapshot).unwrap_or_else(|_| json!({}));
                if let Some(obj) = v.as_object_mut() {
                    obj.insert("indexType".into(), Value::from(asset_class.as_str()));
                }
                v
            }
            PushEvent::ErrorOccurred { message } => json!({ "message": message }),
            PushEvent::UpdateAvailable(v) | PushEvent::UpdateDownloadProgress(v) => v.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, UnboundedSender<PushEvent>>>,
}

#[derive(Debug, Clone, Default)]
pub struct PublishChannel {
    inner: Arc<Inner>,
}

impl PublishChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.subscribers.lock().insert(id, tx);
        tracing::debug!(subscriber = id, "surface attached");
        Subscription {
            id,
            rx,
            channel: Arc::downgrade(&self.inner),
        }
    }

    /// Fire-and-forget fan-out. Returns how many subscribers received the event.
    pub fn publish(&self, event: PushEvent) -> usize {
        let name = event.name();
        let mut subs = self.inner.subscribers.lock();
        subs.retain(|_, tx| tx.send(event.clone()).is_ok());
        let delivered = subs.len();
        drop(subs);

        counter!("publish_events_total", "event" => name).increment(1);
        tracing::debug!(event = name, delivered, "published");
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }
}

/// Attached subscriber. Dropping it detaches.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: UnboundedReceiver<PushEvent>,
    channel: Weak<Inner>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next event, or `None` once the channel itself is gone.
    pub async fn recv(&mut self) -> Option<PushEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<PushEvent> {
        self.rx.try_recv().ok()
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.channel.upgrade() {
            inner.subscribers.lock().remove(&self.id);
            tracing::debug!(subscriber = self.id, "surface detached");
        }
    }
}
