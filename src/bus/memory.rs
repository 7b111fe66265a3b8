//! In-process [`Bus`] implementation backed by [`DashMap`]. Used by the
//! all-in-one runtime and by tests; every layer runs in the same process so
//! no encoding round-trip is strictly required, but messages are still
//! handed to subscribers as raw bytes to keep behavior identical to
//! [`crate::bus::network::TcpBus`].

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::warn;

use super::{Bus, BusError, MessageHandler, Topic};

/// An in-memory, single-process [`Bus`]. Subscribers are held for the
/// lifetime of the bus; there is no unsubscribe operation because no layer
/// in this system ever needs one.
#[derive(Default)]
pub struct InMemoryBus {
    subscribers: DashMap<&'static str, Vec<Arc<dyn MessageHandler>>>,
}

impl InMemoryBus {
    /// Creates an empty bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Bus for InMemoryBus {
    async fn publish(&self, topic: Topic, key: &str, value: &[u8]) -> Result<(), BusError> {
        let handlers = self
            .subscribers
            .get(topic.as_str())
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        for handler in handlers {
            if let Err(err) = handler.handle(key, value).await {
                warn!(%topic, %key, error = %err, "subscriber handler failed");
            }
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        topic: Topic,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), BusError> {
        self.subscribers
            .entry(topic.as_str())
            .or_default()
            .push(handler);
        Ok(())
    }
}
