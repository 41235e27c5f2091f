use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::correlator::{Delivery, ProbeCorrelator};
use super::provider::ProbeEventStream;
use super::types::ProbeEvent;

/// Where the collector hands provider events
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, event: ProbeEvent) -> Delivery;
}

#[async_trait]
impl EventSink for ProbeCorrelator {
    async fn deliver(&self, event: ProbeEvent) -> Delivery {
        ProbeCorrelator::deliver(self, event).await
    }
}

/// The single consumer of the provider's event channel
///
/// Events are handed to the sink, normally the correlator, in arrival order. A failure while
/// processing one event is logged and the loop moves on. The task is
/// aborted when the collector is dropped.
pub struct EventCollector {
    handle: JoinHandle<()>,
}

impl EventCollector {
    pub fn spawn(sink: Arc<dyn EventSink>, mut events: ProbeEventStream) -> Self {
        let handle = tokio::spawn(async move {
            info!("Ping event collector started");

            while let Some(event) = events.recv().await {
                let process_id = event.process_id;
                match AssertUnwindSafe(sink.deliver(event)).catch_unwind().await {
                    Ok(delivery) => debug!("Event of measurement {}: {:?}", process_id, delivery),
                    Err(_) => error!("Processing event of measurement {} panicked; event dropped", process_id),
                }
            }

            warn!("Ping event channel closed, collector stopped");
        });

        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for EventCollector {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
