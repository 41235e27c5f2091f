use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{ProbeAck, ProbeEvent, ProbeRequest, SystemDescriptor};

/// Receiving end of the provider's out-of-band event channel
pub type ProbeEventStream = mpsc::Receiver<ProbeEvent>;

/// Create the channel events are pushed into; the sender goes to whatever
/// receives the provider's events (an HTTP endpoint, a test)
pub fn event_channel(capacity: usize) -> (mpsc::Sender<ProbeEvent>, ProbeEventStream) {
    mpsc::channel(capacity)
}

/// External ping monitor that performs the actual ICMP work
#[async_trait]
pub trait ProbeProvider: Send + Sync {
    /// Request a measurement; results follow as events
    async fn submit(&self, request: &ProbeRequest) -> Result<ProbeAck>;

    /// Check that the provider itself answers
    async fn check_echo(&self) -> Result<()>;

    /// Register a system to receive measurement events
    async fn subscribe(&self, subscriber: &SystemDescriptor) -> Result<()>;
}
