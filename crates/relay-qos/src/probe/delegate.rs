use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::collector::EventCollector;
use super::correlator::ProbeCorrelator;
use super::provider::{ProbeEventStream, ProbeProvider};
use super::types::{ProbeOutcome, ProbeRequest, ProbeSettings, SystemDescriptor};
use crate::error::ProbeError;

/// Runs reachability checks through an external ping monitor
pub struct ProbeDelegate {
    provider: Arc<dyn ProbeProvider>,
    correlator: Arc<ProbeCorrelator>,
    settings: ProbeSettings,
    subscriber: SystemDescriptor,
    collector: EventCollector,
}

impl ProbeDelegate {
    /// Start the event collector, check the provider and subscribe to its events
    ///
    /// `subscriber` is the system the provider delivers events to.
    pub async fn init(
        provider: Arc<dyn ProbeProvider>,
        events: ProbeEventStream,
        settings: ProbeSettings,
        subscriber: SystemDescriptor,
    ) -> Result<Self, ProbeError> {
        debug!("Initializing external ping monitor delegate");

        let correlator = Arc::new(ProbeCorrelator::new());
        let collector = EventCollector::spawn(correlator.clone(), events);

        provider.check_echo().await.map_err(ProbeError::EchoUnreachable)?;
        provider.subscribe(&subscriber).await.map_err(ProbeError::Subscription)?;

        info!(
            "Subscribed {} at {}:{} to external ping monitor events",
            subscriber.system_name, subscriber.address, subscriber.port
        );

        Ok(Self { provider, correlator, settings, subscriber, collector })
    }

    /// Measure reachability of `address`
    ///
    /// Fails with [`ProbeError`] when no complete measurement could be
    /// obtained within the wait budget; that means "unavailable", not
    /// "unreachable".
    pub async fn ping(&self, address: &str) -> Result<Vec<ProbeOutcome>, ProbeError> {
        debug!("ping started for {}", address);

        let deadline = Instant::now() + self.settings.wait_budget();
        let process_id = self.request_measurement(address).await?;
        let expected = self.settings.repeat as usize;

        match self.correlator.wait(process_id, expected, deadline).await {
            Ok(outcomes) => Ok(outcomes),
            Err(e) if e.is_timeout() => {
                info!("Ping of {} gave no complete result in time: {}", address, e);
                Err(e)
            }
            Err(e) => {
                warn!("Ping of {} failed: {}", address, e);
                Err(e)
            }
        }
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    pub fn subscriber(&self) -> &SystemDescriptor {
        &self.subscriber
    }

    pub fn collector_running(&self) -> bool {
        self.collector.is_running()
    }

    async fn request_measurement(&self, address: &str) -> Result<Uuid, ProbeError> {
        let request = ProbeRequest::new(address, &self.settings);

        let ack = self.provider.submit(&request).await.map_err(|source| {
            info!("External ping monitor request failed: {:#}", source);
            ProbeError::ProviderUnavailable { address: address.to_string(), source }
        })?;
        let process_id = ack.process_id()?;

        info!("Ping request acknowledged, with process id: {}", process_id);
        Ok(process_id)
    }
}
