//! Wires configuration, drivers and the relay-qos core together.

use anyhow::{Context, Result};
use relay_qos::crypto::{KeyPair, load_or_generate_keypair};
use relay_qos::probe::event_channel;
use relay_qos::{
    CandidateSelector, EchoContext, MemoryCatalog, PingSummary, ProbeDelegate, RelayEchoTask,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::drivers::{HttpGatekeeper, HttpPingMonitor};
use crate::receiver;

/// Buffered provider events before the receiver starts pushing back
const EVENT_CAPACITY: usize = 1024;

/// The running relay QoS service
pub struct RelayQosService {
    config: Arc<Config>,
    keypair: Arc<KeyPair>,
    gatekeeper: Arc<HttpGatekeeper>,
    ping_monitor: Arc<HttpPingMonitor>,
    catalog: Arc<MemoryCatalog>,
}

impl RelayQosService {
    pub fn new(config: Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.service.request_timeout_seconds);

        info!("Loading cryptographic keypair...");
        let keypair = Arc::new(load_or_generate_keypair(&PathBuf::from(&config.service.keypair_path))?);
        info!("QoS monitor public key: {}", keypair.public_key_hex());

        let gatekeeper = Arc::new(HttpGatekeeper::new(
            &config.gatekeeper.address,
            config.gatekeeper.port,
            config.gatekeeper.secure,
            timeout,
        )?);
        let ping_monitor = Arc::new(HttpPingMonitor::new(
            &config.ping_monitor.address,
            config.ping_monitor.port,
            &config.ping_monitor.path,
            config.ping_monitor.secure,
            timeout,
        )?);

        Ok(Self {
            config: Arc::new(config),
            keypair,
            gatekeeper,
            ping_monitor,
            catalog: Arc::new(MemoryCatalog::new()),
        })
    }

    /// Run the event receiver and the relay echo schedule until interrupted
    pub async fn run(self) -> Result<()> {
        info!("Starting relay QoS service...");

        let (server, delegate) = self.start_probing().await?;
        let server_handle = server.handle();
        actix_web::rt::spawn(server);

        let context = EchoContext {
            standalone: self.config.service.standalone,
            secure_mode: self.config.service.secure,
            keypair: Some(self.keypair.clone()),
        };
        let selector = CandidateSelector::new(self.gatekeeper.clone(), self.catalog.clone());
        let task = Arc::new(RelayEchoTask::new(selector, self.gatekeeper.clone(), context));
        let interval = Duration::from_secs(self.config.service.relay_echo_interval_seconds);
        let echo_handle = task.start_periodic(interval);
        info!("Relay echo task scheduled every {}s", interval.as_secs());

        tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;
        info!("Shutting down relay QoS service...");

        echo_handle.abort();
        server_handle.stop(true).await;
        drop(delegate);
        Ok(())
    }

    /// Measure reachability of one address and return its summary
    pub async fn ping_once(self, address: &str) -> Result<PingSummary> {
        let (server, delegate) = self.start_probing().await?;
        let server_handle = server.handle();
        actix_web::rt::spawn(server);

        let result = delegate.ping(address).await;
        server_handle.stop(true).await;

        let outcomes = result.with_context(|| format!("Measurement of {address} unavailable"))?;
        Ok(PingSummary::from_outcomes(&outcomes, self.config.probe.timeout_ms))
    }

    /// Bind the event receiver, then bring up the probe delegate behind it
    async fn start_probing(&self) -> Result<(actix_web::dev::Server, ProbeDelegate)> {
        let (events_tx, events_rx) = event_channel(EVENT_CAPACITY);

        let receiver_config = &self.config.event_receiver;
        let server = receiver::bind(receiver_config, events_tx, self.catalog.clone())
            .with_context(|| format!("Failed to bind event receiver on port {}", receiver_config.port))?;
        info!("Event receiver listening on {}:{}{}", receiver_config.bind, receiver_config.port, receiver_config.path);
        info!("Relay echo status changes accepted on {}", receiver_config.measurements_path);

        let delegate = ProbeDelegate::init(
            self.ping_monitor.clone(),
            events_rx,
            self.config.probe.clone(),
            receiver_config.subscriber(),
        )
        .await?;

        Ok((server, delegate))
    }
}
