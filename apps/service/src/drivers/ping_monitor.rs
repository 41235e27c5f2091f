use anyhow::{Context, Result};
use async_trait::async_trait;
use relay_qos::{ProbeAck, ProbeProvider, ProbeRequest, SystemDescriptor};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{base_url, http_client};

const ECHO_URI: &str = "echo";
const SUBSCRIBE_URI: &str = "subscribe";

/// External ping monitor reached over HTTP
pub struct HttpPingMonitor {
    client: reqwest::Client,
    base: Url,
    measurement: Url,
}

impl HttpPingMonitor {
    pub fn new(address: &str, port: u16, path: &str, secure: bool, timeout: Duration) -> Result<Self> {
        let base = base_url(address, port, secure)?;
        let measurement = base.join(path.trim_start_matches('/'))?;
        Ok(Self { client: http_client(timeout)?, base, measurement })
    }
}

#[async_trait]
impl ProbeProvider for HttpPingMonitor {
    async fn submit(&self, request: &ProbeRequest) -> Result<ProbeAck> {
        debug!("Requesting external ping measurement of {}", request.host);

        let ack: Option<ProbeAck> = self
            .client
            .post(self.measurement.clone())
            .json(request)
            .send()
            .await
            .context("External ping monitor is not available")?
            .error_for_status()?
            .json()
            .await?;

        // A null body is an unusable ack, not a transport failure
        Ok(ack.unwrap_or_default())
    }

    async fn check_echo(&self) -> Result<()> {
        let url = self.base.join(ECHO_URI)?;
        debug!("Checking external ping monitor echo: {}", url);

        self.client
            .get(url)
            .send()
            .await
            .context("External ping monitor echo is not available")?
            .error_for_status()?;
        Ok(())
    }

    async fn subscribe(&self, subscriber: &SystemDescriptor) -> Result<()> {
        let url = self.base.join(SUBSCRIBE_URI)?;
        debug!("Subscribing {} to external ping monitor events", subscriber.system_name);

        self.client
            .post(url)
            .json(subscriber)
            .send()
            .await
            .context("External ping monitor subscription endpoint is not available")?
            .error_for_status()?;
        Ok(())
    }
}
