use anyhow::{Context, Result};
use async_trait::async_trait;
use relay_qos::{Cloud, CloudAccess, CloudDescriptor, GatekeeperClient, TestProposal, TopologyDirectory};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{ListResponse, base_url, http_client};

const CLOUDS_URI: &str = "gatekeeper/clouds";
const ACCESS_TYPES_URI: &str = "gatekeeper/cloud/access-types";
const INIT_RELAY_TEST_URI: &str = "gatekeeper/relay-test/init";

/// Gatekeeper of this node's own cloud
pub struct HttpGatekeeper {
    client: reqwest::Client,
    base: Url,
}

impl HttpGatekeeper {
    pub fn new(address: &str, port: u16, secure: bool, timeout: Duration) -> Result<Self> {
        Ok(Self { client: http_client(timeout)?, base: base_url(address, port, secure)? })
    }
}

#[async_trait]
impl TopologyDirectory for HttpGatekeeper {
    async fn list_clouds_with_relays(&self) -> Result<Vec<Cloud>> {
        let url = self.base.join(CLOUDS_URI)?;
        debug!("Querying gatekeeper for all clouds: {}", url);

        let response: ListResponse<Cloud> = self
            .client
            .get(url)
            .send()
            .await
            .context("Gatekeeper is not available")?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.data)
    }

    async fn classify_access(&self, clouds: &[CloudDescriptor]) -> Result<Vec<CloudAccess>> {
        let url = self.base.join(ACCESS_TYPES_URI)?;
        debug!("Querying gatekeeper for access types of {} clouds", clouds.len());

        let response: ListResponse<CloudAccess> = self
            .client
            .post(url)
            .json(clouds)
            .send()
            .await
            .context("Gatekeeper is not available")?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.data)
    }
}

#[async_trait]
impl GatekeeperClient for HttpGatekeeper {
    async fn submit_test_proposal(&self, proposal: &TestProposal) -> Result<()> {
        let url = self.base.join(INIT_RELAY_TEST_URI)?;
        debug!("Requesting relay test init from gatekeeper: {}", url);

        self.client
            .post(url)
            .json(proposal)
            .send()
            .await
            .context("Gatekeeper is not available")?
            .error_for_status()?;
        Ok(())
    }
}
