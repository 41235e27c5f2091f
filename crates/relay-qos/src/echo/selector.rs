use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error};

use crate::directory::{MeasurementCatalog, TopologyDirectory};
use crate::error::EchoError;
use crate::model::{Cloud, CloudAccess, CloudDescriptor, MeasurementKind, MeasurementStatus, Relay};

/// A (cloud, relay) pair chosen for a relay echo test
#[derive(Debug, Clone)]
pub struct CandidatePair {
    pub cloud: Cloud,
    pub relay: Relay,
}

/// Result of one selection pass
#[derive(Debug, Clone)]
pub struct Selection {
    /// This node's own (secure) cloud
    pub own_cloud: Cloud,
    pub pair: Option<CandidatePair>,
}

/// Picks the pair that most urgently needs a relay echo test
///
/// Never measured pairs come first, in topology order. Otherwise the pair
/// with the oldest finished measurement wins. Pending pairs are never picked.
pub struct CandidateSelector {
    topology: Arc<dyn TopologyDirectory>,
    catalog: Arc<dyn MeasurementCatalog>,
}

impl CandidateSelector {
    pub fn new(topology: Arc<dyn TopologyDirectory>, catalog: Arc<dyn MeasurementCatalog>) -> Self {
        Self { topology, catalog }
    }

    /// Select the next pair to test
    pub async fn select_pair(&self) -> Result<Option<CandidatePair>, EchoError> {
        Ok(self.select().await?.pair)
    }

    /// Select the next pair to test, also returning the own cloud found on the way
    pub async fn select(&self) -> Result<Selection, EchoError> {
        debug!("Selecting cloud-relay pair for relay echo test");

        let clouds = self
            .topology
            .list_clouds_with_relays()
            .await
            .map_err(EchoError::TopologyUnavailable)?;

        let own_cloud = find_own_cloud(&clouds)?.clone();
        let candidates = self.clouds_without_direct_access(&clouds).await?;
        debug!("{} of {} clouds are relay echo candidates", candidates.len(), clouds.len());

        let pair = self.most_urgent_pair(&candidates).await?;
        Ok(Selection { own_cloud, pair })
    }

    async fn clouds_without_direct_access<'a>(&self, clouds: &'a [Cloud]) -> Result<Vec<&'a Cloud>, EchoError> {
        let descriptors: Vec<CloudDescriptor> = clouds.iter().map(Cloud::descriptor).collect();
        let access = self
            .topology
            .classify_access(&descriptors)
            .await
            .map_err(EchoError::AccessClassification)?;

        Ok(clouds
            .iter()
            .filter(|cloud| !cloud.own_cloud && lacks_direct_access(cloud, &access))
            .collect())
    }

    async fn most_urgent_pair(&self, candidates: &[&Cloud]) -> Result<Option<CandidatePair>, EchoError> {
        let mut stalest: Option<(DateTime<Utc>, &Cloud, &Relay)> = None;

        for &cloud in candidates {
            let cloud_id = cloud.id();
            for relay in cloud.echo_relays() {
                let record = self
                    .catalog
                    .get(&cloud_id, relay, MeasurementKind::RelayEcho)
                    .await
                    .map_err(|source| EchoError::Catalog {
                        cloud: cloud_id.clone(),
                        relay: relay.to_string(),
                        source,
                    })?;

                match record {
                    None => {
                        debug!("Never measured pair selected: {} via {}", cloud_id, relay);
                        return Ok(Some(pair(cloud, relay)));
                    }
                    Some(record) if record.is_unmeasured() => {
                        debug!("New pair selected: {} via {}", cloud_id, relay);
                        return Ok(Some(pair(cloud, relay)));
                    }
                    Some(record) if record.status == MeasurementStatus::Pending => {
                        debug!("Skipping pending pair: {} via {}", cloud_id, relay);
                    }
                    Some(record) => {
                        let older = stalest
                            .as_ref()
                            .map_or(true, |(measured_at, _, _)| record.last_measurement_at < *measured_at);
                        if older {
                            stalest = Some((record.last_measurement_at, cloud, relay));
                        }
                    }
                }
            }
        }

        Ok(stalest.map(|(_, cloud, relay)| pair(cloud, relay)))
    }
}

fn pair(cloud: &Cloud, relay: &Relay) -> CandidatePair {
    CandidatePair { cloud: cloud.clone(), relay: relay.clone() }
}

fn lacks_direct_access(cloud: &Cloud, access: &[CloudAccess]) -> bool {
    access
        .iter()
        .any(|entry| !entry.direct_access && cloud.id().matches(&entry.cloud_operator, &entry.cloud_name))
}

/// Exactly one cloud must be both own and secure
fn find_own_cloud(clouds: &[Cloud]) -> Result<&Cloud, EchoError> {
    let mut own = clouds.iter().filter(|cloud| cloud.own_cloud && cloud.secure);
    match (own.next(), own.next()) {
        (Some(cloud), None) => Ok(cloud),
        _ => {
            error!("Topology does not contain exactly one secure own cloud");
            Err(EchoError::MissingOwnCloud)
        }
    }
}
