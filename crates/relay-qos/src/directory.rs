//! Interfaces to the systems this crate consults but does not own
//!
//! The topology and the measurement records live elsewhere (the gatekeeper
//! and the QoS store); relay test proposals are handed to the gatekeeper of
//! the target cloud. Implementations are expected to be cheap to share
//! behind an `Arc`.

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{
    Cloud, CloudAccess, CloudDescriptor, CloudId, MeasurementKind, MeasurementRecord, Relay,
    TestProposal,
};

/// Source of cloud and relay topology
#[async_trait]
pub trait TopologyDirectory: Send + Sync {
    /// All known clouds with their relay links
    async fn list_clouds_with_relays(&self) -> Result<Vec<Cloud>>;

    /// Classify which of the given clouds are reachable without relaying
    async fn classify_access(&self, clouds: &[CloudDescriptor]) -> Result<Vec<CloudAccess>>;
}

/// Read access to inter-relay measurement records
#[async_trait]
pub trait MeasurementCatalog: Send + Sync {
    /// Most recent record of the triple, if any
    async fn get(
        &self,
        cloud: &CloudId,
        relay: &Relay,
        kind: MeasurementKind,
    ) -> Result<Option<MeasurementRecord>>;
}

/// One-way channel to the gatekeeper that forwards relay test proposals
#[async_trait]
pub trait GatekeeperClient: Send + Sync {
    /// Submit a proposal; any response body is ignored
    async fn submit_test_proposal(&self, proposal: &TestProposal) -> Result<()>;
}
