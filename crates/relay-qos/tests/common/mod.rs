//! Fakes of the external collaborators shared by the integration tests.
#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use relay_qos::{
    Cloud, CloudAccess, CloudDescriptor, GatekeeperClient, ProbeAck, ProbeProvider, ProbeRequest, Relay,
    RelayType, SystemDescriptor, TestProposal, TopologyDirectory,
};
use std::sync::Mutex;
use uuid::Uuid;

pub fn gatekeeper_relay(address: &str) -> Relay {
    Relay {
        address: address.to_string(),
        port: 8443,
        secure: true,
        exclusive: false,
        relay_type: RelayType::GatekeeperRelay,
    }
}

pub fn gateway_relay(address: &str) -> Relay {
    Relay { relay_type: RelayType::GatewayRelay, ..gatekeeper_relay(address) }
}

pub fn own_cloud(name: &str) -> Cloud {
    Cloud {
        operator: "aitia".to_string(),
        name: name.to_string(),
        secure: true,
        neighbor: false,
        own_cloud: true,
        gatekeeper_relays: Vec::new(),
        gateway_relays: Vec::new(),
    }
}

pub fn neighbor_cloud(name: &str, relays: Vec<Relay>) -> Cloud {
    Cloud {
        operator: "aitia".to_string(),
        name: name.to_string(),
        secure: true,
        neighbor: true,
        own_cloud: false,
        gatekeeper_relays: relays,
        gateway_relays: Vec::new(),
    }
}

/// Topology with a fixed set of clouds; every cloud not listed in `direct`
/// is classified as relay-only
pub struct StaticTopology {
    pub clouds: Vec<Cloud>,
    pub direct: Vec<String>,
    pub unavailable: bool,
}

impl StaticTopology {
    pub fn new(clouds: Vec<Cloud>, direct: &[&str]) -> Self {
        Self { clouds, direct: direct.iter().map(|s| s.to_string()).collect(), unavailable: false }
    }
}

#[async_trait]
impl TopologyDirectory for StaticTopology {
    async fn list_clouds_with_relays(&self) -> Result<Vec<Cloud>> {
        if self.unavailable {
            bail!("gatekeeper is down");
        }
        Ok(self.clouds.clone())
    }

    async fn classify_access(&self, clouds: &[CloudDescriptor]) -> Result<Vec<CloudAccess>> {
        Ok(clouds
            .iter()
            .map(|cloud| CloudAccess {
                // Echo names back upper-cased to exercise case-insensitive matching
                cloud_operator: cloud.operator.to_uppercase(),
                cloud_name: cloud.name.to_uppercase(),
                direct_access: self.direct.iter().any(|name| name.eq_ignore_ascii_case(&cloud.name)),
            })
            .collect())
    }
}

/// Gatekeeper that records proposals and optionally fails delivery
#[derive(Default)]
pub struct RecordingGatekeeper {
    pub proposals: Mutex<Vec<TestProposal>>,
    pub fail: bool,
}

#[async_trait]
impl GatekeeperClient for RecordingGatekeeper {
    async fn submit_test_proposal(&self, proposal: &TestProposal) -> Result<()> {
        self.proposals.lock().unwrap().push(proposal.clone());
        if self.fail {
            bail!("connection refused");
        }
        Ok(())
    }
}

/// Ping monitor answering every request with a scripted ack
pub struct ScriptedProvider {
    pub ack: ProbeAck,
    pub echo_ok: bool,
    pub requests: Mutex<Vec<ProbeRequest>>,
    pub subscribers: Mutex<Vec<SystemDescriptor>>,
}

impl ScriptedProvider {
    pub fn acking(process_id: Uuid) -> Self {
        Self::with_ack(ProbeAck { ack_ok: Some("OK".to_string()), external_measurement_uuid: Some(process_id) })
    }

    pub fn with_ack(ack: ProbeAck) -> Self {
        Self { ack, echo_ok: true, requests: Mutex::new(Vec::new()), subscribers: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl ProbeProvider for ScriptedProvider {
    async fn submit(&self, request: &ProbeRequest) -> Result<ProbeAck> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.ack.clone())
    }

    async fn check_echo(&self) -> Result<()> {
        if !self.echo_ok {
            bail!("echo endpoint unreachable");
        }
        Ok(())
    }

    async fn subscribe(&self, subscriber: &SystemDescriptor) -> Result<()> {
        self.subscribers.lock().unwrap().push(subscriber.clone());
        Ok(())
    }
}

pub fn subscriber() -> SystemDescriptor {
    SystemDescriptor { system_name: "qos_monitor".to_string(), address: "127.0.0.1".to_string(), port: 8451 }
}
