//! Relay test proposal sent to a peer cloud's gatekeeper.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::cloud::{CloudDescriptor, Relay};
use crate::crypto::keys::{verify_base64, KeyPair};

/// Asks the gatekeeper of `target_cloud` to run a relay echo test with us
/// through `relay`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestProposal {
    pub requester_cloud: CloudDescriptor,
    pub target_cloud: CloudDescriptor,
    pub relay: Relay,
    /// Base64 encoded public key of the proposing QoS monitor
    #[serde(rename = "senderQoSMonitorPublicKey")]
    pub sender_public_key: String,
    /// Base64 Ed25519 signature over the rest of the proposal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Canonical body covered by the signature
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignableProposal<'a> {
    requester_cloud: &'a CloudDescriptor,
    target_cloud: &'a CloudDescriptor,
    relay: &'a Relay,
    sender_public_key: &'a str,
}

impl TestProposal {
    /// Build and sign a proposal with this monitor's keypair
    pub fn signed(
        requester_cloud: CloudDescriptor,
        target_cloud: CloudDescriptor,
        relay: Relay,
        keypair: &KeyPair,
    ) -> Result<Self> {
        let mut proposal = Self {
            requester_cloud,
            target_cloud,
            relay,
            sender_public_key: keypair.public_key_base64(),
            signature: None,
        };
        let body = proposal.signable_bytes()?;
        proposal.signature = Some(keypair.sign_base64(&body));
        Ok(proposal)
    }

    /// Check the signature against the embedded public key
    pub fn verify(&self) -> Result<()> {
        let signature = self
            .signature
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Proposal is not signed"))?;
        verify_base64(&self.sender_public_key, &self.signable_bytes()?, signature)
    }

    fn signable_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&SignableProposal {
            requester_cloud: &self.requester_cloud,
            target_cloud: &self.target_cloud,
            relay: &self.relay,
            sender_public_key: &self.sender_public_key,
        })?)
    }
}
