//! Error types for relay echo selection and external probing.

use thiserror::Error;
use uuid::Uuid;

use crate::model::CloudId;

/// Failures of a relay echo scheduling tick
#[derive(Debug, Error)]
pub enum EchoError {
    #[error("topology directory is unavailable")]
    TopologyUnavailable(#[source] anyhow::Error),

    #[error("cloud access classification failed")]
    AccessClassification(#[source] anyhow::Error),

    #[error("measurement lookup failed for cloud {cloud} and relay {relay}")]
    Catalog {
        cloud: CloudId,
        relay: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("secure own cloud was not found")]
    MissingOwnCloud,

    #[error("public key is not available")]
    MissingPublicKey,

    #[error("failed to sign relay test proposal")]
    Signing(#[source] anyhow::Error),
}

/// Failures of a single external ping measurement
///
/// Every variant means "measurement unavailable". None of them says the
/// target itself is unreachable; that is what a list of failed outcomes is for.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("external ping monitor is not available for {address}")]
    ProviderUnavailable {
        address: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("external ping monitor replied invalid ack: {0}")]
    InvalidAck(String),

    #[error("measurement {process_id} timed out with {received} of {expected} results")]
    Timeout {
        process_id: Uuid,
        received: usize,
        expected: usize,
    },

    #[error("measurement {process_id} was interrupted: {reason}")]
    Interrupted { process_id: Uuid, reason: String },

    #[error("measurement {0} already has a waiter")]
    DuplicateWait(Uuid),

    #[error("measurement {0} is already closed")]
    AlreadyClosed(Uuid),

    #[error("external ping monitor echo check failed")]
    EchoUnreachable(#[source] anyhow::Error),

    #[error("subscription to external ping monitor events failed")]
    Subscription(#[source] anyhow::Error),
}

impl ProbeError {
    /// Whether this failure is an ordinary deadline expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::Timeout { .. })
    }
}
