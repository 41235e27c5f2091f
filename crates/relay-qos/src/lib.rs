//! relay-qos - relay echo scheduling and external ping correlation
//!
//! This library decides which (cloud, relay) pair of a federated deployment
//! should be echo tested next, and runs reachability probes through an
//! external ping monitor whose results arrive asynchronously as events.

pub mod catalog;
pub mod crypto;
pub mod directory;
pub mod echo;
pub mod error;
pub mod model;
pub mod probe;

// Re-export main types
pub use catalog::MemoryCatalog;
pub use directory::{GatekeeperClient, MeasurementCatalog, TopologyDirectory};
pub use echo::{CandidatePair, CandidateSelector, EchoContext, RelayEchoTask, TickOutcome};
pub use error::{EchoError, ProbeError};
pub use model::{
    Cloud, CloudAccess, CloudDescriptor, CloudId, MeasurementKind, MeasurementRecord,
    MeasurementStatus, MeasurementUpdate, Relay, RelayType, TestProposal,
};
pub use probe::{
    EventCollector, PingSummary, ProbeAck, ProbeCorrelator, ProbeDelegate, ProbeEvent,
    ProbeOutcome, ProbeProvider, ProbeRequest, ProbeSettings, SystemDescriptor,
};

/// Status token an external ping monitor answers with when it accepted a request
pub const ACK_OK: &str = "OK";

/// TTL ceiling put on every ICMP request
pub const ICMP_TTL: u8 = 255;
