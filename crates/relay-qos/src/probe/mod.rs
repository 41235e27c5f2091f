//! External ping monitor delegation.
//!
//! A reachability check is submitted to an external ping monitor, which
//! acknowledges it with a measurement process id and later publishes one
//! event per ICMP attempt. A single collector task drains those events into
//! the correlator, which releases the waiting `ping` call once all attempts
//! are in or its deadline passes.

pub mod collector;
pub mod correlator;
pub mod delegate;
pub mod provider;
pub mod summary;
pub mod types;

pub use collector::{EventCollector, EventSink};
pub use correlator::{Delivery, ProbeCorrelator};
pub use delegate::ProbeDelegate;
pub use provider::{event_channel, ProbeEventStream, ProbeProvider};
pub use summary::PingSummary;
pub use types::{
    ProbeAck, ProbeEvent, ProbeEventKind, ProbeOutcome, ProbeRequest, ProbeSettings, SystemDescriptor,
    MAX_WAIT_BUDGET,
};
