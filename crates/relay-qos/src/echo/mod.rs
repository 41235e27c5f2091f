//! Relay echo scheduling
//!
//! On every tick the echo task picks the (cloud, relay) pair whose echo
//! data is missing or most stale and proposes a relay test to the gatekeeper
//! of that cloud.

pub mod selector;
pub mod task;

pub use selector::{CandidatePair, CandidateSelector, Selection};
pub use task::{EchoContext, RelayEchoTask, TickOutcome};
