//! Data model shared by the selector, the echo task and the drivers.

pub mod cloud;
pub mod measurement;
pub mod proposal;

pub use cloud::{Cloud, CloudAccess, CloudDescriptor, CloudId, Relay, RelayType};
pub use measurement::{MeasurementKind, MeasurementRecord, MeasurementStatus, MeasurementUpdate};
pub use proposal::TestProposal;
