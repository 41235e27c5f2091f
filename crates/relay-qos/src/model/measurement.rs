//! Inter-relay measurement records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::cloud::{CloudId, Relay};

/// Kind of inter-relay measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasurementKind {
    RelayEcho,
}

/// Lifecycle of a measurement record: NEW -> PENDING -> FINISHED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasurementStatus {
    New,
    Pending,
    Finished,
}

impl fmt::Display for MeasurementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementStatus::New => write!(f, "NEW"),
            MeasurementStatus::Pending => write!(f, "PENDING"),
            MeasurementStatus::Finished => write!(f, "FINISHED"),
        }
    }
}

/// Most recent measurement of a (cloud, relay, kind) triple
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    pub cloud: CloudId,
    pub relay: Relay,
    pub kind: MeasurementKind,
    pub status: MeasurementStatus,
    pub last_measurement_at: DateTime<Utc>,
}

impl MeasurementRecord {
    /// A freshly observed pair that was never measured
    pub fn new(cloud: CloudId, relay: Relay, kind: MeasurementKind) -> Self {
        Self { cloud, relay, kind, status: MeasurementStatus::New, last_measurement_at: Utc::now() }
    }

    /// Whether the pair still has to be measured for the first time
    pub fn is_unmeasured(&self) -> bool {
        self.status == MeasurementStatus::New
    }
}

/// A status change of one pair, as reported by whoever runs the measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementUpdate {
    pub cloud: CloudId,
    pub relay: Relay,
    pub status: MeasurementStatus,
    /// When a FINISHED measurement was taken; the time of arrival if absent
    #[serde(default)]
    pub measured_at: Option<DateTime<Utc>>,
}
