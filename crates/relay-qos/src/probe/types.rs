//! Wire types exchanged with the external ping monitor.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::error::ProbeError;
use crate::{ACK_OK, ICMP_TTL};

/// Covers the trip through the provider and event delivery, not just ICMP time
const OVERHEAD_MULTIPLIER: u64 = 2;

/// Upper bound on how long a single `ping` call may wait
pub const MAX_WAIT_BUDGET: Duration = Duration::from_secs(24 * 60 * 60);

/// Probe tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Timeout of a single ICMP attempt in milliseconds
    pub timeout_ms: u64,
    /// Number of ICMP attempts per measurement
    pub repeat: u32,
    /// ICMP payload size in bytes
    pub packet_size: u32,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self { timeout_ms: 5000, repeat: 35, packet_size: 32 }
    }
}

impl ProbeSettings {
    /// How long a `ping` call may wait for all of its results
    ///
    /// Capped at [`MAX_WAIT_BUDGET`].
    pub fn wait_budget(&self) -> Duration {
        self.uncapped_wait_millis()
            .map(Duration::from_millis)
            .map_or(MAX_WAIT_BUDGET, |budget| budget.min(MAX_WAIT_BUDGET))
    }

    /// Whether the settings stay within [`MAX_WAIT_BUDGET`] without capping
    pub fn within_wait_limit(&self) -> bool {
        self.uncapped_wait_millis()
            .is_some_and(|millis| Duration::from_millis(millis) <= MAX_WAIT_BUDGET)
    }

    fn uncapped_wait_millis(&self) -> Option<u64> {
        self.timeout_ms
            .checked_mul(u64::from(self.repeat))?
            .checked_mul(OVERHEAD_MULTIPLIER)
    }
}

/// ICMP measurement request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeRequest {
    pub host: String,
    pub ttl: u8,
    pub packet_size: u32,
    /// Per-attempt timeout in milliseconds
    pub timeout: u64,
    pub time_to_repeat: u32,
}

impl ProbeRequest {
    pub fn new(host: impl Into<String>, settings: &ProbeSettings) -> Self {
        Self {
            host: host.into(),
            ttl: ICMP_TTL,
            packet_size: settings.packet_size,
            timeout: settings.timeout_ms,
            time_to_repeat: settings.repeat,
        }
    }
}

/// Acknowledgment of a measurement request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeAck {
    pub ack_ok: Option<String>,
    pub external_measurement_uuid: Option<Uuid>,
}

impl ProbeAck {
    /// The measurement process id, if the ack is usable
    pub fn process_id(&self) -> Result<Uuid, ProbeError> {
        let reason = match (&self.ack_ok, self.external_measurement_uuid) {
            (None, _) => "ack status is missing".to_string(),
            (Some(status), _) if !status.eq_ignore_ascii_case(ACK_OK) => {
                format!("ack status is {status:?}")
            }
            (Some(_), None) => "measurement process id is missing".to_string(),
            (Some(_), Some(process_id)) => return Ok(process_id),
        };

        warn!("External ping monitor replied invalid ack: {}", reason);
        Err(ProbeError::InvalidAck(reason))
    }
}

/// Result of one ICMP attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutcome {
    pub success_flag: bool,
    #[serde(default)]
    pub timeout_flag: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Round trip time in milliseconds
    #[serde(default)]
    pub rtt: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub ttl: Option<u8>,
}

impl ProbeOutcome {
    pub fn reply(rtt: u32) -> Self {
        Self { success_flag: true, timeout_flag: false, error_message: None, rtt: Some(rtt), size: None, ttl: None }
    }

    pub fn timed_out() -> Self {
        Self { success_flag: false, timeout_flag: true, error_message: None, rtt: None, size: None, ttl: None }
    }

    /// Whether the target answered this attempt
    pub fn is_reply(&self) -> bool {
        self.success_flag && self.rtt.is_some()
    }
}

/// What the provider reports about a measurement process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProbeEventKind {
    /// One ICMP attempt finished
    Outcome(ProbeOutcome),
    /// The provider gave up on the whole measurement
    Interrupted { reason: String },
}

/// Event published by the provider, out of band from the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeEvent {
    pub process_id: Uuid,
    pub kind: ProbeEventKind,
}

impl ProbeEvent {
    pub fn outcome(process_id: Uuid, outcome: ProbeOutcome) -> Self {
        Self { process_id, kind: ProbeEventKind::Outcome(outcome) }
    }

    pub fn interrupted(process_id: Uuid, reason: impl Into<String>) -> Self {
        Self { process_id, kind: ProbeEventKind::Interrupted { reason: reason.into() } }
    }
}

/// A system as registered with the provider's event subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemDescriptor {
    pub system_name: String,
    pub address: String,
    pub port: u16,
}
