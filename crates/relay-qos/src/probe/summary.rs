//! Aggregate statistics of one ping measurement.

use serde::{Deserialize, Serialize};

use super::types::ProbeOutcome;

/// Statistics over the attempts of one measurement
///
/// "With timeout" figures count an unanswered attempt at the per-attempt
/// timeout; "without timeout" figures use answered attempts only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingSummary {
    pub available: bool,
    pub sent: u32,
    pub received: u32,
    pub lost_percent: u32,
    pub min_rtt: Option<u32>,
    pub max_rtt: Option<u32>,
    pub mean_rtt_with_timeout: Option<u32>,
    pub mean_rtt_without_timeout: Option<u32>,
    pub jitter_with_timeout: Option<u32>,
    pub jitter_without_timeout: Option<u32>,
}

impl PingSummary {
    pub fn from_outcomes(outcomes: &[ProbeOutcome], timeout_ms: u64) -> Self {
        let timeout = u32::try_from(timeout_ms).unwrap_or(u32::MAX);
        let replies: Vec<u32> = outcomes.iter().filter(|o| o.is_reply()).filter_map(|o| o.rtt).collect();
        let with_timeout: Vec<u32> = outcomes
            .iter()
            .map(|o| if o.is_reply() { o.rtt.unwrap_or(timeout) } else { timeout })
            .collect();

        let sent = outcomes.len() as u32;
        let received = replies.len() as u32;
        let lost_percent = if sent == 0 { 0 } else { (sent - received) * 100 / sent };

        Self {
            available: received > 0,
            sent,
            received,
            lost_percent,
            min_rtt: replies.iter().copied().min(),
            max_rtt: replies.iter().copied().max(),
            mean_rtt_with_timeout: mean(&with_timeout).map(round),
            mean_rtt_without_timeout: mean(&replies).map(round),
            jitter_with_timeout: deviation(&with_timeout).map(round),
            jitter_without_timeout: deviation(&replies).map(round),
        }
    }
}

fn mean(values: &[u32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|v| f64::from(*v)).sum::<f64>() / values.len() as f64)
}

/// Population standard deviation
fn deviation(values: &[u32]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (f64::from(*v) - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

fn round(value: f64) -> u32 {
    value.round() as u32
}
