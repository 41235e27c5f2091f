//! In-memory measurement catalog.
//!
//! Holds the latest record per (cloud, relay, kind) and enforces the
//! NEW -> PENDING -> FINISHED lifecycle for writers.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::directory::MeasurementCatalog;
use crate::model::{
    CloudId, MeasurementKind, MeasurementRecord, MeasurementStatus, MeasurementUpdate, Relay,
};

type RecordKey = (CloudId, String, u16, MeasurementKind);

fn key(cloud: &CloudId, relay: &Relay, kind: MeasurementKind) -> RecordKey {
    (cloud.clone(), relay.address.to_ascii_lowercase(), relay.port, kind)
}

/// Measurement records kept in process memory
#[derive(Default)]
pub struct MemoryCatalog {
    records: RwLock<HashMap<RecordKey, MeasurementRecord>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record as is
    pub async fn insert(&self, record: MeasurementRecord) {
        let key = key(&record.cloud, &record.relay, record.kind);
        self.records.write().await.insert(key, record);
    }

    /// Move a pair to PENDING, creating it as NEW first if it was never seen
    pub async fn mark_pending(&self, cloud: &CloudId, relay: &Relay, kind: MeasurementKind) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .entry(key(cloud, relay, kind))
            .or_insert_with(|| MeasurementRecord::new(cloud.clone(), relay.clone(), kind));

        if record.status == MeasurementStatus::Pending {
            bail!("Measurement of {} via {} is already pending", cloud, relay);
        }

        debug!("Measurement of {} via {}: {} -> PENDING", cloud, relay, record.status);
        record.status = MeasurementStatus::Pending;
        Ok(())
    }

    /// Record a finished measurement
    pub async fn record_result(
        &self,
        cloud: &CloudId,
        relay: &Relay,
        kind: MeasurementKind,
        measured_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(&key(cloud, relay, kind)) else {
            bail!("No measurement of {} via {} to record a result for", cloud, relay);
        };

        debug!("Measurement of {} via {}: {} -> FINISHED", cloud, relay, record.status);
        record.status = MeasurementStatus::Finished;
        record.last_measurement_at = measured_at;
        Ok(())
    }

    /// Apply a reported status change
    ///
    /// NEW resets the pair, PENDING and FINISHED follow the same rules as
    /// [`mark_pending`](Self::mark_pending) and
    /// [`record_result`](Self::record_result).
    pub async fn apply(&self, update: &MeasurementUpdate, kind: MeasurementKind) -> Result<()> {
        match update.status {
            MeasurementStatus::New => {
                self.insert(MeasurementRecord::new(update.cloud.clone(), update.relay.clone(), kind)).await;
                Ok(())
            }
            MeasurementStatus::Pending => self.mark_pending(&update.cloud, &update.relay, kind).await,
            MeasurementStatus::Finished => {
                let measured_at = update.measured_at.unwrap_or_else(Utc::now);
                self.record_result(&update.cloud, &update.relay, kind, measured_at).await
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl MeasurementCatalog for MemoryCatalog {
    async fn get(
        &self,
        cloud: &CloudId,
        relay: &Relay,
        kind: MeasurementKind,
    ) -> Result<Option<MeasurementRecord>> {
        Ok(self.records.read().await.get(&key(cloud, relay, kind)).cloned())
    }
}
