//! Audit history storage
//!
//! Records hold counts and scores only. Nothing derived from a detected
//! value (not even its hash) and no `data_id` is ever stored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::privacy::{ClassificationLevel, ClassificationResult, PiiType};

/// PII-free summary of one classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub recorded_at: DateTime<Utc>,
    pub classification: ClassificationLevel,
    pub pii_counts: BTreeMap<PiiType, usize>,
    pub detection_count: usize,
    pub confidence_sum: f64,
    pub confidence_max: f64,
    pub gdpr: bool,
    pub hipaa: bool,
    pub pci: bool,
    pub processing_time_ms: f64,
    pub corrections: usize,
    pub timeouts: usize,
}

impl From<&ClassificationResult> for AuditRecord {
    fn from(result: &ClassificationResult) -> Self {
        let mut pii_counts = BTreeMap::new();
        for detection in &result.pii_detected {
            *pii_counts.entry(detection.pii_type()).or_insert(0) += 1;
        }

        Self {
            recorded_at: result.classified_at,
            classification: result.classification,
            pii_counts,
            detection_count: result.pii_detected.len(),
            confidence_sum: result.pii_detected.iter().map(|d| d.confidence()).sum(),
            confidence_max: result.highest_pii_confidence,
            gdpr: result.requires_gdpr_protection,
            hipaa: result.requires_hipaa_protection,
            pci: result.requires_pci_protection,
            processing_time_ms: result.processing_time_ms,
            corrections: result.compliance_corrections.len(),
            timeouts: result.pattern_timeouts.len(),
        }
    }
}

/// Backend for audit history
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append a record
    async fn append(&self, record: AuditRecord) -> Result<()>;

    /// Records at or after `since`, oldest first
    async fn records_since(&self, since: DateTime<Utc>) -> Result<Vec<AuditRecord>>;

    /// Drop records older than `cutoff`, returning how many were removed
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

/// Bounded in-memory store; the oldest record is evicted at capacity
#[derive(Debug)]
pub struct MemoryAuditStore {
    records: RwLock<VecDeque<AuditRecord>>,
    capacity: usize,
}

impl MemoryAuditStore {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Audit("audit store capacity must be > 0".to_string()));
        }
        Ok(Self {
            records: RwLock::new(VecDeque::new()),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, record: AuditRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.push_back(record);
        while records.len() > self.capacity {
            records.pop_front();
        }
        Ok(())
    }

    async fn records_since(&self, since: DateTime<Utc>) -> Result<Vec<AuditRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.recorded_at >= since)
            .cloned()
            .collect())
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.recorded_at >= cutoff);
        Ok(before - records.len())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record_at(recorded_at: DateTime<Utc>) -> AuditRecord {
        AuditRecord {
            recorded_at,
            classification: ClassificationLevel::Public,
            pii_counts: BTreeMap::new(),
            detection_count: 0,
            confidence_sum: 0.0,
            confidence_max: 0.0,
            gdpr: false,
            hipaa: false,
            pci: false,
            processing_time_ms: 1.0,
            corrections: 0,
            timeouts: 0,
        }
    }

    #[tokio::test]
    async fn test_append_and_len() {
        let store = MemoryAuditStore::new(10).unwrap();
        assert!(store.is_empty().await.unwrap());
        store.append(record_at(Utc::now())).await.unwrap();
        store.append(record_at(Utc::now())).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let store = MemoryAuditStore::new(3).unwrap();
        let base = Utc::now();
        for i in 0..5 {
            store
                .append(record_at(base + Duration::seconds(i)))
                .await
                .unwrap();
        }
        assert_eq!(store.len().await.unwrap(), 3);
        let records = store.records_since(base - Duration::days(1)).await.unwrap();
        assert_eq!(records[0].recorded_at, base + Duration::seconds(2));
    }

    #[tokio::test]
    async fn test_records_since_and_prune() {
        let store = MemoryAuditStore::new(10).unwrap();
        let now = Utc::now();
        store.append(record_at(now - Duration::days(40))).await.unwrap();
        store.append(record_at(now - Duration::days(10))).await.unwrap();
        store.append(record_at(now)).await.unwrap();

        let recent = store.records_since(now - Duration::days(30)).await.unwrap();
        assert_eq!(recent.len(), 2);

        let removed = store.prune_before(now - Duration::days(30)).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(MemoryAuditStore::new(0), Err(Error::Audit(_))));
    }
}
