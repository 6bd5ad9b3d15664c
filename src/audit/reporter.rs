//! Compliance reporting over the audit history

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ReportingConfig;
use crate::error::{Error, Result};
use crate::privacy::{ClassificationLevel, ClassificationResult, PiiType};

use super::store::{AuditRecord, AuditStore, MemoryAuditStore};

/// Overall risk band derived from the risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 25.0 {
            Self::Low
        } else if score < 50.0 {
            Self::Medium
        } else if score < 75.0 {
            Self::High
        } else {
            Self::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_data_items_classified: usize,
    pub items_with_pii: usize,
    pub total_pii_detections: usize,
    pub average_processing_time_ms: f64,
    pub compliance_corrections: usize,
    pub pattern_timeouts: usize,
}

/// Items requiring each framework's protection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub gdpr_protected_items: usize,
    pub hipaa_protected_items: usize,
    pub pci_protected_items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Items classified RESTRICTED or TOP_SECRET
    pub high_risk_items: usize,
    pub average_detection_confidence: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

/// Aggregate, PII-free report over a time window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub period_days: u32,
    pub period_start: DateTime<Utc>,
    pub summary: ReportSummary,
    pub classification_distribution: BTreeMap<ClassificationLevel, usize>,
    pub pii_type_distribution: BTreeMap<PiiType, usize>,
    pub compliance: ComplianceSummary,
    pub risk_assessment: RiskAssessment,
    pub data_governance_score: f64,
    pub recommendations: Vec<String>,
}

/// Records classification results and aggregates them into reports
pub struct ComplianceReporter {
    store: Arc<dyn AuditStore>,
    config: ReportingConfig,
}

impl std::fmt::Debug for ComplianceReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplianceReporter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ComplianceReporter {
    /// Reporter backed by a bounded in-memory store
    pub fn new(config: &ReportingConfig) -> Result<Self> {
        let store = MemoryAuditStore::new(config.max_history)?;
        Ok(Self::with_store(Arc::new(store), config))
    }

    pub fn with_store(store: Arc<dyn AuditStore>, config: &ReportingConfig) -> Self {
        Self {
            store,
            config: config.clone(),
        }
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }

    /// Record a classification result in the audit history
    pub async fn add_result(&self, result: &ClassificationResult) -> Result<()> {
        let record = AuditRecord::from(result);
        debug!(
            classification = %record.classification,
            detections = record.detection_count,
            "Audit record appended"
        );
        self.store.append(record).await
    }

    /// Report over the configured default window
    pub async fn generate_default_report(&self) -> Result<ComplianceReport> {
        self.generate_report(self.config.default_window_days).await
    }

    /// Report over the last `days` days.
    ///
    /// Records older than the larger of `days` and the retention period are
    /// pruned first.
    pub async fn generate_report(&self, days: u32) -> Result<ComplianceReport> {
        if days == 0 {
            return Err(Error::Audit("report window must be at least one day".to_string()));
        }

        let generated_at = Utc::now();
        let keep_days = days.max(self.config.retention_days);
        let pruned = self
            .store
            .prune_before(days_before(generated_at, keep_days))
            .await?;

        let period_start = days_before(generated_at, days);
        let records = self.store.records_since(period_start).await?;
        let report = build_report(&records, days, generated_at, period_start);

        info!(
            report_id = %report.report_id,
            period_days = days,
            items = report.summary.total_data_items_classified,
            pruned,
            risk_score = report.risk_assessment.risk_score,
            governance = report.data_governance_score,
            "Compliance report generated"
        );
        Ok(report)
    }
}

/// `at` minus `days`, saturating at the earliest representable instant
fn days_before(at: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(days))
        .and_then(|span| at.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn build_report(
    records: &[AuditRecord],
    period_days: u32,
    generated_at: DateTime<Utc>,
    period_start: DateTime<Utc>,
) -> ComplianceReport {
    let total = records.len();

    let mut classification_distribution: BTreeMap<ClassificationLevel, usize> =
        ClassificationLevel::ALL.iter().map(|l| (*l, 0)).collect();
    let mut pii_type_distribution: BTreeMap<PiiType, usize> = BTreeMap::new();

    let mut items_with_pii = 0;
    let mut total_detections = 0;
    let mut confidence_sum = 0.0;
    let mut processing_sum = 0.0;
    let mut corrections = 0;
    let mut items_corrected = 0;
    let mut timeouts = 0;
    let mut items_timed_out = 0;
    let mut high_risk_items = 0;
    let mut compliance = ComplianceSummary {
        gdpr_protected_items: 0,
        hipaa_protected_items: 0,
        pci_protected_items: 0,
    };

    for record in records {
        *classification_distribution
            .entry(record.classification)
            .or_insert(0) += 1;
        for (pii_type, count) in &record.pii_counts {
            *pii_type_distribution.entry(*pii_type).or_insert(0) += count;
        }

        if record.detection_count > 0 {
            items_with_pii += 1;
        }
        total_detections += record.detection_count;
        confidence_sum += record.confidence_sum;
        processing_sum += record.processing_time_ms;

        corrections += record.corrections;
        timeouts += record.timeouts;
        if record.corrections > 0 {
            items_corrected += 1;
        }
        if record.timeouts > 0 {
            items_timed_out += 1;
        }
        if record.classification.is_high_risk() {
            high_risk_items += 1;
        }

        compliance.gdpr_protected_items += usize::from(record.gdpr);
        compliance.hipaa_protected_items += usize::from(record.hipaa);
        compliance.pci_protected_items += usize::from(record.pci);
    }

    let ratio = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 };
    let average_detection_confidence = if total_detections == 0 {
        0.0
    } else {
        confidence_sum / total_detections as f64
    };
    let risk_score = 100.0 * (0.6 * ratio(high_risk_items) + 0.4 * average_detection_confidence);
    let data_governance_score = if total == 0 {
        100.0
    } else {
        (100.0 - 0.5 * risk_score - 30.0 * ratio(items_corrected) - 20.0 * ratio(items_timed_out))
            .clamp(0.0, 100.0)
    };

    let summary = ReportSummary {
        total_data_items_classified: total,
        items_with_pii,
        total_pii_detections: total_detections,
        average_processing_time_ms: if total == 0 {
            0.0
        } else {
            processing_sum / total as f64
        },
        compliance_corrections: corrections,
        pattern_timeouts: timeouts,
    };
    let risk_assessment = RiskAssessment {
        high_risk_items,
        average_detection_confidence,
        risk_score,
        risk_level: RiskLevel::from_score(risk_score),
    };
    let recommendations = recommendations(&summary, &compliance, &risk_assessment, total);

    ComplianceReport {
        report_id: Uuid::new_v4().to_string(),
        generated_at,
        period_days,
        period_start,
        summary,
        classification_distribution,
        pii_type_distribution,
        compliance,
        risk_assessment,
        data_governance_score,
        recommendations,
    }
}

fn recommendations(
    summary: &ReportSummary,
    compliance: &ComplianceSummary,
    risk: &RiskAssessment,
    total: usize,
) -> Vec<String> {
    let mut out = Vec::new();

    if total > 0 && risk.high_risk_items as f64 / total as f64 > 0.2 {
        out.push(
            "Review access controls and encryption for RESTRICTED and TOP_SECRET data".to_string(),
        );
    }
    if matches!(risk.risk_level, RiskLevel::High | RiskLevel::Critical) {
        out.push("Apply redaction before sharing classified data downstream".to_string());
    }
    if compliance.gdpr_protected_items > 0 {
        out.push(
            "Ensure GDPR data subject request handling covers classified personal data"
                .to_string(),
        );
    }
    if compliance.hipaa_protected_items > 0 {
        out.push("Verify HIPAA safeguards for protected health information".to_string());
    }
    if compliance.pci_protected_items > 0 {
        out.push("Confirm PCI-DSS scope includes all systems handling cardholder data".to_string());
    }
    if summary.compliance_corrections > 0 {
        out.push(
            "Investigate compliance flag corrections raised by low-confidence detections"
                .to_string(),
        );
    }
    if summary.pattern_timeouts > 0 {
        out.push(
            "Pattern time budget was exceeded; review input sizes or detection.pattern_timeout_ms"
                .to_string(),
        );
    }
    if out.is_empty() {
        out.push("No action required".to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privacy::{DataClassifier, DataInput};

    fn reporter() -> ComplianceReporter {
        ComplianceReporter::new(&ReportingConfig::default()).unwrap()
    }

    fn record(classification: ClassificationLevel, detections: &[(PiiType, f64)]) -> AuditRecord {
        let mut pii_counts = BTreeMap::new();
        for (pii_type, _) in detections {
            *pii_counts.entry(*pii_type).or_insert(0) += 1;
        }
        AuditRecord {
            recorded_at: Utc::now(),
            classification,
            pii_counts,
            detection_count: detections.len(),
            confidence_sum: detections.iter().map(|(_, c)| c).sum(),
            confidence_max: detections.iter().map(|(_, c)| *c).fold(0.0, f64::max),
            gdpr: false,
            hipaa: false,
            pci: false,
            processing_time_ms: 2.0,
            corrections: 0,
            timeouts: 0,
        }
    }

    #[tokio::test]
    async fn test_report_counts_results_without_originals() {
        let classifier = DataClassifier::with_defaults().unwrap();
        let reporter = reporter();

        let first = "Contact john@example.com";
        let second = "SSN 123-45-6789 for the account";
        for text in [first, second] {
            let result = classifier
                .classify(&DataInput::from(text), None, None)
                .unwrap();
            reporter.add_result(&result).await.unwrap();
        }

        let report = reporter.generate_report(30).await.unwrap();
        assert_eq!(report.summary.total_data_items_classified, 2);
        assert_eq!(report.summary.items_with_pii, 2);
        assert_eq!(report.pii_type_distribution.get(&PiiType::Email), Some(&1));
        assert_eq!(report.pii_type_distribution.get(&PiiType::Ssn), Some(&1));
        assert_eq!(report.compliance.gdpr_protected_items, 1);
        assert_eq!(report.compliance.hipaa_protected_items, 1);
        assert_eq!(report.risk_assessment.high_risk_items, 1);

        let json = serde_json::to_string(&report).unwrap();
        for needle in [first, second, "john@example.com", "123-45-6789"] {
            assert!(!json.contains(needle), "report leaked {}", needle);
        }
    }

    #[tokio::test]
    async fn test_empty_report() {
        let report = reporter().generate_report(30).await.unwrap();
        assert_eq!(report.summary.total_data_items_classified, 0);
        assert_eq!(report.data_governance_score, 100.0);
        assert_eq!(report.risk_assessment.risk_score, 0.0);
        assert_eq!(report.risk_assessment.risk_level, RiskLevel::Low);
        assert_eq!(report.recommendations, vec!["No action required".to_string()]);
        assert_eq!(
            report.classification_distribution.len(),
            ClassificationLevel::ALL.len()
        );
    }

    #[tokio::test]
    async fn test_risk_and_governance_scores() {
        let store = Arc::new(MemoryAuditStore::new(100).unwrap());
        let reporter = ComplianceReporter::with_store(store.clone(), &ReportingConfig::default());

        store
            .append(record(ClassificationLevel::Restricted, &[(PiiType::Ssn, 1.0)]))
            .await
            .unwrap();
        let mut corrected = record(ClassificationLevel::Confidential, &[(PiiType::Email, 0.5)]);
        corrected.corrections = 1;
        store.append(corrected).await.unwrap();

        let report = reporter.generate_report(30).await.unwrap();
        let risk = &report.risk_assessment;
        // high_risk_ratio 0.5, average confidence 0.75
        assert!((risk.average_detection_confidence - 0.75).abs() < 1e-9);
        assert!((risk.risk_score - 60.0).abs() < 1e-9);
        assert_eq!(risk.risk_level, RiskLevel::High);
        // 100 - 30 - 15
        assert!((report.data_governance_score - 55.0).abs() < 1e-9);
        assert_eq!(report.summary.compliance_corrections, 1);
        assert_eq!(
            report
                .classification_distribution
                .get(&ClassificationLevel::Restricted),
            Some(&1)
        );
    }

    #[tokio::test]
    async fn test_window_and_retention() {
        let store = Arc::new(MemoryAuditStore::new(100).unwrap());
        let reporter = ComplianceReporter::with_store(store.clone(), &ReportingConfig::default());

        let mut old = record(ClassificationLevel::Public, &[]);
        old.recorded_at = Utc::now() - Duration::days(120);
        let mut recent = record(ClassificationLevel::Public, &[]);
        recent.recorded_at = Utc::now() - Duration::days(40);
        store.append(old).await.unwrap();
        store.append(recent).await.unwrap();
        store.append(record(ClassificationLevel::Internal, &[])).await.unwrap();

        let report = reporter.generate_report(30).await.unwrap();
        assert_eq!(report.summary.total_data_items_classified, 1);
        // Beyond the 90 day retention only
        assert_eq!(store.len().await.unwrap(), 2);

        let report = reporter.generate_report(60).await.unwrap();
        assert_eq!(report.summary.total_data_items_classified, 2);
    }

    #[tokio::test]
    async fn test_zero_day_window_rejected() {
        let err = reporter().generate_report(0).await.unwrap_err();
        assert!(matches!(err, Error::Audit(_)));
    }

    #[tokio::test]
    async fn test_huge_window_covers_all_history() {
        let store = Arc::new(MemoryAuditStore::new(100).unwrap());
        let reporter = ComplianceReporter::with_store(store.clone(), &ReportingConfig::default());
        let mut old = record(ClassificationLevel::Internal, &[]);
        old.recorded_at = Utc::now() - Duration::days(5_000);
        store.append(old).await.unwrap();
        store.append(record(ClassificationLevel::Public, &[])).await.unwrap();

        for days in [200_000_000, u32::MAX] {
            let report = reporter.generate_report(days).await.unwrap();
            assert_eq!(report.period_days, days);
            assert_eq!(report.period_start, DateTime::<Utc>::MIN_UTC);
            assert_eq!(report.summary.total_data_items_classified, 2);
        }
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_default_window() {
        let reporter = reporter();
        let report = reporter.generate_default_report().await.unwrap();
        assert_eq!(report.period_days, 30);
    }

    #[tokio::test]
    async fn test_concurrent_add_result() {
        let classifier = Arc::new(DataClassifier::with_defaults().unwrap());
        let reporter = Arc::new(reporter());

        let mut handles = Vec::new();
        for i in 0..16 {
            let classifier = Arc::clone(&classifier);
            let reporter = Arc::clone(&reporter);
            handles.push(tokio::spawn(async move {
                let input = DataInput::from(format!("ticket {} from user{}@example.com", i, i));
                let result = classifier.classify(&input, None, None).unwrap();
                reporter.add_result(&result).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let report = reporter.generate_report(1).await.unwrap();
        assert_eq!(report.summary.total_data_items_classified, 16);
        assert_eq!(report.pii_type_distribution.get(&PiiType::Email), Some(&16));
    }

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(24.9), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(25.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(50.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(75.0), RiskLevel::Critical);
    }
}
