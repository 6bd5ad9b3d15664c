//! Audit trail and compliance reporting
//!
//! Classification results are reduced to PII-free [`AuditRecord`]s and kept
//! in an [`AuditStore`]. The [`ComplianceReporter`] aggregates them into
//! windowed reports with distributions, risk and governance scores.

pub mod reporter;
pub mod store;

pub use reporter::{
    ComplianceReport, ComplianceReporter, ComplianceSummary, ReportSummary, RiskAssessment,
    RiskLevel,
};
pub use store::{AuditRecord, AuditStore, MemoryAuditStore};
