//! SafeScan - PII detection, data classification and compliance reporting
//!
//! SafeScan inspects free text or nested structured data, detects personally
//! identifiable information, assigns a sensitivity tier and derives the
//! regulatory obligations (GDPR, HIPAA, PCI-DSS) that apply to it. Results
//! can be redacted and aggregated into PII-free compliance reports.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          DataClassifier                             │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌────────────────┐  │
//! │  │  InputValidator  │──►│   PiiDetector    │──►│  Tier + Flags  │  │
//! │  │  - size limit    │   │  - PatternTable  │   │  - keywords    │  │
//! │  │  - depth limit   │   │  - scoring       │   │  - compliance  │  │
//! │  │  - encoding      │   │  - time budget   │   │    validation  │  │
//! │  └──────────────────┘   └──────────────────┘   └───────┬────────┘  │
//! └────────────────────────────────────────────────────────┼───────────┘
//!                                                          │
//!                               ClassificationResult ◄─────┘
//!                                 │                │
//!                    ┌────────────▼───┐    ┌───────▼──────────────────┐
//!                    │    Redactor    │    │   ComplianceReporter     │
//!                    │  masked copy   │    │  AuditStore (no PII)     │
//!                    └────────────────┘    │  windowed reports        │
//!                                          └──────────────────────────┘
//! ```
//!
//! ## Data safety
//!
//! - Raw matched values live only inside [`privacy::PiiDetection`], are
//!   zeroized on drop, and are never serialized or printed
//! - Logs go through [`privacy::safe_log`], which renders masked values only
//! - Audit records keep counts and scores, never values or hashes
//!
//! ## Modules
//!
//! - [`privacy`]: Validation, detection, classification and redaction
//! - [`audit`]: Audit history and compliance reports
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod audit;
pub mod config;
pub mod error;
pub mod privacy;

pub use audit::{ComplianceReport, ComplianceReporter};
pub use config::SafeScanConfig;
pub use error::{Error, Result};
pub use privacy::{
    safe_log, ClassificationLevel, ClassificationResult, DataClassifier, DataInput, PiiDetection,
    PiiType, Redactor,
};
