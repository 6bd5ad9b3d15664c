//! Privacy classification and data protection
//!
//! Detects PII in text and structured data and derives what protection the
//! data needs. Includes:
//! - Input admission control (size, depth, encoding)
//! - Regex and keyword based PII detection with confidence scoring
//! - Sensitivity tiers and compliance flags (GDPR, HIPAA, PCI-DSS)
//! - Span-preserving redaction

mod checksum;
pub mod classifier;
pub mod compliance;
pub mod detector;
pub mod patterns;
pub mod redactor;
pub mod types;
pub mod validator;

pub use classifier::DataClassifier;
pub use compliance::{ComplianceEngine, ComplianceFlags, ComplianceFramework};
pub use detector::{DetectionOutcome, PiiDetector};
pub use patterns::{KeywordMatcher, PatternTable};
pub use redactor::Redactor;
pub use types::{
    safe_log, ClassificationContext, ClassificationLevel, ClassificationResult,
    ComplianceCorrection, DataInput, FieldPath, KeywordHit, Location, PathSegment, PiiDetection,
    PiiType,
};
pub use validator::{InputValidator, ValidatedInput};
