//! Data classifier
//!
//! Combines PII detection, business sensitivity keywords and compliance
//! triggers into a single [`ClassificationResult`]:
//!
//! ```text
//! DataInput ──validate──► ValidatedInput ──detect──► detections
//!                                 │                      │
//!                                 └──keywords──► hits    │
//!                                                 │      │
//!                                  tier = max(min_level, keyword level)
//!                                  flags = fast path + validation pass
//! ```

use chrono::Utc;
use serde_json::Value;
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::config::SafeScanConfig;
use crate::error::Result;

use super::compliance::ComplianceEngine;
use super::detector::PiiDetector;
use super::patterns::KeywordMatcher;
use super::types::{
    ClassificationContext, ClassificationLevel, ClassificationResult, DataInput, KeywordHit,
};
use super::validator::{InputValidator, ValidatedInput};

/// Business sensitivity keywords and the tier each implies
const SENSITIVITY_KEYWORDS: &[(&str, ClassificationLevel)] = &[
    ("top secret", ClassificationLevel::TopSecret),
    ("top-secret", ClassificationLevel::TopSecret),
    ("eyes only", ClassificationLevel::TopSecret),
    ("restricted", ClassificationLevel::Restricted),
    ("strictly confidential", ClassificationLevel::Restricted),
    ("highly confidential", ClassificationLevel::Restricted),
    ("trade secret", ClassificationLevel::Restricted),
    ("confidential", ClassificationLevel::Confidential),
    ("proprietary", ClassificationLevel::Confidential),
    ("privileged", ClassificationLevel::Confidential),
    ("internal only", ClassificationLevel::Internal),
    ("internal-only", ClassificationLevel::Internal),
    ("internal use only", ClassificationLevel::Internal),
    ("do not distribute", ClassificationLevel::Internal),
];

/// Classifies text or structured data by sensitivity.
///
/// Construct once and share (e.g. behind an `Arc`); classification takes
/// `&self` and touches no mutable state.
#[derive(Debug)]
pub struct DataClassifier {
    validator: InputValidator,
    detector: PiiDetector,
    compliance: ComplianceEngine,
    sensitivity: KeywordMatcher<ClassificationLevel>,
}

impl DataClassifier {
    pub fn new(config: &SafeScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            validator: InputValidator::new(&config.limits),
            detector: PiiDetector::new(config)?,
            compliance: ComplianceEngine::new(config.detection.flag_confidence_threshold)?,
            sensitivity: KeywordMatcher::new(SENSITIVITY_KEYWORDS)?,
        })
    }

    /// Classifier with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(&SafeScanConfig::default())
    }

    pub fn validator(&self) -> &InputValidator {
        &self.validator
    }

    pub fn detector(&self) -> &PiiDetector {
        &self.detector
    }

    /// Validate and classify an input.
    ///
    /// `data_id` defaults to a fresh UUID. Validation errors are returned
    /// before any detection work is done.
    pub fn classify(
        &self,
        input: &DataInput,
        data_id: Option<&str>,
        context: Option<&ClassificationContext>,
    ) -> Result<ClassificationResult> {
        let validated = self.validator.validate(input)?;
        Ok(self.classify_validated(validated, data_id, context))
    }

    /// Classify input that already passed validation
    pub fn classify_validated(
        &self,
        input: ValidatedInput<'_>,
        data_id: Option<&str>,
        context: Option<&ClassificationContext>,
    ) -> ClassificationResult {
        let started = Instant::now();
        let data_id = data_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let outcome = self.detector.scan(&input, context);
        let detections = outcome.detections;

        let haystacks = keyword_haystacks(input.input(), context);
        let keyword_hits = self.keyword_hits(&haystacks);

        let classification = detections
            .iter()
            .map(|d| d.pii_type().min_level())
            .chain(keyword_hits.iter().map(|h| h.level))
            .max()
            .unwrap_or(ClassificationLevel::Public);

        let mut flags = self
            .compliance
            .fast_flags(&detections, haystacks.iter().copied());
        let corrections = self.compliance.validate_flags(&mut flags, &detections);

        let pii_count = detections.len();
        let confidence = if detections.is_empty() {
            1.0
        } else {
            detections.iter().map(|d| d.confidence()).sum::<f64>() / pii_count as f64
        };
        let highest_pii_confidence = detections
            .iter()
            .map(|d| d.confidence())
            .fold(0.0, f64::max);
        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        debug!(
            data_id = %data_id,
            classification = %classification,
            pii_count,
            keywords = keyword_hits.len(),
            corrections = corrections.len(),
            processing_time_ms,
            "Classification complete"
        );

        ClassificationResult {
            data_id,
            classification,
            confidence,
            pii_detected: detections,
            pii_count,
            highest_pii_confidence,
            requires_gdpr_protection: flags.gdpr,
            requires_hipaa_protection: flags.hipaa,
            requires_pci_protection: flags.pci,
            sensitivity_keywords: keyword_hits,
            compliance_corrections: corrections,
            pattern_timeouts: outcome.timed_out,
            classified_at: Utc::now(),
            processing_time_ms,
        }
    }

    /// Distinct business keywords found in any haystack
    fn keyword_hits(&self, haystacks: &[&str]) -> Vec<KeywordHit> {
        let mut hits: Vec<KeywordHit> = Vec::new();
        for haystack in haystacks {
            for (keyword, level) in self.sensitivity.find_all(haystack) {
                if !hits.iter().any(|h| h.keyword == keyword) {
                    hits.push(KeywordHit {
                        keyword: keyword.to_string(),
                        level,
                    });
                }
            }
        }
        hits
    }
}

/// Text scanned for keywords: the input text or every string leaf, plus
/// caller context values.
fn keyword_haystacks<'a>(
    input: &'a DataInput,
    context: Option<&'a ClassificationContext>,
) -> Vec<&'a str> {
    let mut out = Vec::new();
    match input {
        DataInput::Text(text) => out.push(text.as_str()),
        DataInput::Structured(value) => {
            // Depth was bounded by validation.
            let mut stack = vec![value];
            while let Some(value) = stack.pop() {
                match value {
                    Value::String(s) => out.push(s.as_str()),
                    Value::Array(items) => stack.extend(items.iter().rev()),
                    Value::Object(map) => stack.extend(map.values()),
                    _ => {}
                }
            }
        }
    }
    if let Some(context) = context {
        out.extend(context.values().map(String::as_str));
    }
    out
}
