//! Compliance flag derivation for GDPR, HIPAA and PCI-DSS.
//!
//! Flags are computed in two steps:
//!
//! 1. **Fast path**: detections at or above the flag confidence threshold,
//!    plus framework keywords found in the input.
//! 2. **Validation pass**: every detection is re-checked against the trigger
//!    tables regardless of confidence. A framework whose trigger type is
//!    present but whose flag is still false is forced on and the correction
//!    is recorded. The pass never lowers a flag.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::error::Result;

use super::patterns::KeywordMatcher;
use super::types::{ComplianceCorrection, PiiDetection, PiiType};

/// Regulatory framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceFramework {
    /// GDPR, EU personal data
    Gdpr,
    /// HIPAA, protected health information
    Hipaa,
    /// PCI-DSS, payment card data
    PciDss,
}

impl ComplianceFramework {
    pub const ALL: [ComplianceFramework; 3] = [
        ComplianceFramework::Gdpr,
        ComplianceFramework::Hipaa,
        ComplianceFramework::PciDss,
    ];

    /// PII types whose presence requires this framework's protection
    pub fn triggers(&self) -> &'static [PiiType] {
        match self {
            Self::Gdpr => &[
                PiiType::Email,
                PiiType::Name,
                PiiType::Address,
                PiiType::Phone,
                PiiType::IpAddress,
            ],
            Self::Hipaa => &[PiiType::Ssn, PiiType::DateOfBirth],
            Self::PciDss => &[PiiType::CreditCard],
        }
    }

    pub fn is_triggered_by(&self, pii_type: PiiType) -> bool {
        self.triggers().contains(&pii_type)
    }

    /// Keywords that require this framework's protection on their own
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Gdpr => &[],
            Self::Hipaa => MEDICAL_KEYWORDS,
            Self::PciDss => PAYMENT_KEYWORDS,
        }
    }
}

impl fmt::Display for ComplianceFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gdpr => write!(f, "GDPR"),
            Self::Hipaa => write!(f, "HIPAA"),
            Self::PciDss => write!(f, "PCI-DSS"),
        }
    }
}

const MEDICAL_KEYWORDS: &[&str] = &[
    "patient",
    "diagnosis",
    "medical",
    "prescription",
    "treatment",
    "clinical",
    "health record",
    "medical record",
    "mrn",
];

const PAYMENT_KEYWORDS: &[&str] = &[
    "credit card",
    "card number",
    "cvv",
    "cvc",
    "cardholder",
    "payment",
    "billing",
];

/// Protection flags for one classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplianceFlags {
    pub gdpr: bool,
    pub hipaa: bool,
    pub pci: bool,
}

impl ComplianceFlags {
    pub fn get(&self, framework: ComplianceFramework) -> bool {
        match framework {
            ComplianceFramework::Gdpr => self.gdpr,
            ComplianceFramework::Hipaa => self.hipaa,
            ComplianceFramework::PciDss => self.pci,
        }
    }

    fn raise(&mut self, framework: ComplianceFramework) {
        match framework {
            ComplianceFramework::Gdpr => self.gdpr = true,
            ComplianceFramework::Hipaa => self.hipaa = true,
            ComplianceFramework::PciDss => self.pci = true,
        }
    }
}

/// Derives compliance flags from detections and framework keywords
#[derive(Debug)]
pub struct ComplianceEngine {
    keywords: KeywordMatcher<ComplianceFramework>,
    flag_threshold: f64,
}

impl ComplianceEngine {
    /// Build an engine; detections below `flag_threshold` are ignored by the
    /// fast path.
    pub fn new(flag_threshold: f64) -> Result<Self> {
        let entries: Vec<(&'static str, ComplianceFramework)> = ComplianceFramework::ALL
            .iter()
            .flat_map(|fw| fw.keywords().iter().map(move |k| (*k, *fw)))
            .collect();

        Ok(Self {
            keywords: KeywordMatcher::new(&entries)?,
            flag_threshold,
        })
    }

    /// Flags from confident detections and keywords in `haystacks`
    pub fn fast_flags<'a, I>(&self, detections: &[PiiDetection], haystacks: I) -> ComplianceFlags
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut flags = ComplianceFlags::default();

        for detection in detections
            .iter()
            .filter(|d| d.confidence() >= self.flag_threshold)
        {
            for framework in ComplianceFramework::ALL {
                if framework.is_triggered_by(detection.pii_type()) {
                    flags.raise(framework);
                }
            }
        }

        for haystack in haystacks {
            for (_, framework) in self.keywords.find_all(haystack) {
                flags.raise(framework);
            }
        }

        flags
    }

    /// Force on any flag whose trigger type was detected, returning one
    /// correction per raised framework.
    pub fn validate_flags(
        &self,
        flags: &mut ComplianceFlags,
        detections: &[PiiDetection],
    ) -> Vec<ComplianceCorrection> {
        let mut corrections = Vec::new();

        for framework in ComplianceFramework::ALL {
            if flags.get(framework) {
                continue;
            }
            let Some(trigger) = detections
                .iter()
                .map(|d| d.pii_type())
                .find(|t| framework.is_triggered_by(*t))
            else {
                continue;
            };

            flags.raise(framework);
            warn!(
                target: "safescan::audit",
                framework = %framework,
                trigger = %trigger,
                "Compliance flag raised by validation pass"
            );
            corrections.push(ComplianceCorrection { framework, trigger });
        }

        corrections
    }
}
