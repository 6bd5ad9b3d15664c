//! Core privacy data model: PII types, classification tiers, detections
//! and classification results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use zeroize::Zeroizing;

use super::compliance::ComplianceFramework;

/// Caller-supplied context for a classification call (e.g. `source`,
/// `purpose`). Values are scanned for keywords, never for PII.
pub type ClassificationContext = HashMap<String, String>;

/// Category of personally identifiable information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiType {
    Email,
    Phone,
    Ssn,
    CreditCard,
    IpAddress,
    Name,
    Address,
    DateOfBirth,
    Passport,
    DriverLicense,
    ApiKey,
    Token,
    Biometric,
}

impl PiiType {
    /// All PII types, in table order
    pub const ALL: [PiiType; 13] = [
        PiiType::Email,
        PiiType::Phone,
        PiiType::Ssn,
        PiiType::CreditCard,
        PiiType::IpAddress,
        PiiType::Name,
        PiiType::Address,
        PiiType::DateOfBirth,
        PiiType::Passport,
        PiiType::DriverLicense,
        PiiType::ApiKey,
        PiiType::Token,
        PiiType::Biometric,
    ];

    /// Stable snake_case identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Ssn => "ssn",
            Self::CreditCard => "credit_card",
            Self::IpAddress => "ip_address",
            Self::Name => "name",
            Self::Address => "address",
            Self::DateOfBirth => "date_of_birth",
            Self::Passport => "passport",
            Self::DriverLicense => "driver_license",
            Self::ApiKey => "api_key",
            Self::Token => "token",
            Self::Biometric => "biometric",
        }
    }

    /// Lowest classification tier implied by a single detection of this type
    pub fn min_level(&self) -> ClassificationLevel {
        match self {
            Self::IpAddress => ClassificationLevel::Internal,
            Self::Email | Self::Phone | Self::Name | Self::Address | Self::DateOfBirth => {
                ClassificationLevel::Confidential
            }
            Self::Ssn
            | Self::CreditCard
            | Self::Passport
            | Self::DriverLicense
            | Self::ApiKey
            | Self::Token => ClassificationLevel::Restricted,
            Self::Biometric => ClassificationLevel::TopSecret,
        }
    }

    /// Keywords that, near a match or in a field name, raise confidence
    pub fn context_keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Email => &["email", "e-mail", "mail"],
            Self::Phone => &["phone", "tel", "telephone", "mobile", "cell", "fax"],
            Self::Ssn => &["ssn", "social security", "social_security"],
            Self::CreditCard => &["card", "credit", "visa", "mastercard", "amex", "pan"],
            Self::IpAddress => &["ip", "ip_address", "host", "client", "remote"],
            Self::Name => &[
                "name",
                "first_name",
                "last_name",
                "full_name",
                "patient",
                "customer",
                "employee",
            ],
            Self::Address => &["address", "street", "residence", "mailing"],
            Self::DateOfBirth => &["dob", "birth", "born", "birthday", "date_of_birth", "birthdate"],
            Self::Passport => &["passport"],
            Self::DriverLicense => &["driver", "license", "licence", "driver_license", "dl"],
            Self::ApiKey => &["api", "key", "secret", "api_key", "apikey"],
            Self::Token => &["token", "bearer", "authorization", "auth", "session"],
            Self::Biometric => &["biometric", "fingerprint", "retina", "iris", "faceprint"],
        }
    }

    /// Type-appropriate mask for a raw value
    pub fn mask(&self, value: &str) -> String {
        let len = value.len();
        match self {
            Self::Email => match value.find('@') {
                Some(at_pos) => format!("***{}", &value[at_pos..]),
                None => "[REDACTED:EMAIL]".to_string(),
            },
            Self::CreditCard => match last_digits(value, 4) {
                Some(tail) if len >= 12 => format!("****-****-****-{}", tail),
                _ => "[REDACTED:CREDIT_CARD]".to_string(),
            },
            Self::Ssn => "***-**-****".to_string(),
            Self::Phone => match last_digits(value, 4) {
                Some(tail) => format!("***-***-{}", tail),
                None => "[REDACTED:PHONE]".to_string(),
            },
            Self::ApiKey => "[API_KEY_REDACTED]".to_string(),
            Self::Token => "[TOKEN_REDACTED]".to_string(),
            other => format!("[REDACTED:{}]", other.as_str().to_uppercase()),
        }
    }
}

impl fmt::Display for PiiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last `n` ASCII digits of a value, if it has that many
fn last_digits(value: &str, n: usize) -> Option<String> {
    let digits: Vec<char> = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < n {
        return None;
    }
    Some(digits[digits.len() - n..].iter().collect())
}

/// Sensitivity tier, totally ordered from least to most sensitive
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationLevel {
    #[default]
    Public,
    Internal,
    Confidential,
    Restricted,
    TopSecret,
}

impl ClassificationLevel {
    /// All tiers in ascending order
    pub const ALL: [ClassificationLevel; 5] = [
        ClassificationLevel::Public,
        ClassificationLevel::Internal,
        ClassificationLevel::Confidential,
        ClassificationLevel::Restricted,
        ClassificationLevel::TopSecret,
    ];

    /// Whether this tier counts as high risk in audit reports
    pub fn is_high_risk(&self) -> bool {
        *self >= ClassificationLevel::Restricted
    }
}

impl fmt::Display for ClassificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Public => "PUBLIC",
            Self::Internal => "INTERNAL",
            Self::Confidential => "CONFIDENTIAL",
            Self::Restricted => "RESTRICTED",
            Self::TopSecret => "TOP_SECRET",
        };
        f.write_str(s)
    }
}

/// One step of a path into structured data
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Path to a leaf of structured input, displayed as `user.emails[0]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// Empty (root) path
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted prefix such as `request.body` into key segments
    pub fn from_dotted(prefix: &str) -> Self {
        Self(
            prefix
                .split('.')
                .filter(|s| !s.is_empty())
                .map(|s| PathSegment::Key(s.to_string()))
                .collect(),
        )
    }

    /// Path extended with an object key
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self(segments)
    }

    /// Path extended with an array index
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Nearest enclosing object key, used as detection context
    pub fn last_key(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|s| match s {
            PathSegment::Key(k) => Some(k.as_str()),
            PathSegment::Index(_) => None,
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if i == 0 => write!(f, "{}", k)?,
                PathSegment::Key(k) => write!(f, ".{}", k)?,
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Where a detection was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    /// Byte span in a text input
    Text { start: usize, end: usize },
    /// Byte span inside the string form of a structured leaf
    Field {
        path: FieldPath,
        start: usize,
        end: usize,
    },
}

impl Location {
    /// Byte span of the match
    pub fn span(&self) -> (usize, usize) {
        match self {
            Self::Text { start, end } | Self::Field { start, end, .. } => (*start, *end),
        }
    }

    /// Field path, for structured detections
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::Text { .. } => None,
            Self::Field { path, .. } => Some(path),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { start, end } => write!(f, "{}..{}", start, end),
            Self::Field { path, .. } if path.is_root() => f.write_str("$"),
            Self::Field { path, .. } => write!(f, "{}", path),
        }
    }
}

/// One matched sensitive fragment.
///
/// The raw matched value is kept only for the lifetime of the value and is
/// zeroized on drop. It is never serialized and never printed by `Debug` or
/// `Display`.
#[derive(Clone, Serialize)]
pub struct PiiDetection {
    pii_type: PiiType,
    confidence: f64,
    location: Location,
    value_hash: String,
    redacted_value: String,
    #[serde(skip)]
    original_value: Zeroizing<String>,
}

impl PiiDetection {
    /// Build a detection, deriving its hash and mask from the raw value.
    pub fn new(
        pii_type: PiiType,
        confidence: f64,
        location: Location,
        original: &str,
        salt: &[u8],
    ) -> Self {
        Self {
            pii_type,
            confidence: confidence.clamp(0.0, 1.0),
            location,
            value_hash: hash_value(original, salt),
            redacted_value: pii_type.mask(original),
            original_value: Zeroizing::new(original.to_string()),
        }
    }

    pub fn pii_type(&self) -> PiiType {
        self.pii_type
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn value_hash(&self) -> &str {
        &self.value_hash
    }

    pub fn redacted_value(&self) -> &str {
        &self.redacted_value
    }

    /// The raw matched value. Callers must not log or persist it.
    pub fn original_value(&self) -> &str {
        &self.original_value
    }
}

impl fmt::Debug for PiiDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PiiDetection")
            .field("pii_type", &self.pii_type)
            .field("confidence", &self.confidence)
            .field("location", &self.location)
            .field("value_hash", &self.value_hash)
            .field("redacted_value", &self.redacted_value)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PiiDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} confidence={:.2} at {}] {}",
            self.pii_type, self.confidence, self.location, self.redacted_value
        )
    }
}

/// Render a detection for logs. Only the masked value is included.
pub fn safe_log(detection: &PiiDetection, message: Option<&str>) -> String {
    match message {
        Some(msg) if !msg.is_empty() => format!("{}: {}", msg, detection),
        _ => detection.to_string(),
    }
}

/// Salted SHA-256 of a raw value, truncated to 16 hex characters
fn hash_value(value: &str, salt: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(value.as_bytes());
    hasher
        .finalize()
        .iter()
        .take(8)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// A business-sensitivity keyword found in the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordHit {
    /// Canonical keyword
    pub keyword: String,
    /// Tier the keyword implies
    pub level: ClassificationLevel,
}

/// A compliance flag raised by the validation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplianceCorrection {
    pub framework: ComplianceFramework,
    /// PII type whose presence required the flag
    pub trigger: PiiType,
}

/// Output of one classification call.
///
/// Built only by the classifier; read-only for everyone else.
///
/// ```compile_fail
/// use safescan::{DataClassifier, DataInput};
///
/// let classifier = DataClassifier::with_defaults().unwrap();
/// let mut result = classifier
///     .classify(&DataInput::from("Contact john@example.com"), None, None)
///     .unwrap();
/// result.requires_gdpr_protection = false;
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    pub(crate) data_id: String,
    pub(crate) classification: ClassificationLevel,
    pub(crate) confidence: f64,
    pub(crate) pii_detected: Vec<PiiDetection>,
    pub(crate) pii_count: usize,
    pub(crate) highest_pii_confidence: f64,
    pub(crate) requires_gdpr_protection: bool,
    pub(crate) requires_hipaa_protection: bool,
    pub(crate) requires_pci_protection: bool,
    pub(crate) sensitivity_keywords: Vec<KeywordHit>,
    pub(crate) compliance_corrections: Vec<ComplianceCorrection>,
    pub(crate) pattern_timeouts: Vec<PiiType>,
    pub(crate) classified_at: DateTime<Utc>,
    pub(crate) processing_time_ms: f64,
}

impl ClassificationResult {
    pub fn data_id(&self) -> &str {
        &self.data_id
    }

    pub fn classification(&self) -> ClassificationLevel {
        self.classification
    }

    /// Mean detection confidence, 1.0 when nothing was detected
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn pii_detected(&self) -> &[PiiDetection] {
        &self.pii_detected
    }

    pub fn pii_count(&self) -> usize {
        self.pii_count
    }

    /// 0.0 when nothing was detected
    pub fn highest_pii_confidence(&self) -> f64 {
        self.highest_pii_confidence
    }

    pub fn requires_gdpr_protection(&self) -> bool {
        self.requires_gdpr_protection
    }

    pub fn requires_hipaa_protection(&self) -> bool {
        self.requires_hipaa_protection
    }

    pub fn requires_pci_protection(&self) -> bool {
        self.requires_pci_protection
    }

    pub fn sensitivity_keywords(&self) -> &[KeywordHit] {
        &self.sensitivity_keywords
    }

    /// Flags raised by the validation pass after the fast path missed them
    pub fn compliance_corrections(&self) -> &[ComplianceCorrection] {
        &self.compliance_corrections
    }

    /// Types whose pattern ran out of time budget
    pub fn pattern_timeouts(&self) -> &[PiiType] {
        &self.pattern_timeouts
    }

    pub fn classified_at(&self) -> DateTime<Utc> {
        self.classified_at
    }

    pub fn processing_time_ms(&self) -> f64 {
        self.processing_time_ms
    }

    /// Whether a given framework's protection flag is set
    pub fn requires(&self, framework: ComplianceFramework) -> bool {
        match framework {
            ComplianceFramework::Gdpr => self.requires_gdpr_protection,
            ComplianceFramework::Hipaa => self.requires_hipaa_protection,
            ComplianceFramework::PciDss => self.requires_pci_protection,
        }
    }

    /// Whether any PII was detected
    pub fn has_pii(&self) -> bool {
        self.pii_count > 0
    }
}

/// Input accepted for classification
#[derive(Debug, Clone, PartialEq)]
pub enum DataInput {
    /// Free text
    Text(String),
    /// Nested structured data
    Structured(serde_json::Value),
}

impl From<&str> for DataInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for DataInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<serde_json::Value> for DataInput {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Structured(other),
        }
    }
}
