//! Compiled, immutable pattern tables
//!
//! All patterns are compiled once when a [`PatternTable`] is built and never
//! mutated afterwards, so a table can be shared by `Arc` across threads.
//! Both the `regex` and `aho-corasick` engines guarantee matching time
//! linear in the haystack, which keeps adversarial inputs bounded.

use aho_corasick::{AhoCorasick, MatchKind};
use regex::Regex;

use crate::config::CustomPattern;
use crate::error::{Error, Result};

use super::types::PiiType;

/// Built-in pattern definition
struct BuiltinPattern {
    name: &'static str,
    pii_type: PiiType,
    pattern: &'static str,
    specificity: f64,
    requires_context: bool,
}

const fn builtin(
    name: &'static str,
    pii_type: PiiType,
    pattern: &'static str,
    specificity: f64,
    requires_context: bool,
) -> BuiltinPattern {
    BuiltinPattern {
        name,
        pii_type,
        pattern,
        specificity,
        requires_context,
    }
}

const BUILTIN_PATTERNS: &[BuiltinPattern] = &[
    // ---- Contact data ----
    builtin(
        "email_address",
        PiiType::Email,
        r"\b[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}\b",
        0.80,
        false,
    ),
    builtin(
        "phone_us",
        PiiType::Phone,
        r"(?:\+1[-.\s]?)?(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b",
        0.65,
        false,
    ),
    builtin(
        "phone_international",
        PiiType::Phone,
        r"\+\d{1,3}[-.\s]?\d{2,4}[-.\s]?\d{3,4}[-.\s]?\d{3,4}\b",
        0.55,
        false,
    ),
    // ---- Government identifiers ----
    builtin("ssn_formatted", PiiType::Ssn, r"\b\d{3}-\d{2}-\d{4}\b", 0.60, false),
    builtin("ssn_bare", PiiType::Ssn, r"\b\d{9}\b", 0.45, true),
    builtin(
        "passport_number",
        PiiType::Passport,
        r"\b[A-Z]{1,2}\d{6,9}\b",
        0.55,
        true,
    ),
    builtin(
        "driver_license_number",
        PiiType::DriverLicense,
        r"\b[A-Z]\d{4,12}\b",
        0.50,
        true,
    ),
    // ---- Payment data ----
    builtin(
        "credit_card_16",
        PiiType::CreditCard,
        r"\b(?:\d{4}[-\s]?){3}\d{4}\b",
        0.60,
        false,
    ),
    builtin(
        "credit_card_amex",
        PiiType::CreditCard,
        r"\b3[47]\d{2}[-\s]?\d{6}[-\s]?\d{5}\b",
        0.65,
        false,
    ),
    // ---- Network identifiers ----
    builtin(
        "ipv4_address",
        PiiType::IpAddress,
        r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b",
        0.70,
        false,
    ),
    builtin(
        "ipv6_address",
        PiiType::IpAddress,
        r"\b(?:[0-9A-Fa-f]{1,4}:){7}[0-9A-Fa-f]{1,4}\b",
        0.75,
        false,
    ),
    // ---- Personal details ----
    builtin(
        "name_labeled",
        PiiType::Name,
        r"(?i:\b(?:full\s+name|first\s+name|last\s+name|name)\s*[:=]\s*)(?P<value>[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+){0,2})\b",
        0.65,
        false,
    ),
    builtin(
        "name_honorific",
        PiiType::Name,
        r"\b(?:Mr|Mrs|Ms|Miss|Dr|Prof)\.?[ \t]+(?P<value>[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)?)\b",
        0.60,
        false,
    ),
    builtin(
        "name_bare",
        PiiType::Name,
        r"\b[A-Z][a-z]+(?:[ \t]+[A-Z]\.)?[ \t]+[A-Z][a-z]+\b",
        0.50,
        true,
    ),
    builtin(
        "street_address",
        PiiType::Address,
        r"\b\d{1,5}[ \t]+(?:[A-Z][a-z]+[ \t]+){1,3}(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Way|Place|Pl|Terrace|Parkway)\b",
        0.70,
        false,
    ),
    builtin(
        "date_us",
        PiiType::DateOfBirth,
        r"\b(?:0?[1-9]|1[0-2])[/\-](?:0?[1-9]|[12]\d|3[01])[/\-](?:19|20)\d{2}\b",
        0.55,
        true,
    ),
    builtin(
        "date_iso",
        PiiType::DateOfBirth,
        r"\b(?:19|20)\d{2}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12]\d|3[01])\b",
        0.55,
        true,
    ),
    // ---- Credentials ----
    builtin(
        "api_key_prefixed",
        PiiType::ApiKey,
        r"\b(?:sk|pk|rk)[-_](?:live[-_]|test[-_]|proj[-_])?[A-Za-z0-9]{16,}\b",
        0.85,
        false,
    ),
    builtin(
        "aws_access_key",
        PiiType::ApiKey,
        r"\b(?:AKIA|ASIA|ABIA|ACCA)[A-Z0-9]{16}\b",
        0.85,
        false,
    ),
    builtin(
        "github_token",
        PiiType::ApiKey,
        r"\bgh[pousr]_[A-Za-z0-9]{36}\b",
        0.90,
        false,
    ),
    builtin(
        "api_key_assignment",
        PiiType::ApiKey,
        r#"(?i:\b(?:api[_-]?key|apikey|secret[_-]?key|access[_-]?key|client[_-]?secret)\s*[:=]\s*["']?)(?P<value>[A-Za-z0-9_\-]{16,})"#,
        0.80,
        false,
    ),
    builtin(
        "jwt",
        PiiType::Token,
        r"\beyJ[A-Za-z0-9_\-]{8,}\.[A-Za-z0-9_\-]{8,}\.[A-Za-z0-9_\-]{8,}",
        0.90,
        false,
    ),
    builtin(
        "bearer_token",
        PiiType::Token,
        r"(?i:\bbearer[ \t]+)(?P<value>[A-Za-z0-9\-._~+/]{20,}=*)",
        0.80,
        false,
    ),
    // ---- Special category ----
    builtin(
        "biometric_reference",
        PiiType::Biometric,
        r"(?i:\b(?:fingerprint|biometric|facial\s+recognition|retina\s+scan|iris\s+scan|voice\s*print)(?:\s+(?:data|id|hash|template))?\s*[:=]\s*)(?P<value>[A-Za-z0-9+/=_\-]{8,})",
        0.75,
        false,
    ),
];

/// A compiled pattern
#[derive(Debug)]
pub struct CompiledPattern {
    pub name: String,
    pub pii_type: PiiType,
    pub regex: Regex,
    /// Base confidence of a raw match
    pub specificity: f64,
    /// Matches only count with a nearby context keyword
    pub requires_context: bool,
    /// Index of the `value` capture group, when present
    value_group: Option<usize>,
}

impl CompiledPattern {
    fn compile(
        name: &str,
        pii_type: PiiType,
        pattern: &str,
        specificity: f64,
        requires_context: bool,
    ) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            Error::Pattern(format!("Invalid regex pattern for '{}': {}", name, e))
        })?;
        let value_group = regex
            .capture_names()
            .position(|group| group == Some("value"));

        Ok(Self {
            name: name.to_string(),
            pii_type,
            regex,
            specificity,
            requires_context,
            value_group,
        })
    }

    /// Byte spans of every match, narrowed to the `value` group if present
    pub fn spans<'t>(&'t self, text: &'t str) -> Box<dyn Iterator<Item = (usize, usize)> + 't> {
        match self.value_group {
            Some(group) => Box::new(
                self.regex
                    .captures_iter(text)
                    .filter_map(move |caps| caps.get(group))
                    .map(|m| (m.start(), m.end())),
            ),
            None => Box::new(self.regex.find_iter(text).map(|m| (m.start(), m.end()))),
        }
    }
}

/// All patterns for one PII type, plus its context keyword matcher
#[derive(Debug)]
pub struct PatternSet {
    pub pii_type: PiiType,
    pub patterns: Vec<CompiledPattern>,
    pub context: KeywordMatcher<()>,
}

/// One pattern set per PII type
#[derive(Debug)]
pub struct PatternTable {
    sets: Vec<PatternSet>,
}

impl PatternTable {
    /// Compile built-in patterns plus custom ones
    pub fn new(custom: &[CustomPattern]) -> Result<Self> {
        let mut sets = PiiType::ALL
            .iter()
            .map(|&pii_type| {
                let keywords: Vec<(&'static str, ())> = pii_type
                    .context_keywords()
                    .iter()
                    .map(|k| (*k, ()))
                    .collect();
                Ok(PatternSet {
                    pii_type,
                    patterns: Vec::new(),
                    context: KeywordMatcher::new(&keywords)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for def in BUILTIN_PATTERNS {
            let compiled = CompiledPattern::compile(
                def.name,
                def.pii_type,
                def.pattern,
                def.specificity,
                def.requires_context,
            )?;
            set_for(&mut sets, def.pii_type).patterns.push(compiled);
        }

        for custom in custom {
            let compiled = CompiledPattern::compile(
                &custom.name,
                custom.pii_type,
                &custom.pattern,
                custom.specificity,
                custom.requires_context,
            )?;
            set_for(&mut sets, custom.pii_type).patterns.push(compiled);
        }

        Ok(Self { sets })
    }

    /// Built-in patterns only
    pub fn builtin() -> Result<Self> {
        Self::new(&[])
    }

    pub fn sets(&self) -> &[PatternSet] {
        &self.sets
    }

    pub fn set(&self, pii_type: PiiType) -> Option<&PatternSet> {
        self.sets.iter().find(|s| s.pii_type == pii_type)
    }

    /// Total number of compiled patterns
    pub fn pattern_count(&self) -> usize {
        self.sets.iter().map(|s| s.patterns.len()).sum()
    }
}

fn set_for(sets: &mut [PatternSet], pii_type: PiiType) -> &mut PatternSet {
    let idx = PiiType::ALL
        .iter()
        .position(|t| *t == pii_type)
        .unwrap_or_default();
    &mut sets[idx]
}

/// Case-insensitive whole-word keyword matcher.
///
/// Keywords match leftmost-longest, so `strictly confidential` wins over
/// `confidential`. A hit only counts when it is not embedded in a larger
/// alphanumeric word (`_` and `-` count as separators).
#[derive(Debug)]
pub struct KeywordMatcher<T: Copy> {
    automaton: AhoCorasick,
    keywords: Vec<&'static str>,
    values: Vec<T>,
}

impl<T: Copy> KeywordMatcher<T> {
    pub fn new(entries: &[(&'static str, T)]) -> Result<Self> {
        let keywords: Vec<&'static str> = entries.iter().map(|(k, _)| *k).collect();
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&keywords)
            .map_err(|e| Error::Pattern(format!("Failed to build keyword matcher: {}", e)))?;

        Ok(Self {
            automaton,
            keywords,
            values: entries.iter().map(|(_, v)| *v).collect(),
        })
    }

    /// All whole-word keyword hits in order of appearance
    pub fn find_all(&self, haystack: &str) -> Vec<(&'static str, T)> {
        let bytes = haystack.as_bytes();
        self.automaton
            .find_iter(haystack)
            .filter(|m| is_word_bounded(bytes, m.start(), m.end()))
            .map(|m| {
                let idx = m.pattern().as_usize();
                (self.keywords[idx], self.values[idx])
            })
            .collect()
    }

    /// Whether any whole-word keyword occurs
    pub fn is_match(&self, haystack: &str) -> bool {
        let bytes = haystack.as_bytes();
        self.automaton
            .find_iter(haystack)
            .any(|m| is_word_bounded(bytes, m.start(), m.end()))
    }
}

fn is_word_bounded(bytes: &[u8], start: usize, end: usize) -> bool {
    let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
    let after_ok = end >= bytes.len() || !bytes[end].is_ascii_alphanumeric();
    before_ok && after_ok
}
