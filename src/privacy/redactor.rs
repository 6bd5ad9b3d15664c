//! Redaction of detected PII
//!
//! Produces a copy of the input with each sufficiently confident detection
//! replaced by its type-specific mask. The original input is never modified.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::RedactionConfig;

use super::types::{
    safe_log, ClassificationResult, DataInput, FieldPath, Location, PathSegment, PiiDetection,
};

/// Replaces detected spans with masks
#[derive(Debug, Clone)]
pub struct Redactor {
    min_confidence: f64,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(&RedactionConfig::default())
    }
}

impl Redactor {
    pub fn new(config: &RedactionConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
        }
    }

    /// Redact every detection at or above the confidence threshold.
    ///
    /// Returns a new input of the same shape. Spans that no longer match the
    /// input are skipped with a warning.
    pub fn redact(&self, input: &DataInput, result: &ClassificationResult) -> DataInput {
        let eligible: Vec<&PiiDetection> = result
            .pii_detected
            .iter()
            .filter(|d| d.confidence() >= self.min_confidence)
            .collect();

        let redacted = match input {
            DataInput::Text(text) => DataInput::Text(self.redact_text(text, &eligible)),
            DataInput::Structured(value) => {
                DataInput::Structured(self.redact_structured(value, &eligible))
            }
        };

        debug!(
            data_id = %result.data_id,
            eligible = eligible.len(),
            "Redaction complete"
        );
        redacted
    }

    fn redact_text(&self, text: &str, detections: &[&PiiDetection]) -> String {
        let spans = detections
            .iter()
            .filter_map(|d| match d.location() {
                Location::Text { start, end } => Some((*start, *end, *d)),
                Location::Field { .. } => {
                    warn!("{}", safe_log(d, Some("Field detection on text input; skipped")));
                    None
                }
            })
            .collect();
        replace_spans(text, spans)
    }

    fn redact_structured(&self, value: &Value, detections: &[&PiiDetection]) -> Value {
        // Keyed by the path itself: `{"a.b": ..}` and `{"a": {"b": ..}}` display alike.
        let mut by_path: BTreeMap<&FieldPath, Vec<(usize, usize, &PiiDetection)>> =
            BTreeMap::new();
        for detection in detections {
            match detection.location() {
                Location::Field { path, start, end } => {
                    by_path
                        .entry(path)
                        .or_default()
                        .push((*start, *end, *detection));
                }
                Location::Text { .. } => {
                    warn!(
                        "{}",
                        safe_log(detection, Some("Text detection on structured input; skipped"))
                    );
                }
            }
        }

        let mut redacted = value.clone();
        for (path, spans) in by_path {
            let Some(leaf) = leaf_mut(&mut redacted, path) else {
                warn!(path = %path, "Redaction path not found; skipped");
                continue;
            };
            let current = match leaf {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => {
                    warn!(path = %path, "Redaction target is not a string or number; skipped");
                    continue;
                }
            };
            *leaf = Value::String(replace_spans(&current, spans));
        }
        redacted
    }
}

/// Replace spans right to left so earlier offsets stay valid, then mask any
/// remaining copies of the same raw values.
fn replace_spans(text: &str, mut spans: Vec<(usize, usize, &PiiDetection)>) -> String {
    spans.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

    let mut out = text.to_string();
    let mut limit = text.len();
    for &(start, end, detection) in &spans {
        let in_range = start <= end
            && end <= limit
            && text.is_char_boundary(start)
            && text.is_char_boundary(end);
        if !in_range || &text[start..end] != detection.original_value() {
            warn!("{}", safe_log(detection, Some("Span does not match input; not redacted")));
            continue;
        }
        out.replace_range(start..end, detection.redacted_value());
        limit = start;
    }

    // Longest first so a value containing another is masked whole
    spans.sort_by(|a, b| b.2.original_value().len().cmp(&a.2.original_value().len()));
    for (_, _, detection) in spans {
        let original = detection.original_value();
        if !original.is_empty() && out.contains(original) {
            out = out.replace(original, detection.redacted_value());
        }
    }
    out
}

fn leaf_mut<'v>(root: &'v mut Value, path: &FieldPath) -> Option<&'v mut Value> {
    path.segments()
        .iter()
        .try_fold(root, |value, segment| match segment {
            PathSegment::Key(key) => value.as_object_mut()?.get_mut(key),
            PathSegment::Index(idx) => value.as_array_mut()?.get_mut(*idx),
        })
}
