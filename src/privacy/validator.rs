//! Input admission control
//!
//! Every classification call passes through [`InputValidator::validate`]
//! before any detection work starts. Validation is a single O(size) pass
//! that stops as soon as a limit is crossed, so oversized or hostile input
//! is rejected in time proportional to the point of rejection.

use serde_json::Value;

use crate::config::LimitsConfig;
use crate::error::{Error, Result};

use super::types::DataInput;

/// Input that passed admission checks.
///
/// Only [`InputValidator::validate`] can construct this, so code that takes
/// a `ValidatedInput` cannot run on unchecked data.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedInput<'a> {
    input: &'a DataInput,
    size: usize,
    depth: usize,
}

impl<'a> ValidatedInput<'a> {
    pub fn input(&self) -> &'a DataInput {
        self.input
    }

    /// Serialized size in bytes (compact JSON length for structured input)
    pub fn size(&self) -> usize {
        self.size
    }

    /// Maximum container nesting depth (0 for text and scalars)
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Enforces size, depth, encoding and type constraints
#[derive(Debug, Clone)]
pub struct InputValidator {
    max_input_bytes: usize,
    max_depth: usize,
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(&LimitsConfig::default())
    }
}

impl InputValidator {
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            max_input_bytes: limits.max_input_bytes,
            max_depth: limits.max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Validate an input, returning the first violation found
    pub fn validate<'a>(&self, input: &'a DataInput) -> Result<ValidatedInput<'a>> {
        match input {
            DataInput::Text(text) => {
                self.check_text(text)?;
                Ok(ValidatedInput {
                    input,
                    size: text.len(),
                    depth: 0,
                })
            }
            DataInput::Structured(Value::Null) => Err(Error::UnsupportedType(
                "null cannot be classified".to_string(),
            )),
            DataInput::Structured(value) => {
                let (size, depth) = self.check_structured(value)?;
                Ok(ValidatedInput { input, size, depth })
            }
        }
    }

    fn check_text(&self, text: &str) -> Result<()> {
        if text.len() > self.max_input_bytes {
            return Err(Error::InputTooLarge {
                size: text.len(),
                max: self.max_input_bytes,
            });
        }
        if let Some(offset) = memchr::memchr(0, text.as_bytes()) {
            return Err(Error::InvalidEncoding(format!(
                "NUL byte at offset {}",
                offset
            )));
        }
        Ok(())
    }

    /// Iterative walk accumulating the compact JSON size and nesting depth.
    ///
    /// Strings and keys are counted at their escaped width, so the size
    /// equals `serde_json::to_string(root)?.len()`.
    fn check_structured(&self, root: &Value) -> Result<(usize, usize)> {
        let mut size = 0usize;
        let mut max_seen = 0usize;
        let mut stack: Vec<(&Value, usize)> = vec![(root, 0)];

        while let Some((value, parent_depth)) = stack.pop() {
            match value {
                Value::Null => size += 4,
                Value::Bool(b) => size += if *b { 4 } else { 5 },
                Value::Number(n) => size += n.to_string().len(),
                Value::String(s) => {
                    if memchr::memchr(0, s.as_bytes()).is_some() {
                        return Err(Error::InvalidEncoding(
                            "NUL byte in string value".to_string(),
                        ));
                    }
                    size += escaped_len(s) + 2;
                }
                Value::Array(items) => {
                    let depth = self.enter(parent_depth)?;
                    max_seen = max_seen.max(depth);
                    size += 2 + items.len().saturating_sub(1);
                    stack.extend(items.iter().rev().map(|v| (v, depth)));
                }
                Value::Object(map) => {
                    let depth = self.enter(parent_depth)?;
                    max_seen = max_seen.max(depth);
                    size += 2 + map.len().saturating_sub(1);
                    for (key, child) in map {
                        if memchr::memchr(0, key.as_bytes()).is_some() {
                            return Err(Error::InvalidEncoding(
                                "NUL byte in object key".to_string(),
                            ));
                        }
                        size += escaped_len(key) + 3;
                        stack.push((child, depth));
                    }
                }
            }

            if size > self.max_input_bytes {
                return Err(Error::InputTooLarge {
                    size,
                    max: self.max_input_bytes,
                });
            }
        }

        Ok((size, max_seen))
    }

    fn enter(&self, parent_depth: usize) -> Result<usize> {
        let depth = parent_depth + 1;
        if depth > self.max_depth {
            return Err(Error::InputTooDeep {
                depth,
                max: self.max_depth,
            });
        }
        Ok(depth)
    }
}

/// Byte length of `s` once escaped as a JSON string body
fn escaped_len(s: &str) -> usize {
    s.bytes()
        .map(|b| match b {
            b'"' | b'\\' | b'\n' | b'\r' | b'\t' | 0x08 | 0x0c => 2,
            0x00..=0x1f => 6,
            _ => 1,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{Duration, Instant};

    fn nested(depth: usize) -> Value {
        let mut value = json!("leaf");
        for _ in 0..depth {
            value = json!({ "child": value });
        }
        value
    }

    #[test]
    fn test_accepts_plain_text() {
        let validator = InputValidator::default();
        let input = DataInput::from("hello world");
        let validated = validator.validate(&input).unwrap();
        assert_eq!(validated.size(), 11);
        assert_eq!(validated.depth(), 0);
    }

    #[test]
    fn test_empty_text_is_valid() {
        let validator = InputValidator::default();
        assert!(validator.validate(&DataInput::from("")).is_ok());
    }

    #[test]
    fn test_rejects_oversized_text_quickly() {
        let validator = InputValidator::default();
        let input = DataInput::Text("a".repeat(1_000_001));
        let started = Instant::now();
        let err = validator.validate(&input).unwrap_err();
        assert!(started.elapsed() < Duration::from_millis(50));
        assert!(matches!(
            err,
            Error::InputTooLarge {
                size: 1_000_001,
                max: 1_000_000
            }
        ));
    }

    #[test]
    fn test_rejects_oversized_structure() {
        let validator = InputValidator::new(&LimitsConfig {
            max_input_bytes: 64,
            max_depth: 100,
        });
        let items: Vec<Value> = (0..100).map(|i| json!(format!("item-{}", i))).collect();
        let input = DataInput::Structured(json!({ "items": items }));
        let err = validator.validate(&input).unwrap_err();
        assert!(matches!(err, Error::InputTooLarge { max: 64, .. }));
    }

    #[test]
    fn test_depth_limit() {
        let validator = InputValidator::default();
        let ok = DataInput::Structured(nested(100));
        assert_eq!(validator.validate(&ok).unwrap().depth(), 100);

        let too_deep = DataInput::Structured(nested(101));
        let err = validator.validate(&too_deep).unwrap_err();
        assert!(matches!(err, Error::InputTooDeep { depth: 101, max: 100 }));
    }

    #[test]
    fn test_rejects_nul_bytes() {
        let validator = InputValidator::default();
        let err = validator
            .validate(&DataInput::from("abc\0def"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEncoding(msg) if msg.contains("offset 3")));

        let input = DataInput::Structured(json!({ "a\0b": 1 }));
        assert!(matches!(
            validator.validate(&input),
            Err(Error::InvalidEncoding(_))
        ));

        let input = DataInput::Structured(json!({ "a": ["x\0"] }));
        assert!(matches!(
            validator.validate(&input),
            Err(Error::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_rejects_null() {
        let validator = InputValidator::default();
        let err = validator
            .validate(&DataInput::Structured(Value::Null))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }

    #[test]
    fn test_nested_nulls_and_scalars_accepted() {
        let validator = InputValidator::default();
        let input = DataInput::Structured(json!({ "a": null, "b": true, "c": 42 }));
        let validated = validator.validate(&input).unwrap();
        assert_eq!(validated.depth(), 1);
        let compact = serde_json::to_string(input_value(&input)).unwrap();
        assert_eq!(validated.size(), compact.len());
    }

    #[test]
    fn test_size_counts_escaped_width() {
        let validator = InputValidator::default();
        let input = DataInput::Structured(json!({ "blob": "\u{1}".repeat(200_000) }));
        let err = validator.validate(&input).unwrap_err();
        assert!(matches!(err, Error::InputTooLarge { max: 1_000_000, .. }));

        let input = DataInput::Structured(json!({
            "quote\"key": "tab\there \\ \u{1f} \"q\" \n é",
            "list": ["\r", "\u{8}\u{c}"]
        }));
        let validated = validator.validate(&input).unwrap();
        let compact = serde_json::to_string(input_value(&input)).unwrap();
        assert_eq!(validated.size(), compact.len());
    }

    fn input_value(input: &DataInput) -> &Value {
        match input {
            DataInput::Structured(v) => v,
            DataInput::Text(_) => unreachable!(),
        }
    }
}
