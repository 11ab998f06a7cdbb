//! Recipe operations for cell-level transformation.
//!
//! Operations are applied in sequence to the resolved source value of a
//! column. Text operations pass non-string values through unchanged;
//! numeric operations yield null when the input cannot be read as a number,
//! which lets the column's `default` take over.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// All available cell operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Remove leading and trailing whitespace
    Trim,

    /// Convert to uppercase
    Uppercase,

    /// Convert to lowercase
    Lowercase,

    /// Replace using regex pattern
    Replace {
        pattern: String,
        #[serde(default)]
        value: String,
    },

    /// Pad string at start to reach target length
    PadStart {
        length: usize,
        #[serde(default = "default_pad_char")]
        char: String,
    },

    /// Map values using a lookup table
    Map {
        mapping: HashMap<String, String>,
        #[serde(default)]
        case_insensitive: bool,
        /// Value to use when no mapping match found (null = empty cell)
        #[serde(default)]
        default_unmapped: Option<String>,
    },

    /// Convert to integer
    ToInteger,

    /// Convert to floating-point number
    ToFloat,

    /// Round to a number of decimal digits
    Round {
        #[serde(default)]
        digits: u32,
    },

    /// Absolute value
    Abs,

    /// Bucket a numeric value into labels by ascending thresholds.
    ///
    /// `labels` must have exactly one more entry than `thresholds`:
    /// a value lands in the first bucket whose threshold it does not
    /// exceed, or the last bucket when above all thresholds.
    Bin {
        thresholds: Vec<f64>,
        labels: Vec<String>,
    },

    /// Convert to boolean
    ToBoolean {
        #[serde(default = "default_true_values")]
        true_values: Vec<String>,
    },

    /// Remove all non-digit characters
    DigitsOnly,
}

fn default_pad_char() -> String {
    "0".to_string()
}

fn default_true_values() -> Vec<String> {
    vec![
        "true".to_string(),
        "1".to_string(),
        "yes".to_string(),
        "y".to_string(),
    ]
}

impl Operation {
    /// Apply this operation to a value
    pub fn apply(&self, value: &Value) -> Value {
        match self {
            Operation::Trim => self.apply_trim(value),
            Operation::Uppercase => self.apply_uppercase(value),
            Operation::Lowercase => self.apply_lowercase(value),
            Operation::Replace { pattern, value: replacement } => {
                self.apply_replace(value, pattern, replacement)
            }
            Operation::PadStart { length, char } => self.apply_pad_start(value, *length, char),
            Operation::Map { mapping, case_insensitive, default_unmapped } => {
                self.apply_map(value, mapping, *case_insensitive, default_unmapped.as_deref())
            }
            Operation::ToInteger => self.apply_to_integer(value),
            Operation::ToFloat => self.apply_to_float(value),
            Operation::Round { digits } => self.apply_round(value, *digits),
            Operation::Abs => self.apply_abs(value),
            Operation::Bin { thresholds, labels } => self.apply_bin(value, thresholds, labels),
            Operation::ToBoolean { true_values } => self.apply_to_boolean(value, true_values),
            Operation::DigitsOnly => self.apply_digits_only(value),
        }
    }

    fn as_string(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Read a value as f64, accepting numeric strings.
    pub(crate) fn as_number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn number_value(n: f64) -> Value {
        serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }

    fn apply_trim(&self, value: &Value) -> Value {
        Self::as_string(value)
            .map(|s| Value::String(s.trim().to_string()))
            .unwrap_or(value.clone())
    }

    fn apply_uppercase(&self, value: &Value) -> Value {
        Self::as_string(value)
            .map(|s| Value::String(s.to_uppercase()))
            .unwrap_or(value.clone())
    }

    fn apply_lowercase(&self, value: &Value) -> Value {
        Self::as_string(value)
            .map(|s| Value::String(s.to_lowercase()))
            .unwrap_or(value.clone())
    }

    fn apply_replace(&self, value: &Value, pattern: &str, replacement: &str) -> Value {
        Self::as_string(value)
            .and_then(|s| {
                regex::Regex::new(pattern)
                    .ok()
                    .map(|re| Value::String(re.replace_all(&s, replacement).to_string()))
            })
            .unwrap_or(value.clone())
    }

    fn apply_pad_start(&self, value: &Value, length: usize, pad_char: &str) -> Value {
        Self::as_string(value)
            .map(|s| {
                if s.len() >= length {
                    Value::String(s)
                } else {
                    let pad = pad_char.chars().next().unwrap_or('0');
                    let padding: String = std::iter::repeat_n(pad, length - s.len()).collect();
                    Value::String(format!("{}{}", padding, s))
                }
            })
            .unwrap_or(value.clone())
    }

    fn apply_map(
        &self,
        value: &Value,
        mapping: &HashMap<String, String>,
        case_insensitive: bool,
        default_unmapped: Option<&str>,
    ) -> Value {
        Self::as_string(value)
            .map(|s| {
                let key = if case_insensitive { s.to_lowercase() } else { s.clone() };

                let found = if case_insensitive {
                    mapping.iter().find(|(k, _)| k.to_lowercase() == key)
                } else {
                    mapping.get_key_value(&key)
                };

                match found {
                    Some((_, v)) => Value::String(v.clone()),
                    None => match default_unmapped {
                        Some(d) => Value::String(d.to_string()),
                        None => Value::String(String::new()),
                    },
                }
            })
            .unwrap_or(value.clone())
    }

    fn apply_to_integer(&self, value: &Value) -> Value {
        match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => value.clone(),
            _ => Self::as_number(value)
                .map(|f| Value::Number((f.trunc() as i64).into()))
                .unwrap_or(Value::Null),
        }
    }

    fn apply_to_float(&self, value: &Value) -> Value {
        Self::as_number(value)
            .map(Self::number_value)
            .unwrap_or(Value::Null)
    }

    fn apply_round(&self, value: &Value, digits: u32) -> Value {
        Self::as_number(value)
            .map(|f| {
                let factor = 10f64.powi(digits as i32);
                Self::number_value((f * factor).round() / factor)
            })
            .unwrap_or(Value::Null)
    }

    fn apply_abs(&self, value: &Value) -> Value {
        Self::as_number(value)
            .map(|f| Self::number_value(f.abs()))
            .unwrap_or(Value::Null)
    }

    fn apply_bin(&self, value: &Value, thresholds: &[f64], labels: &[String]) -> Value {
        if labels.len() != thresholds.len() + 1 {
            return Value::Null;
        }
        Self::as_number(value)
            .map(|f| {
                let idx = thresholds
                    .iter()
                    .position(|t| f <= *t)
                    .unwrap_or(thresholds.len());
                Value::String(labels[idx].clone())
            })
            .unwrap_or(Value::Null)
    }

    fn apply_to_boolean(&self, value: &Value, true_values: &[String]) -> Value {
        match value {
            Value::Bool(b) => Value::Bool(*b),
            _ => Self::as_string(value)
                .map(|s| {
                    let lower = s.to_lowercase();
                    Value::Bool(true_values.iter().any(|tv| tv.to_lowercase() == lower))
                })
                .unwrap_or(Value::Bool(false)),
        }
    }

    fn apply_digits_only(&self, value: &Value) -> Value {
        Self::as_string(value)
            .map(|s| {
                let cleaned: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
                Value::String(cleaned)
            })
            .unwrap_or(value.clone())
    }
}

/// Get a description of all available operations for the CLI
pub fn operations_description() -> String {
    r#"Available recipe operations:

| Operation | Description | Parameters |
|-----------|-------------|------------|
| trim | Remove leading/trailing whitespace | - |
| uppercase | Convert to uppercase | - |
| lowercase | Convert to lowercase | - |
| replace | Regex pattern replacement | pattern: regex, value: replacement |
| pad_start | Pad string at start | length: target length, char: pad character (default "0") |
| map | Map values using lookup table | mapping: {source: target}, case_insensitive: bool, default_unmapped: fallback |
| to_integer | Convert to integer (truncating) | - |
| to_float | Convert to floating-point number | - |
| round | Round to decimal digits | digits: decimal places (default 0) |
| abs | Absolute value | - |
| bin | Bucket by ascending thresholds | thresholds: [numbers], labels: [strings] (one more than thresholds) |
| to_boolean | Convert to boolean | true_values: list of truthy strings |
| digits_only | Keep only digits | - |

Example operations in JSON:
[
  {"type": "trim"},
  {"type": "to_float"},
  {"type": "round", "digits": 2},
  {"type": "bin", "thresholds": [35], "labels": ["Medium", "High"]},
  {"type": "map", "mapping": {"A": "Alpha", "B": "Beta"}, "case_insensitive": true}
]"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trim() {
        let op = Operation::Trim;
        assert_eq!(op.apply(&json!("  hello  ")), json!("hello"));
    }

    #[test]
    fn test_map() {
        let mut mapping = HashMap::new();
        mapping.insert("A".to_string(), "Alpha".to_string());
        mapping.insert("B".to_string(), "Beta".to_string());

        let op = Operation::Map {
            mapping: mapping.clone(),
            case_insensitive: true,
            default_unmapped: None,
        };
        assert_eq!(op.apply(&json!("a")), json!("Alpha"));

        // No match returns empty string (empty cell)
        assert_eq!(op.apply(&json!("Unknown")), json!(""));

        let op_with_default = Operation::Map {
            mapping,
            case_insensitive: true,
            default_unmapped: Some("Other".to_string()),
        };
        assert_eq!(op_with_default.apply(&json!("Unknown")), json!("Other"));
    }

    #[test]
    fn test_to_integer() {
        let op = Operation::ToInteger;
        assert_eq!(op.apply(&json!("42")), json!(42));
        assert_eq!(op.apply(&json!("42.9")), json!(42));
        assert_eq!(op.apply(&json!("-7")), json!(-7));
        assert_eq!(op.apply(&json!("not a number")), Value::Null);
    }

    #[test]
    fn test_to_float() {
        let op = Operation::ToFloat;
        assert_eq!(op.apply(&json!("3.25")), json!(3.25));
        assert_eq!(op.apply(&json!(" 10 ")), json!(10.0));
        assert_eq!(op.apply(&json!("")), Value::Null);
    }

    #[test]
    fn test_round() {
        let op = Operation::Round { digits: 2 };
        assert_eq!(op.apply(&json!(3.14159)), json!(3.14));

        let op = Operation::Round { digits: 0 };
        assert_eq!(op.apply(&json!(2.5)), json!(3.0));
    }

    #[test]
    fn test_bin_thresholds() {
        let op = Operation::Bin {
            thresholds: vec![35.0],
            labels: vec!["Medium".to_string(), "High".to_string()],
        };
        assert_eq!(op.apply(&json!(25)), json!("Medium"));
        assert_eq!(op.apply(&json!(35)), json!("Medium"));
        assert_eq!(op.apply(&json!(36)), json!("High"));
        assert_eq!(op.apply(&json!("45")), json!("High"));
    }

    #[test]
    fn test_bin_label_mismatch_yields_null() {
        let op = Operation::Bin {
            thresholds: vec![10.0, 20.0],
            labels: vec!["low".to_string()],
        };
        assert_eq!(op.apply(&json!(5)), Value::Null);
    }

    #[test]
    fn test_to_boolean() {
        let op = Operation::ToBoolean { true_values: default_true_values() };
        assert_eq!(op.apply(&json!("yes")), json!(true));
        assert_eq!(op.apply(&json!("no")), json!(false));
        assert_eq!(op.apply(&json!(true)), json!(true));
    }

    #[test]
    fn test_digits_only() {
        let op = Operation::DigitsOnly;
        assert_eq!(op.apply(&json!("a1b2c3")), json!("123"));
    }

    #[test]
    fn test_replace() {
        let op = Operation::Replace {
            pattern: "[-. ]".to_string(),
            value: "".to_string(),
        };
        assert_eq!(op.apply(&json!("12-34. 56")), json!("123456"));
    }

    #[test]
    fn test_operation_deserialization() {
        let op: Operation = serde_json::from_value(json!({
            "type": "bin",
            "thresholds": [35],
            "labels": ["Medium", "High"]
        }))
        .unwrap();
        assert!(matches!(op, Operation::Bin { .. }));
    }
}
