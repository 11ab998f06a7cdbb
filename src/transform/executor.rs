//! Recipe executor.
//!
//! Applies a recipe to parsed rows: row filters first, then every column
//! spec in recipe order. Output rows always carry every output column so the
//! writer can render a rectangular CSV.

use serde_json::{Map, Value};

use super::recipe::{ColumnSpec, Recipe};

/// Result of executing a recipe
#[derive(Debug)]
pub struct ExecutionResult {
    /// Successfully transformed rows
    pub records: Vec<Value>,
    /// Rows skipped because a required column did not resolve
    pub skipped: Vec<SkippedRow>,
    /// Rows dropped by row filters
    pub dropped: usize,
}

/// A row that was skipped
#[derive(Debug, Clone)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
    pub missing_columns: Vec<String>,
}

impl ExecutionResult {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
            dropped: 0,
        }
    }

    /// Check if execution completed without skipping any rows
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        format!(
            "Transformed: {} rows, {} dropped by filters, {} skipped",
            self.records.len(),
            self.dropped,
            self.skipped.len()
        )
    }
}

impl Default for ExecutionResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute a recipe on parsed rows.
///
/// # Arguments
/// * `rows` - JSON objects from CSV parsing (one per input row)
/// * `recipe` - The recipe to apply
pub fn execute(rows: &[Value], recipe: &Recipe) -> ExecutionResult {
    let mut result = ExecutionResult::new();

    for (row_idx, row) in rows.iter().enumerate() {
        let row_obj = match row.as_object() {
            Some(obj) => obj,
            None => {
                result.skipped.push(SkippedRow {
                    row: row_idx,
                    reason: "Row is not a JSON object".to_string(),
                    missing_columns: Vec::new(),
                });
                continue;
            }
        };

        if !recipe.filters.iter().all(|f| f.matches(row_obj)) {
            result.dropped += 1;
            continue;
        }

        match transform_row(row_obj, recipe, row_idx) {
            Ok(record) => result.records.push(record),
            Err(skip) => result.skipped.push(skip),
        }
    }

    result
}

/// Transform a single row into an output record
fn transform_row(
    row: &Map<String, Value>,
    recipe: &Recipe,
    row_idx: usize,
) -> Result<Value, SkippedRow> {
    let mut output = Map::new();
    let mut missing_required = Vec::new();

    for spec in &recipe.columns {
        let value = resolve_column(row, spec);

        match value {
            Some(v) if !is_empty(&v) => {
                output.insert(spec.name.clone(), v);
            }
            _ => {
                if spec.required {
                    missing_required.push(spec.name.clone());
                } else if let Some(default) = &spec.default {
                    output.insert(spec.name.clone(), default.clone());
                } else {
                    // Empty cell in the output
                    output.insert(spec.name.clone(), Value::Null);
                }
            }
        }
    }

    if !missing_required.is_empty() {
        return Err(SkippedRow {
            row: row_idx,
            reason: "Missing required columns".to_string(),
            missing_columns: missing_required,
        });
    }

    Ok(Value::Object(output))
}

/// Resolve a column spec against a row: initial value, operation chain,
/// default fallback.
fn resolve_column(row: &Map<String, Value>, spec: &ColumnSpec) -> Option<Value> {
    let mut value = if let Some(source) = &spec.source {
        row.get(source).cloned()
    } else if let Some(sources) = &spec.sources {
        // Multiple sources - concatenate the non-empty ones
        let parts: Vec<String> = sources
            .iter()
            .filter_map(|s| row.get(s))
            .filter_map(|v| v.as_str())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(Value::String(parts.join(&spec.concat_separator)))
        }
    } else if let Some(formula) = &spec.formula {
        formula.evaluate(row).map(|n| {
            serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        })
    } else {
        spec.constant.clone()
    };

    // If no value and we have a default, use it
    if value.as_ref().map(is_empty).unwrap_or(true) {
        if let Some(default) = &spec.default {
            value = Some(default.clone());
        }
    }

    // Apply operations in sequence
    if let Some(mut v) = value {
        for op in &spec.operations {
            v = op.apply(&v);
        }

        // If the result is empty after operations, try the default again
        if is_empty(&v) {
            if let Some(default) = &spec.default {
                return Some(default.clone());
            }
            return None;
        }

        return Some(v);
    }

    None
}

/// Check if a value is "empty" (null, blank string, empty container)
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}
