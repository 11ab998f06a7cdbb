//! Recipe definition.
//!
//! A recipe describes how input columns become output columns: an ordered
//! list of column specs (the output schema, in order), plus row filters.
//! Recipes are plain JSON documents, deserialized with serde, so the
//! transformation rules are configuration rather than code.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::operations::Operation;

/// A complete recipe: ordered output columns plus row filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Version of the recipe format
    #[serde(default = "default_version")]
    pub version: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Source format metadata
    #[serde(default)]
    pub source_format: Option<SourceFormat>,

    /// Output columns, in output order
    pub columns: Vec<ColumnSpec>,

    /// Row filters, evaluated against input rows before column derivation
    #[serde(default)]
    pub filters: Vec<RowFilter>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Metadata about the source CSV format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFormat {
    /// Detected or specified delimiter
    pub delimiter: Option<char>,

    /// Detected or specified encoding
    pub encoding: Option<String>,

    /// Number of header rows
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,
}

fn default_header_rows() -> usize {
    1
}

/// Specification of a single output column.
///
/// Exactly one of `source`, `sources`, `constant`, or `formula` provides the
/// initial value; `operations` then run in order, and `default` fills in
/// when the result is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Output column name
    pub name: String,

    /// Source column name (mutually exclusive with sources/constant/formula)
    #[serde(default)]
    pub source: Option<String>,

    /// Multiple source columns to concatenate
    #[serde(default)]
    pub sources: Option<Vec<String>>,

    /// Separator for concatenating multiple sources (default: " ")
    #[serde(default = "default_concat_separator")]
    pub concat_separator: String,

    /// Constant value
    #[serde(default)]
    pub constant: Option<Value>,

    /// Arithmetic over two operands
    #[serde(default)]
    pub formula: Option<Formula>,

    /// Ordered list of operations to apply
    #[serde(default)]
    pub operations: Vec<Operation>,

    /// Default value if the result is empty
    #[serde(default)]
    pub default: Option<Value>,

    /// Whether this column must resolve to a non-empty value
    #[serde(default)]
    pub required: bool,
}

fn default_concat_separator() -> String {
    " ".to_string()
}

/// Binary arithmetic for derived numeric columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formula {
    /// Left operand: a source column name
    pub left: String,
    /// Arithmetic operator
    pub op: ArithOp,
    /// Right operand: a source column or a literal number
    pub right: Operand,
}

/// Arithmetic operators for [`Formula`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArithOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// Right-hand operand of a formula: `12.5` or `{"column": "value1"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Number(f64),
    Column { column: String },
}

impl Formula {
    /// Evaluate against a row. Returns None when an operand is missing,
    /// non-numeric, or the division has a zero denominator.
    pub fn evaluate(&self, row: &Map<String, Value>) -> Option<f64> {
        let left = row.get(&self.left).and_then(Operation::as_number)?;
        let right = match &self.right {
            Operand::Number(n) => *n,
            Operand::Column { column } => row.get(column).and_then(Operation::as_number)?,
        };

        match self.op {
            ArithOp::Add => Some(left + right),
            ArithOp::Subtract => Some(left - right),
            ArithOp::Multiply => Some(left * right),
            ArithOp::Divide => {
                if right == 0.0 {
                    None
                } else {
                    Some(left / right)
                }
            }
        }
    }

    /// Source columns referenced by this formula.
    pub fn source_columns(&self) -> Vec<String> {
        let mut cols = vec![self.left.clone()];
        if let Operand::Column { column } = &self.right {
            cols.push(column.clone());
        }
        cols
    }
}

/// A row-level predicate evaluated against the input row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowFilter {
    /// Input column to test
    pub column: String,
    /// Comparison operator
    pub op: FilterOp,
    /// Comparison value (unused for `not_empty`)
    #[serde(default)]
    pub value: Option<Value>,
}

/// Comparison operators for [`RowFilter`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
    NotEmpty,
}

impl RowFilter {
    /// True when the row satisfies this filter. Rows whose cell cannot be
    /// compared (missing, non-numeric for an ordering test) do not match.
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        let cell = row.get(&self.column);

        match self.op {
            FilterOp::NotEmpty => cell
                .map(|v| match v {
                    Value::Null => false,
                    Value::String(s) => !s.trim().is_empty(),
                    _ => true,
                })
                .unwrap_or(false),
            FilterOp::Eq | FilterOp::Ne => {
                let expected = match &self.value {
                    Some(v) => v,
                    None => return false,
                };
                let equal = match (cell.and_then(Operation::as_number), Operation::as_number(expected)) {
                    (Some(a), Some(b)) => a == b,
                    _ => cell
                        .and_then(|v| v.as_str())
                        .map(|s| Some(s) == expected.as_str())
                        .unwrap_or(false),
                };
                if self.op == FilterOp::Eq {
                    equal
                } else {
                    !equal
                }
            }
            FilterOp::Gt | FilterOp::Ge | FilterOp::Lt | FilterOp::Le => {
                let actual = match cell.and_then(Operation::as_number) {
                    Some(n) => n,
                    None => return false,
                };
                let expected = match self.value.as_ref().and_then(Operation::as_number) {
                    Some(n) => n,
                    None => return false,
                };
                match self.op {
                    FilterOp::Gt => actual > expected,
                    FilterOp::Ge => actual >= expected,
                    FilterOp::Lt => actual < expected,
                    FilterOp::Le => actual <= expected,
                    _ => unreachable!(),
                }
            }
        }
    }
}

impl Recipe {
    /// Create an empty recipe
    pub fn new() -> Self {
        Self {
            version: default_version(),
            description: String::new(),
            source_format: None,
            columns: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Parse a recipe from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a recipe from JSON value
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// All source columns referenced by columns, formulas, and filters
    pub fn source_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .columns
            .iter()
            .flat_map(|c| c.get_sources())
            .collect();

        for filter in &self.filters {
            columns.push(filter.column.clone());
        }

        // Deduplicate
        columns.sort();
        columns.dedup();
        columns
    }

    /// Output column names, in output order
    pub fn output_columns(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Validate that all referenced source columns exist in the CSV headers
    pub fn validate_headers(&self, headers: &[String]) -> Result<(), Vec<String>> {
        let missing: Vec<String> = self
            .source_columns()
            .into_iter()
            .filter(|col| !headers.iter().any(|h| h == col))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}

impl Default for Recipe {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnSpec {
    /// Create a column that passes through a source column
    pub fn from_source(name: &str, source: &str) -> Self {
        Self {
            name: name.to_string(),
            source: Some(source.to_string()),
            sources: None,
            concat_separator: default_concat_separator(),
            constant: None,
            formula: None,
            operations: Vec::new(),
            default: None,
            required: false,
        }
    }

    /// Create a column concatenated from multiple source columns
    pub fn from_sources(name: &str, sources: Vec<String>, separator: &str) -> Self {
        Self {
            name: name.to_string(),
            source: None,
            sources: Some(sources),
            concat_separator: separator.to_string(),
            constant: None,
            formula: None,
            operations: Vec::new(),
            default: None,
            required: false,
        }
    }

    /// Create a column with a constant value
    pub fn from_constant(name: &str, value: Value) -> Self {
        Self {
            name: name.to_string(),
            source: None,
            sources: None,
            concat_separator: default_concat_separator(),
            constant: Some(value),
            formula: None,
            operations: Vec::new(),
            default: None,
            required: false,
        }
    }

    /// Create a column derived by a formula
    pub fn from_formula(name: &str, formula: Formula) -> Self {
        Self {
            name: name.to_string(),
            source: None,
            sources: None,
            concat_separator: default_concat_separator(),
            constant: None,
            formula: Some(formula),
            operations: Vec::new(),
            default: None,
            required: false,
        }
    }

    /// Add an operation to the chain
    pub fn with_operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// All source columns referenced by this column spec
    pub fn get_sources(&self) -> Vec<String> {
        let mut result = Vec::new();
        if let Some(ref s) = self.source {
            result.push(s.clone());
        }
        if let Some(ref ss) = self.sources {
            result.extend(ss.clone());
        }
        if let Some(ref f) = self.formula {
            result.extend(f.source_columns());
        }
        result
    }
}

/// The built-in default recipe, applied when no recipe file is given and no
/// stored recipe matches the input header.
///
/// Passes through `id`, `category`, `value1`, `value2`; derives
/// `value1_plus_10` and `value2_div_value1`; keeps rows with `value1 > 20`;
/// buckets `value1` into Medium/High at 35.
pub fn default_recipe() -> Recipe {
    Recipe {
        version: default_version(),
        description: "Default numeric enrichment recipe".to_string(),
        source_format: None,
        columns: vec![
            ColumnSpec::from_source("id", "id")
                .with_operation(Operation::ToInteger)
                .required(),
            ColumnSpec::from_source("category", "category").with_operation(Operation::Trim),
            ColumnSpec::from_source("value1", "value1")
                .with_operation(Operation::ToInteger)
                .required(),
            ColumnSpec::from_source("value2", "value2").with_operation(Operation::ToFloat),
            ColumnSpec::from_formula(
                "value1_plus_10",
                Formula {
                    left: "value1".to_string(),
                    op: ArithOp::Add,
                    right: Operand::Number(10.0),
                },
            )
            .with_operation(Operation::ToInteger),
            ColumnSpec::from_formula(
                "value2_div_value1",
                Formula {
                    left: "value2".to_string(),
                    op: ArithOp::Divide,
                    right: Operand::Column { column: "value1".to_string() },
                },
            )
            .with_operation(Operation::Round { digits: 6 }),
            ColumnSpec::from_source("value1_type", "value1").with_operation(Operation::Bin {
                thresholds: vec![35.0],
                labels: vec!["Medium".to_string(), "High".to_string()],
            }),
        ],
        filters: vec![RowFilter {
            column: "value1".to_string(),
            op: FilterOp::Gt,
            value: Some(Value::Number(20.into())),
        }],
    }
}

/// Generate an example recipe for documentation and the `example-recipe` command
pub fn example_recipe() -> Recipe {
    let mut category_mapping = HashMap::new();
    category_mapping.insert("A".to_string(), "Alpha".to_string());
    category_mapping.insert("B".to_string(), "Beta".to_string());
    category_mapping.insert("C".to_string(), "Gamma".to_string());

    Recipe {
        version: default_version(),
        description: "Example recipe: pass-through, mapping, arithmetic, and bucketing".to_string(),
        source_format: Some(SourceFormat {
            delimiter: Some(','),
            encoding: Some("utf-8".to_string()),
            header_rows: 1,
        }),
        columns: vec![
            ColumnSpec::from_source("id", "id")
                .with_operation(Operation::ToInteger)
                .required(),
            ColumnSpec::from_source("category", "category")
                .with_operation(Operation::Trim)
                .with_operation(Operation::Uppercase)
                .with_operation(Operation::Map {
                    mapping: category_mapping,
                    case_insensitive: true,
                    default_unmapped: Some("Other".to_string()),
                }),
            ColumnSpec::from_source("value1", "value1")
                .with_operation(Operation::ToInteger)
                .required(),
            ColumnSpec::from_formula(
                "value1_plus_10",
                Formula {
                    left: "value1".to_string(),
                    op: ArithOp::Add,
                    right: Operand::Number(10.0),
                },
            )
            .with_operation(Operation::ToInteger),
            ColumnSpec::from_source("value1_type", "value1")
                .with_operation(Operation::Bin {
                    thresholds: vec![35.0],
                    labels: vec!["Medium".to_string(), "High".to_string()],
                })
                .with_default(Value::String("Medium".to_string())),
        ],
        filters: vec![RowFilter {
            column: "value1".to_string(),
            op: FilterOp::Gt,
            value: Some(Value::Number(20.into())),
        }],
    }
}
