//! Error types for the rowmill processing pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - CSV reading and decoding errors
//! - [`RecipeError`] - Recipe loading and validation errors
//! - [`RegistryError`] - Recipe registry errors
//! - [`WriteError`] - Output writing errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// CSV Reading Errors
// =============================================================================

/// Errors while reading and decoding the input CSV.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode content.
    #[error("Failed to decode content as {encoding}: {message}")]
    EncodingError { encoding: String, message: String },

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    ParseError(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Recipe Errors
// =============================================================================

/// Errors while loading or applying a recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// The recipe document is malformed.
    #[error("Invalid recipe: {0}")]
    InvalidRecipe(String),

    /// The recipe violates the embedded JSON Schema.
    #[error("Recipe schema violation: {}", errors.join("; "))]
    SchemaViolation { errors: Vec<String> },

    /// A referenced source column is absent from the CSV header.
    #[error("Missing source column(s): {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// JSON serialization/deserialization error.
    #[error("Recipe JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error while loading a recipe file.
    #[error("Failed to read recipe file: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors from the recipe registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Recipe not found.
    #[error("Recipe not found: {0}")]
    NotFound(String),

    /// Failed to save recipe.
    #[error("Failed to save recipe: {0}")]
    SaveError(String),

    /// Invalid recipe data.
    #[error("Invalid stored recipe: {0}")]
    InvalidRecipe(String),

    /// IO error.
    #[error("Registry IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Registry JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Output Writing Errors
// =============================================================================

/// Errors while writing the output CSV.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Failed to create or write the output file.
    #[error("Failed to write output: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("CSV write error: {0}")]
    CsvError(#[from] csv::Error),

    /// The output path's parent exists but is not a directory.
    #[error("Output path parent is not a directory: {0}")]
    InvalidParent(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::process_csv`].
/// It wraps all lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV reading error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Recipe error.
    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),

    /// Registry error.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Output writing error.
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// Input file does not exist.
    #[error("Input file not found: {0}")]
    InputNotFound(String),

    /// Every input row was skipped.
    #[error("All {0} rows were skipped during transformation")]
    AllSkipped(usize),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV reading operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for recipe operations.
pub type RecipeResult<T> = Result<T, RecipeError>;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for output writing.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> PipelineError
        let csv_err = CsvError::EmptyFile;
        let pipeline_err: PipelineError = csv_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // RecipeError -> PipelineError
        let recipe_err = RecipeError::MissingColumns {
            columns: vec!["value1".into()],
        };
        let pipeline_err: PipelineError = recipe_err.into();
        assert!(pipeline_err.to_string().contains("value1"));
    }

    #[test]
    fn test_schema_violation_format() {
        let err = RecipeError::SchemaViolation {
            errors: vec!["\"columns\" is a required property".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("schema violation"));
        assert!(msg.contains("columns"));
    }

    #[test]
    fn test_input_not_found_is_identifiable() {
        let err = PipelineError::InputNotFound("data/sample_input.csv".into());
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("data/sample_input.csv"));
    }
}
