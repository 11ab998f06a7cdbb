//! # rowmill - recipe-driven CSV transformation
//!
//! rowmill reads a delimited-text table, applies a configurable sequence of
//! transformations, writes the result back as CSV, and logs every step to
//! console and a log file.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│   Recipe    │────▶│  CSV Output │
//! │ (auto-enc)  │     │  (to rows)  │     │  executor   │     │ + log file  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rowmill::{process_csv, ProcessOptions};
//! use std::path::Path;
//!
//! fn main() {
//!     let report = process_csv(Path::new("data/sample_input.csv"), ProcessOptions::default())
//!         .expect("processing failed");
//!     println!("Wrote {} rows", report.output_rows);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`logging`] - Console and file logging
//! - [`parser`] - CSV reading with auto-detection
//! - [`transform`] - Recipes, operations, executor, and pipeline
//! - [`writer`] - CSV output
//! - [`validation`] - Recipe schema validation
//! - [`registry`] - Stored recipe registry

// Core modules
pub mod error;
pub mod logging;

// Reading
pub mod parser;

// Transformation
pub mod transform;

// Writing
pub mod writer;

// Validation
pub mod validation;

// Recipe storage
pub mod registry;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError,
    PipelineError,
    RecipeError,
    RegistryError,
    WriteError,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    detect_delimiter,
    detect_encoding,
    decode_content,
    parse_bytes_auto,
    parse_file,
    parse_file_auto,
    parse_str,
    ParsedTable,
};

// =============================================================================
// Re-exports - Recipes and execution
// =============================================================================

pub use transform::{
    default_recipe,
    example_recipe,
    execute,
    operations_description,
    ColumnSpec,
    ExecutionResult,
    Operation,
    Recipe,
    RowFilter,
    SkippedRow,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    load_recipe_file,
    process_csv,
    ProcessOptions,
    ProcessReport,
    DEFAULT_INPUT_PATH,
    DEFAULT_LOG_PATH,
    DEFAULT_OUTPUT_PATH,
};

// =============================================================================
// Re-exports - Writing
// =============================================================================

pub use writer::{csv_string, write_csv};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid, is_valid_recipe, validate, validate_recipe};

// =============================================================================
// Re-exports - Registry
// =============================================================================

pub use registry::{RecipeRegistry, StoredRecipe};

// =============================================================================
// Re-exports - Logging
// =============================================================================

pub use logging::{
    init_file_logging, log_debug, log_error, log_info, log_success, log_warning,
};
