//! Transformation module.
//!
//! This module handles recipe-driven row transformation:
//! - Recipe: the configuration format (columns, formulas, filters)
//! - Operations: cell-level transformations
//! - Executor: apply a recipe to parsed rows
//! - Pipeline: the read → transform → write → log sequence

pub mod executor;
pub mod operations;
pub mod pipeline;
pub mod recipe;

pub use executor::{execute, ExecutionResult, SkippedRow};
pub use operations::{operations_description, Operation};
pub use pipeline::{
    load_recipe_file, process_csv, ProcessOptions, ProcessReport, DEFAULT_INPUT_PATH,
    DEFAULT_LOG_PATH, DEFAULT_OUTPUT_PATH,
};
pub use recipe::{
    default_recipe, example_recipe, ArithOp, ColumnSpec, FilterOp, Formula, Operand, Recipe,
    RowFilter, SourceFormat,
};
