//! High-level pipeline API: read, transform, write, log.
//!
//! This module ties the stages together:
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│   Recipe    │────▶│  CSV Output │
//! │ (auto-enc)  │     │  (to rows)  │     │  executor   │     │ + log file  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rowmill::transform::pipeline::{process_csv, ProcessOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = process_csv(Path::new("data/sample_input.csv"), ProcessOptions::default())?;
//!     println!("Wrote {} rows", report.output_rows);
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult, RecipeError};
use crate::logging::{log_debug, log_info, log_success, log_warning};
use crate::parser::{parse_file, parse_file_auto, ParsedTable};
use crate::registry::RecipeRegistry;
use crate::transform::executor::execute;
use crate::transform::recipe::{default_recipe, Recipe};
use crate::validation::validate_recipe;
use crate::writer::write_csv;

/// Default input path, relative to the working directory.
pub const DEFAULT_INPUT_PATH: &str = "data/sample_input.csv";

/// Default output path, relative to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "data/processed_output.csv";

/// Default log file path, relative to the working directory.
pub const DEFAULT_LOG_PATH: &str = "data/data_processing.log";

/// Options for the processing pipeline
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Use a specific recipe file instead of the registry
    pub recipe_path: Option<PathBuf>,

    /// Where to write the output CSV
    pub output_path: PathBuf,

    /// Input delimiter (auto-detected when unset)
    pub delimiter: Option<char>,

    /// Don't look up stored recipes
    pub no_registry: bool,

    /// Don't record usage statistics for the chosen stored recipe
    pub no_save: bool,

    /// Treat any missing source column as fatal, not just required ones
    pub strict: bool,

    /// Override the registry directory (mainly for tests)
    pub registry_dir: Option<PathBuf>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            recipe_path: None,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            delimiter: None,
            no_registry: false,
            no_save: false,
            strict: false,
            registry_dir: None,
        }
    }
}

/// Report of a completed pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    /// Rows read from the input file
    pub input_rows: usize,
    /// Rows written to the output file
    pub output_rows: usize,
    /// Rows dropped by row filters
    pub dropped_rows: usize,
    /// Rows skipped due to missing required columns
    pub skipped_rows: usize,
    /// Input column headers
    pub input_columns: Vec<String>,
    /// Output column headers
    pub output_columns: Vec<String>,
    /// Description of the recipe that was applied
    pub recipe_description: String,
    /// Registry ID when a stored recipe was used
    pub recipe_id: Option<String>,
    /// Where the output was written
    pub output_path: PathBuf,
    /// Detected input encoding
    pub encoding: String,
    /// Detected input delimiter
    pub delimiter: char,
}

/// Process a CSV file end to end.
///
/// 1. Parses the input with encoding/delimiter auto-detection
/// 2. Resolves the recipe: `--recipe` file, then a compatible stored recipe,
///    then the built-in default
/// 3. Checks the recipe's source columns against the input header
/// 4. Executes the transformation
/// 5. Writes the output CSV
///
/// A missing input file fails before the output path is touched.
pub fn process_csv(input: &Path, options: ProcessOptions) -> PipelineResult<ProcessReport> {
    if !input.exists() {
        return Err(PipelineError::InputNotFound(input.display().to_string()));
    }

    log_info(format!("Reading data from: {}", input.display()));
    let table = match options.delimiter {
        Some(d) => parse_file(input, d)?,
        None => parse_file_auto(input)?,
    };
    log_success(format!("Detected encoding: {}", table.encoding));
    log_success(format!("Detected delimiter: '{}'", format_delimiter(table.delimiter)));
    log_success(format!("Read {} rows", table.row_count()));
    log_debug(format!("Input columns: {}", table.headers.join(", ")));

    let (recipe, recipe_id) = resolve_recipe(&table, &options)?;
    check_headers(&recipe, &table, options.strict)?;

    log_info("Executing transformation...");
    log_debug(format!("Output columns: {}", recipe.output_columns().join(", ")));
    let result = execute(&table.rows, &recipe);
    log_success(result.summary());

    if !result.skipped.is_empty() {
        log_warning(format!(
            "{} rows skipped (missing required columns)",
            result.skipped.len()
        ));
        for skip in result.skipped.iter().take(5) {
            log_warning(format!(
                "Row {}: missing {}",
                skip.row,
                skip.missing_columns.join(", ")
            ));
        }
    }

    if let Some(ref id) = recipe_id {
        if !options.no_save {
            let mut registry = open_registry(&options);
            registry.update_stats(id, result.skipped.is_empty());
        }
    }

    if table.row_count() > 0 && result.skipped.len() == table.row_count() {
        return Err(PipelineError::AllSkipped(table.row_count()));
    }

    log_info(format!("Writing output to: {}", options.output_path.display()));
    let output_columns = recipe.output_columns();
    write_csv(&options.output_path, &output_columns, &result.records)?;
    log_success(format!(
        "Processed data successfully saved to: {}",
        options.output_path.display()
    ));

    Ok(ProcessReport {
        input_rows: table.row_count(),
        output_rows: result.records.len(),
        dropped_rows: result.dropped,
        skipped_rows: result.skipped.len(),
        input_columns: table.headers.clone(),
        output_columns,
        recipe_description: recipe.description.clone(),
        recipe_id,
        output_path: options.output_path.clone(),
        encoding: table.encoding.clone(),
        delimiter: table.delimiter,
    })
}

/// Resolve which recipe to apply: explicit file, stored recipe, or the
/// built-in default.
fn resolve_recipe(
    table: &ParsedTable,
    options: &ProcessOptions,
) -> PipelineResult<(Recipe, Option<String>)> {
    // Option 1: explicit recipe file
    if let Some(ref path) = options.recipe_path {
        log_info(format!("Using recipe file: {}", path.display()));
        let recipe = load_recipe_file(path)?;
        return Ok((recipe, None));
    }

    // Option 2: best compatible stored recipe
    if !options.no_registry {
        log_debug("Looking for compatible stored recipes...");
        let registry = open_registry(options);
        let compatible = registry.find_compatible(&table.headers);

        if let Some((stored, score)) = compatible.first() {
            log_success(format!(
                "Using stored recipe \"{}\" (match: {:.0}%, success rate: {:.0}%)",
                stored.name,
                score * 100.0,
                stored.success_rate * 100.0
            ));
            return Ok((stored.recipe.clone(), Some(stored.id.clone())));
        }
        log_debug("No compatible stored recipe found");
    }

    // Option 3: built-in default
    log_info("Using built-in default recipe");
    Ok((default_recipe(), None))
}

/// Load and schema-check a recipe file.
pub fn load_recipe_file(path: &Path) -> Result<Recipe, RecipeError> {
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;

    validate_recipe(&value).map_err(|errors| RecipeError::SchemaViolation { errors })?;

    Ok(Recipe::from_value(&value)?)
}

/// Check recipe source columns against the input header.
///
/// Columns backing required output columns are always fatal when absent; in
/// strict mode every missing reference is. Otherwise missing references are
/// logged and the affected cells resolve to their defaults.
fn check_headers(recipe: &Recipe, table: &ParsedTable, strict: bool) -> Result<(), RecipeError> {
    let missing = match recipe.validate_headers(&table.headers) {
        Ok(()) => return Ok(()),
        Err(missing) => missing,
    };

    let required_missing: Vec<String> = recipe
        .columns
        .iter()
        .filter(|c| c.required)
        .flat_map(|c| c.get_sources())
        .filter(|s| missing.contains(s))
        .collect();

    if strict || !required_missing.is_empty() {
        let columns = if strict { missing } else { required_missing };
        return Err(RecipeError::MissingColumns { columns });
    }

    log_warning(format!(
        "Input is missing optional source column(s): {}",
        missing.join(", ")
    ));
    Ok(())
}

fn open_registry(options: &ProcessOptions) -> RecipeRegistry {
    match options.registry_dir {
        Some(ref dir) => RecipeRegistry::with_dir(dir),
        None => RecipeRegistry::new(),
    }
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE_CSV: &str = "id,category,value1,value2\n\
        1,X,15,10.0\n\
        2,Y,25,20.0\n\
        3,X,35,30.0\n\
        4,Z,45,40.0\n\
        5,Y,10,50.0\n";

    fn options_for(dir: &Path) -> ProcessOptions {
        ProcessOptions {
            output_path: dir.join("data").join("processed_output.csv"),
            no_registry: true,
            ..ProcessOptions::default()
        }
    }

    #[test]
    fn test_process_with_default_recipe() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("sample_input.csv");
        std::fs::write(&input, SAMPLE_CSV).unwrap();

        let report = process_csv(&input, options_for(dir.path())).unwrap();

        assert_eq!(report.input_rows, 5);
        assert_eq!(report.output_rows, 3);
        assert_eq!(report.dropped_rows, 2);
        assert_eq!(report.skipped_rows, 0);
        assert_eq!(
            report.output_columns,
            vec![
                "id",
                "category",
                "value1",
                "value2",
                "value1_plus_10",
                "value2_div_value1",
                "value1_type"
            ]
        );

        let output = std::fs::read_to_string(&report.output_path).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,category,value1,value2,value1_plus_10,value2_div_value1,value1_type"
        );
        assert_eq!(lines.next().unwrap(), "2,Y,25,20.0,35,0.8,Medium");
        assert_eq!(lines.next().unwrap(), "3,X,35,30.0,45,0.857143,Medium");
        assert_eq!(lines.next().unwrap(), "4,Z,45,40.0,55,0.888889,High");
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("sample_input.csv");
        std::fs::write(&input, SAMPLE_CSV).unwrap();

        process_csv(&input, options_for(dir.path())).unwrap();
        let first = std::fs::read(dir.path().join("data").join("processed_output.csv")).unwrap();

        process_csv(&input, options_for(dir.path())).unwrap();
        let second = std::fs::read(dir.path().join("data").join("processed_output.csv")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_input_creates_no_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("does_not_exist.csv");
        let options = options_for(dir.path());
        let output_path = options.output_path.clone();

        let result = process_csv(&input, options);

        assert!(matches!(result, Err(PipelineError::InputNotFound(_))));
        assert!(!output_path.exists());
    }

    #[test]
    fn test_header_only_input_writes_header_only_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("empty.csv");
        std::fs::write(&input, "id,category,value1,value2\n").unwrap();

        let report = process_csv(&input, options_for(dir.path())).unwrap();
        assert_eq!(report.input_rows, 0);
        assert_eq!(report.output_rows, 0);

        let output = std::fs::read_to_string(&report.output_path).unwrap();
        assert_eq!(
            output,
            "id,category,value1,value2,value1_plus_10,value2_div_value1,value1_type\n"
        );
    }

    #[test]
    fn test_wrong_schema_is_fatal() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("wrong.csv");
        std::fs::write(&input, "a,b\n1,2\n").unwrap();

        let result = process_csv(&input, options_for(dir.path()));
        match result {
            Err(PipelineError::Recipe(RecipeError::MissingColumns { columns })) => {
                assert!(columns.contains(&"id".to_string()));
            }
            other => panic!("expected MissingColumns, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_explicit_recipe_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(&input, "name,score\nalice,10\nbob,40\n").unwrap();

        let recipe_json = serde_json::json!({
            "description": "scores",
            "columns": [
                {"name": "name", "source": "name", "operations": [{"type": "uppercase"}]},
                {"name": "score", "source": "score", "operations": [{"type": "to_integer"}], "required": true}
            ],
            "filters": [{"column": "score", "op": "gt", "value": 20}]
        });
        let recipe_path = dir.path().join("scores.json");
        std::fs::write(&recipe_path, recipe_json.to_string()).unwrap();

        let options = ProcessOptions {
            recipe_path: Some(recipe_path),
            ..options_for(dir.path())
        };
        let report = process_csv(&input, options).unwrap();

        assert_eq!(report.output_rows, 1);
        assert_eq!(report.recipe_description, "scores");

        let output = std::fs::read_to_string(&report.output_path).unwrap();
        assert_eq!(output, "name,score\nBOB,40\n");
    }

    #[test]
    fn test_invalid_recipe_file_is_schema_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(&input, "a,b\n1,2\n").unwrap();

        let recipe_path = dir.path().join("bad.json");
        std::fs::write(&recipe_path, r#"{"version": "1.0"}"#).unwrap();

        let options = ProcessOptions {
            recipe_path: Some(recipe_path),
            ..options_for(dir.path())
        };
        let result = process_csv(&input, options);
        assert!(matches!(
            result,
            Err(PipelineError::Recipe(RecipeError::SchemaViolation { .. }))
        ));
    }

    #[test]
    fn test_stored_recipe_is_picked_up() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(&input, SAMPLE_CSV).unwrap();

        let registry_dir = dir.path().join("registry");
        {
            let mut registry = RecipeRegistry::with_dir(&registry_dir);
            let recipe = default_recipe();
            let columns = recipe.source_columns();
            registry.save(recipe, "stored default", columns).unwrap();
        }

        let options = ProcessOptions {
            no_registry: false,
            registry_dir: Some(registry_dir.clone()),
            ..options_for(dir.path())
        };
        let report = process_csv(&input, options).unwrap();

        assert!(report.recipe_id.is_some());
        assert_eq!(report.output_rows, 3);

        // Usage stats were recorded
        let registry = RecipeRegistry::with_dir(&registry_dir);
        let stored = registry.get(report.recipe_id.as_ref().unwrap()).unwrap();
        assert_eq!(stored.use_count, 1);
    }

    #[test]
    fn test_strict_mode_rejects_optional_missing_columns() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(&input, "id,value1,value2\n1,25,10.0\n").unwrap();

        // category is optional in the default recipe: lax mode tolerates it
        let report = process_csv(&input, options_for(dir.path())).unwrap();
        assert_eq!(report.output_rows, 1);

        let options = ProcessOptions {
            strict: true,
            ..options_for(dir.path())
        };
        let result = process_csv(&input, options);
        assert!(matches!(
            result,
            Err(PipelineError::Recipe(RecipeError::MissingColumns { .. }))
        ));
    }
}
