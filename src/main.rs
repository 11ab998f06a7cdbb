//! rowmill CLI - Transform CSV files with configurable recipes
//!
//! # Main Commands
//!
//! ```bash
//! rowmill process                   # data/sample_input.csv -> data/processed_output.csv
//! rowmill process input.csv -o out.csv -r recipe.json
//! rowmill recipe list               # Manage stored recipes
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! rowmill parse input.csv           # Just parse CSV to JSON
//! rowmill check recipe.json in.csv  # Validate a recipe (and its columns)
//! rowmill sample                    # Write the deterministic sample input
//! rowmill operations                # Show available recipe operations
//! rowmill example-recipe            # Show an example recipe
//! ```

use clap::{Parser, Subcommand};
use rowmill::{
    csv_string, example_recipe, execute, init_file_logging, load_recipe_file, log_error, log_info,
    operations_description, parse_file, parse_file_auto, process_csv, write_csv, ProcessOptions,
    RecipeRegistry, DEFAULT_INPUT_PATH, DEFAULT_LOG_PATH, DEFAULT_OUTPUT_PATH,
};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rowmill")]
#[command(about = "Transform CSV files with configurable recipes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: read, transform, write, log
    Process {
        /// Input CSV file (default: data/sample_input.csv)
        input: Option<PathBuf>,

        /// Output CSV file (default: data/processed_output.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Recipe JSON file (default: stored recipes, then the built-in recipe)
        #[arg(short, long)]
        recipe: Option<PathBuf>,

        /// Input delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Log file (default: data/data_processing.log)
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Don't look up stored recipes
        #[arg(long)]
        no_registry: bool,

        /// Don't record usage statistics for the chosen stored recipe
        #[arg(long)]
        no_save: bool,

        /// Treat any missing source column as fatal
        #[arg(long)]
        strict: bool,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a recipe file, optionally against a CSV's columns
    Check {
        /// Recipe JSON file
        recipe: PathBuf,

        /// Input CSV to check column references against
        input: Option<PathBuf>,
    },

    /// Write the deterministic sample input CSV
    Sample {
        /// Destination (default: data/sample_input.csv)
        path: Option<PathBuf>,
    },

    /// Show available recipe operations
    Operations,

    /// Show an example recipe
    ExampleRecipe,

    /// Manage stored recipes
    Recipe {
        #[command(subcommand)]
        action: RecipeAction,
    },
}

#[derive(Subcommand)]
enum RecipeAction {
    /// List all stored recipes
    List,

    /// Import a recipe JSON file into the registry
    Import {
        /// Recipe JSON file to import
        file: PathBuf,
        /// Name for the stored recipe
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show details of a stored recipe
    Show {
        /// Recipe ID
        id: String,
    },

    /// Delete a stored recipe
    Delete {
        /// Recipe ID
        id: String,
    },

    /// Apply a specific stored recipe to a CSV
    Use {
        /// Recipe ID
        id: String,
        /// Input CSV file
        input: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process {
            input,
            output,
            recipe,
            delimiter,
            log_file,
            no_registry,
            no_save,
            strict,
        } => cmd_process(input, output, recipe, delimiter, log_file, no_registry, no_save, strict),

        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref()),

        Commands::Check { recipe, input } => cmd_check(&recipe, input.as_deref()),

        Commands::Sample { path } => cmd_sample(path),

        Commands::Operations => cmd_operations(),

        Commands::ExampleRecipe => cmd_example_recipe(),

        Commands::Recipe { action } => cmd_recipe(action),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_process(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    recipe: Option<PathBuf>,
    delimiter: Option<char>,
    log_file: Option<PathBuf>,
    no_registry: bool,
    no_save: bool,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let log_path = log_file.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH));
    if let Err(e) = init_file_logging(&log_path) {
        eprintln!("Warning: cannot open log file {}: {}", log_path.display(), e);
    }

    log_info("Processing started");

    let input = input.unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_PATH));
    let options = ProcessOptions {
        recipe_path: recipe,
        output_path: output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
        delimiter,
        no_registry,
        no_save,
        strict,
        registry_dir: None,
    };

    let report = process_csv(&input, options)?;

    log_info(format!(
        "Processing finished: {} rows in, {} rows out ({} filtered, {} skipped)",
        report.input_rows, report.output_rows, report.dropped_rows, report.skipped_rows
    ));
    Ok(())
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Parsing CSV: {}", input.display());

    let table = match delimiter {
        Some(d) => parse_file(input, d)?,
        None => parse_file_auto(input)?,
    };

    eprintln!("   Encoding: {}", table.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        match table.delimiter {
            '\t' => "\\t".to_string(),
            c => c.to_string(),
        },
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Columns: {}", table.headers.join(", "));
    eprintln!("Parsed {} rows", table.row_count());

    let json = serde_json::to_string_pretty(&table.rows)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_check(recipe_path: &Path, input: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Checking recipe: {}", recipe_path.display());

    let recipe = load_recipe_file(recipe_path)?;
    eprintln!(
        "Recipe is valid: {} output column(s), {} filter(s)",
        recipe.columns.len(),
        recipe.filters.len()
    );

    if let Some(input) = input {
        eprintln!("Checking column references against: {}", input.display());
        let table = parse_file_auto(input)?;

        if let Err(missing) = recipe.validate_headers(&table.headers) {
            return Err(format!("Input is missing source column(s): {}", missing.join(", ")).into());
        }
        eprintln!("All {} referenced column(s) present", recipe.source_columns().len());
    }

    Ok(())
}

fn cmd_sample(path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_PATH));

    let columns: Vec<String> = ["id", "category", "value1", "value2"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let records = vec![
        json!({"id": 1, "category": "A", "value1": 15, "value2": 96.99}),
        json!({"id": 2, "category": "B", "value1": 25, "value2": 57.71}),
        json!({"id": 3, "category": "A", "value1": 35, "value2": 12.6}),
        json!({"id": 4, "category": "C", "value1": 45, "value2": 33.89}),
        json!({"id": 5, "category": "B", "value1": 10, "value2": 82.84}),
    ];

    write_csv(&path, &columns, &records)?;
    eprintln!("Sample data written to: {}", path.display());
    Ok(())
}

fn cmd_operations() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", operations_description());
    Ok(())
}

fn cmd_example_recipe() -> Result<(), Box<dyn std::error::Error>> {
    let recipe = example_recipe();
    println!("{}", recipe.to_json()?);
    Ok(())
}

fn cmd_recipe(action: RecipeAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = RecipeRegistry::new();

    match action {
        RecipeAction::List => {
            let recipes = registry.list();
            if recipes.is_empty() {
                eprintln!("No recipes stored yet.");
                eprintln!("   Use 'rowmill recipe import <file>' to add one.");
                return Ok(());
            }

            eprintln!("Stored recipes ({}):\n", recipes.len());
            for r in recipes {
                println!("  {} ({})", r.name, r.id);
                println!("     Columns: {}", r.csv_columns.join(", "));
                println!("     Success rate: {:.0}%", r.success_rate * 100.0);
                println!("     Uses: {}", r.use_count);
                if let Some(ref last) = r.last_used {
                    println!("     Last used: {}", last);
                }
                println!();
            }
        }

        RecipeAction::Import { file, name } => {
            eprintln!("Importing recipe from: {}", file.display());
            let id = registry.import(&file, name.as_deref())?;
            eprintln!("Recipe saved with ID: {}", id);
        }

        RecipeAction::Show { id } => match registry.get(&id) {
            Some(r) => {
                println!("Recipe: {} ({})\n", r.name, r.id);
                println!("Columns: {}", r.csv_columns.join(", "));
                println!("Created: {}", r.created_at);
                println!("Success rate: {:.0}%", r.success_rate * 100.0);
                println!("Uses: {}", r.use_count);
                println!("\nDefinition:");
                println!("{}", r.recipe.to_json()?);
            }
            None => {
                return Err(format!("Recipe not found: {}", id).into());
            }
        },

        RecipeAction::Delete { id } => {
            registry.delete(&id)?;
            eprintln!("Recipe deleted: {}", id);
        }

        RecipeAction::Use { id, input, output } => {
            let stored = registry
                .get(&id)
                .ok_or_else(|| format!("Recipe not found: {}", id))?
                .clone();

            eprintln!("Using recipe: {} ({})", stored.name, stored.id);

            let table = parse_file_auto(&input)?;
            eprintln!("   Found {} rows", table.row_count());

            let result = execute(&table.rows, &stored.recipe);
            eprintln!("   {}", result.summary());

            registry.update_stats(&id, result.skipped.is_empty());

            let columns = stored.recipe.output_columns();
            match output {
                Some(path) => {
                    write_csv(&path, &columns, &result.records)?;
                    eprintln!("Output written to: {}", path.display());
                }
                None => {
                    print!("{}", csv_string(&columns, &result.records)?);
                }
            }
        }
    }

    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
