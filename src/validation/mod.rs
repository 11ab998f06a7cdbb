//! JSON Schema validation for recipe documents.
//!
//! Recipes are user-supplied configuration, so they are checked against a
//! JSON Schema (Draft 7) before serde deserialization is attempted: schema
//! errors name the offending property instead of surfacing as an opaque
//! deserialization failure.
//!
//! The schema is embedded at compile time from `schemas/recipe.schema.json`.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use rowmill::validation::validate_recipe;
//!
//! let recipe = json!({
//!     "columns": [{"name": "id", "source": "id"}]
//! });
//! assert!(validate_recipe(&recipe).is_ok());
//! ```

use serde_json::Value;

/// Validate a JSON object against a JSON Schema.
///
/// # Returns
/// * `Ok(())` when valid
/// * `Err(Vec<String>)` with one message per violation
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Boolean shortcut for [`validate`].
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate a recipe document against the embedded recipe schema.
pub fn validate_recipe(data: &Value) -> Result<(), Vec<String>> {
    let schema: Value = serde_json::from_str(include_str!("../../schemas/recipe.schema.json"))
        .expect("Invalid embedded schema");
    validate(&schema, data)
}

/// Quick check against the recipe schema.
pub fn is_valid_recipe(data: &Value) -> bool {
    let schema: Value = serde_json::from_str(include_str!("../../schemas/recipe.schema.json"))
        .expect("Invalid embedded schema");
    is_valid(&schema, data)
}
