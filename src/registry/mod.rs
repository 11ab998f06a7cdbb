//! Recipe registry - store and reuse transformation recipes.
//!
//! Saves recipes to disk and automatically matches them to CSV formats based
//! on their column lists, so a file format seen before is transformed the
//! same way again without passing `--recipe`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RegistryError, RegistryResult};
use crate::transform::recipe::Recipe;
use crate::validation::validate_recipe;

/// Directory where recipes are stored (relative to current dir)
const DEFAULT_REGISTRY_DIR: &str = ".rowmill/recipes";

/// A stored recipe with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecipe {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// The recipe itself
    pub recipe: Recipe,
    /// CSV columns this recipe was created for
    pub csv_columns: Vec<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last time this recipe was used
    pub last_used: Option<String>,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Number of times used
    pub use_count: u32,
}

/// Registry for managing stored recipes
pub struct RecipeRegistry {
    /// Directory where recipes are stored
    registry_dir: PathBuf,
    /// Loaded recipes (id -> recipe)
    recipes: HashMap<String, StoredRecipe>,
}

impl RecipeRegistry {
    /// Create a new registry, loading existing recipes from disk
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_REGISTRY_DIR)
    }

    /// Create a registry with a custom directory
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        let registry_dir = PathBuf::from(dir.as_ref());
        let mut registry = Self {
            registry_dir,
            recipes: HashMap::new(),
        };
        registry.load_all();
        registry
    }

    /// Load all recipes from the registry directory
    fn load_all(&mut self) {
        if !self.registry_dir.exists() {
            return;
        }

        let entries = match fs::read_dir(&self.registry_dir) {
            Ok(e) => e,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Ok(stored) = serde_json::from_str::<StoredRecipe>(&content) {
                        self.recipes.insert(stored.id.clone(), stored);
                    }
                }
            }
        }
    }

    /// Get all stored recipes
    pub fn list(&self) -> Vec<&StoredRecipe> {
        let mut all: Vec<_> = self.recipes.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Get a recipe by ID
    pub fn get(&self, id: &str) -> Option<&StoredRecipe> {
        self.recipes.get(id)
    }

    /// Find compatible recipes for given CSV columns.
    /// Returns recipes sorted by compatibility score and success rate.
    pub fn find_compatible(&self, csv_columns: &[String]) -> Vec<(&StoredRecipe, f64)> {
        let mut compatible: Vec<_> = self
            .recipes
            .values()
            .filter_map(|r| {
                let score = self.calculate_compatibility(&r.csv_columns, csv_columns);
                if score > 0.5 {
                    Some((r, score))
                } else {
                    None
                }
            })
            .collect();

        // Sort by: compatibility score * success rate (descending)
        compatible.sort_by(|a, b| {
            let score_a = a.1 * a.0.success_rate;
            let score_b = b.1 * b.0.success_rate;
            score_b.partial_cmp(&score_a).unwrap_or(std::cmp::Ordering::Equal)
        });

        compatible
    }

    /// Calculate compatibility score between stored columns and CSV columns
    fn calculate_compatibility(&self, stored: &[String], csv: &[String]) -> f64 {
        if stored.is_empty() {
            return 0.0;
        }

        let csv_lower: Vec<String> = csv.iter().map(|c| c.to_lowercase()).collect();
        let match_count = stored
            .iter()
            .filter(|col| csv_lower.contains(&col.to_lowercase()))
            .count();

        match_count as f64 / stored.len() as f64
    }

    /// Save a new recipe to the registry
    pub fn save(
        &mut self,
        recipe: Recipe,
        name: &str,
        csv_columns: Vec<String>,
    ) -> RegistryResult<String> {
        // Ensure directory exists
        fs::create_dir_all(&self.registry_dir)?;

        let id = self.generate_id(name);
        let stored = StoredRecipe {
            id: id.clone(),
            name: name.to_string(),
            recipe,
            csv_columns,
            created_at: chrono::Utc::now().to_rfc3339(),
            last_used: None,
            success_rate: 1.0,
            use_count: 0,
        };

        // Save to disk
        let path = self.registry_dir.join(format!("{}.json", id));
        let content = serde_json::to_string_pretty(&stored)?;
        fs::write(&path, content)?;

        self.recipes.insert(id.clone(), stored);
        Ok(id)
    }

    /// Import a recipe from a JSON file, validating it against the
    /// recipe schema first.
    pub fn import(&mut self, path: &Path, name: Option<&str>) -> RegistryResult<String> {
        let content = fs::read_to_string(path)?;

        let value: serde_json::Value = serde_json::from_str(&content)?;
        validate_recipe(&value)
            .map_err(|errors| RegistryError::InvalidRecipe(errors.join("; ")))?;

        let recipe: Recipe = serde_json::from_value(value)?;

        let recipe_name = name.unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("imported")
        });

        let csv_columns = recipe.source_columns();
        self.save(recipe, recipe_name, csv_columns)
    }

    /// Update statistics after using a recipe
    pub fn update_stats(&mut self, id: &str, success: bool) {
        if let Some(stored) = self.recipes.get_mut(id) {
            // Exponential moving average
            stored.success_rate = if success {
                stored.success_rate * 0.9 + 0.1
            } else {
                stored.success_rate * 0.9
            };
            stored.last_used = Some(chrono::Utc::now().to_rfc3339());
            stored.use_count += 1;

            // Save updated stats
            let path = self.registry_dir.join(format!("{}.json", id));
            if let Ok(content) = serde_json::to_string_pretty(stored) {
                let _ = fs::write(&path, content);
            }
        }
    }

    /// Delete a recipe from the registry
    pub fn delete(&mut self, id: &str) -> RegistryResult<()> {
        if self.recipes.remove(id).is_some() {
            let path = self.registry_dir.join(format!("{}.json", id));
            fs::remove_file(&path)?;
            Ok(())
        } else {
            Err(RegistryError::NotFound(id.to_string()))
        }
    }

    /// Generate a unique ID from a name
    fn generate_id(&self, name: &str) -> String {
        let slug: String = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        let timestamp = chrono::Utc::now().timestamp_millis();
        format!("{}-{}", slug, timestamp)
    }
}

impl Default for RecipeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::recipe::default_recipe;
    use tempfile::tempdir;

    #[test]
    fn test_compatibility_score() {
        let registry = RecipeRegistry::with_dir(tempdir().unwrap().path());

        let stored = vec!["id".to_string(), "value1".to_string(), "value2".to_string()];
        let csv = vec!["id".to_string(), "value1".to_string(), "other".to_string()];

        let score = registry.calculate_compatibility(&stored, &csv);
        assert!((score - 0.666).abs() < 0.01); // 2/3 match
    }

    #[test]
    fn test_case_insensitive_match() {
        let registry = RecipeRegistry::with_dir(tempdir().unwrap().path());

        let stored = vec!["id".to_string(), "VALUE1".to_string()];
        let csv = vec!["ID".to_string(), "value1".to_string()];

        let score = registry.calculate_compatibility(&stored, &csv);
        assert!((score - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let recipe = default_recipe();
        let columns = recipe.source_columns();

        let id = {
            let mut registry = RecipeRegistry::with_dir(dir.path());
            registry.save(recipe, "numeric enrichment", columns).unwrap()
        };

        let registry = RecipeRegistry::with_dir(dir.path());
        let stored = registry.get(&id).unwrap();
        assert_eq!(stored.name, "numeric enrichment");
        assert!((stored.success_rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_find_compatible_after_save() {
        let dir = tempdir().unwrap();
        let mut registry = RecipeRegistry::with_dir(dir.path());

        let recipe = default_recipe();
        let columns = recipe.source_columns();
        registry.save(recipe, "default", columns).unwrap();

        let headers: Vec<String> = ["id", "category", "value1", "value2"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let compatible = registry.find_compatible(&headers);
        assert_eq!(compatible.len(), 1);
        assert!((compatible[0].1 - 1.0).abs() < 0.01);

        let unrelated: Vec<String> = ["alpha", "beta"].iter().map(|s| s.to_string()).collect();
        assert!(registry.find_compatible(&unrelated).is_empty());
    }

    #[test]
    fn test_import_rejects_invalid_recipe() {
        let dir = tempdir().unwrap();
        let bad_path = dir.path().join("bad.json");
        std::fs::write(&bad_path, r#"{ "version": "1.0" }"#).unwrap();

        let mut registry = RecipeRegistry::with_dir(dir.path().join("registry"));
        let result = registry.import(&bad_path, None);
        assert!(matches!(result, Err(RegistryError::InvalidRecipe(_))));
    }

    #[test]
    fn test_import_and_delete() {
        let dir = tempdir().unwrap();
        let recipe_path = dir.path().join("numeric.json");
        std::fs::write(&recipe_path, default_recipe().to_json().unwrap()).unwrap();

        let mut registry = RecipeRegistry::with_dir(dir.path().join("registry"));
        let id = registry.import(&recipe_path, None).unwrap();
        assert!(id.starts_with("numeric"));
        assert!(registry.get(&id).is_some());

        registry.delete(&id).unwrap();
        assert!(registry.get(&id).is_none());
        assert!(matches!(
            registry.delete(&id),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_stats_ema() {
        let dir = tempdir().unwrap();
        let mut registry = RecipeRegistry::with_dir(dir.path());

        let recipe = default_recipe();
        let columns = recipe.source_columns();
        let id = registry.save(recipe, "default", columns).unwrap();

        registry.update_stats(&id, false);
        let stored = registry.get(&id).unwrap();
        assert!((stored.success_rate - 0.9).abs() < 0.01);
        assert_eq!(stored.use_count, 1);
        assert!(stored.last_used.is_some());
    }
}
