//! The saved-recipe collection: listing, search, edits and JSON export/import.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::{LibraryError, StoreError};
use crate::normalize::normalize_lines;
use crate::store::RecordStore;
use crate::types::{display_title, Recipe};

/// Replacement content for a recipe, as typed into an edit form.
#[derive(Debug, Clone, Default)]
pub struct RecipeEdit {
    pub title: String,
    /// One ingredient per line.
    pub ingredients: String,
    /// One step per line.
    pub instructions: String,
}

/// Recipes keyed by id in the recipes namespace.
#[derive(Clone)]
pub struct RecipeBook {
    store: Arc<dyn RecordStore>,
}

impl RecipeBook {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Insert or overwrite by id.
    pub async fn save(&self, recipe: &Recipe) -> Result<(), StoreError> {
        let value = serde_json::to_value(recipe)?;
        self.store.set(&recipe.id, value).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Recipe>, StoreError> {
        Ok(self
            .store
            .get(id)
            .await?
            .and_then(|value| decode_recipe(id, value)))
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(id).await
    }

    /// Every stored recipe, newest first.
    pub async fn list(&self) -> Result<Vec<Recipe>, StoreError> {
        let mut recipes = Vec::new();
        for key in self.store.keys().await? {
            if let Some(value) = self.store.get(&key).await? {
                if let Some(recipe) = decode_recipe(&key, value) {
                    recipes.push(recipe);
                }
            }
        }
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recipes)
    }

    /// Case-insensitive match on title or source domain. An empty query
    /// returns the full list.
    pub async fn search(&self, query: &str) -> Result<Vec<Recipe>, StoreError> {
        let query = query.trim().to_lowercase();
        let recipes = self.list().await?;
        if query.is_empty() {
            return Ok(recipes);
        }
        Ok(recipes
            .into_iter()
            .filter(|r| {
                r.title.to_lowercase().contains(&query)
                    || domain_from_url(&r.url).is_some_and(|d| d.contains(&query))
            })
            .collect())
    }

    pub async fn update_notes(&self, id: &str, notes: &str) -> Result<Recipe, LibraryError> {
        let mut recipe = self.require(id).await?;
        recipe.notes = notes.to_string();
        self.save(&recipe).await?;
        Ok(recipe)
    }

    /// Replace title and both lists; id, url, timestamp and notes are kept.
    pub async fn edit(&self, id: &str, edit: RecipeEdit) -> Result<Recipe, LibraryError> {
        let mut recipe = self.require(id).await?;
        recipe.title = display_title(Some(&edit.title));
        recipe.ingredients = normalize_lines(&edit.ingredients);
        recipe.instructions = normalize_lines(&edit.instructions);
        self.save(&recipe).await?;
        Ok(recipe)
    }

    /// Pretty-printed JSON array of every recipe, newest first.
    pub async fn export_json(&self) -> Result<String, LibraryError> {
        let recipes = self.list().await?;
        Ok(serde_json::to_string_pretty(&recipes).map_err(StoreError::from)?)
    }

    /// Load an exported array. Nothing is written unless the whole document
    /// parses. Returns the number of recipes saved.
    pub async fn import_json(&self, text: &str) -> Result<usize, LibraryError> {
        let recipes: Vec<Recipe> = serde_json::from_str(text)?;
        let count = recipes.len();
        for recipe in recipes {
            self.save(&recipe.sanitized()).await?;
        }
        tracing::info!(count, "imported recipes");
        Ok(count)
    }

    async fn require(&self, id: &str) -> Result<Recipe, LibraryError> {
        self.get(id)
            .await?
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))
    }
}

fn decode_recipe(key: &str, value: JsonValue) -> Option<Recipe> {
    match serde_json::from_value::<Recipe>(value) {
        Ok(recipe) => Some(recipe),
        Err(e) => {
            tracing::warn!(key, error = %e, "skipping undecodable recipe");
            None
        }
    }
}

/// Lowercased host of `url` without a leading `www.`.
pub fn domain_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}
