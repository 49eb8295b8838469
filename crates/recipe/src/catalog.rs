use crate::types::Recipe;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog read failed: {0}")]
    ReadFailed(String),
}

/// Filter applied when listing recipes from the catalog
///
/// Pre-filtering here is an optimization only: the planner's scorer re-checks
/// tag and ingredient exclusions against its own constraint set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeFilter {
    pub excluded_tags: BTreeSet<String>,
    pub excluded_ingredients: BTreeSet<String>,
    pub max_prep_time_min: Option<u32>,
}

impl RecipeFilter {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        if recipe.tags.iter().any(|t| self.excluded_tags.contains(t)) {
            return false;
        }
        if self
            .excluded_ingredients
            .iter()
            .any(|name| recipe.uses_ingredient(name))
        {
            return false;
        }
        if let Some(max) = self.max_prep_time_min {
            if recipe.prep_time_min > max {
                return false;
            }
        }
        true
    }
}

/// Read-only recipe provider consumed by the plan generator
///
/// Implementations must be safe for concurrent reads; the generator loads the
/// full candidate pool once per request.
#[async_trait]
pub trait RecipeCatalog: Send + Sync {
    async fn list_recipes(&self, filter: &RecipeFilter) -> Result<Vec<Recipe>, CatalogError>;
}

/// In-memory catalog backed by a fixed recipe list
///
/// Used by tests and small deployments that load recipes up front.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    recipes: Vec<Recipe>,
}

impl InMemoryCatalog {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        InMemoryCatalog { recipes }
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

#[async_trait]
impl RecipeCatalog for InMemoryCatalog {
    async fn list_recipes(&self, filter: &RecipeFilter) -> Result<Vec<Recipe>, CatalogError> {
        Ok(self
            .recipes
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}
