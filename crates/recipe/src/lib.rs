pub mod catalog;
pub mod types;

pub use catalog::{CatalogError, InMemoryCatalog, RecipeCatalog, RecipeFilter};
pub use types::{Ingredient, MealType, NutrientField, Nutrients, Recipe};
