use meal_planning::MealPlan;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// One line of the derived shopping list
///
/// Recomputed from the source plan on demand and never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListEntry {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    /// Set when the same ingredient name appears under incompatible units;
    /// the entries stay separate and a human resolves the conflict.
    pub unit_conflict: bool,
}

/// Derive the deduplicated shopping list for a completed plan
///
/// Ingredients group by normalized (name, unit) with quantities summed.
/// A name spanning several units keeps one entry per unit, each flagged as a
/// unit conflict rather than failing the derivation. Output ordering is
/// alphabetical by name, then unit, so repeated calls are identical. The
/// plan itself is never mutated.
pub fn build_shopping_list(plan: &MealPlan) -> Vec<ShoppingListEntry> {
    let mut groups: BTreeMap<(String, String), f64> = BTreeMap::new();

    for assignment in &plan.assignments {
        for ingredient in &assignment.recipe.ingredients {
            let key = (
                ingredient.normalized_name(),
                ingredient.unit.trim().to_lowercase(),
            );
            *groups.entry(key).or_insert(0.0) += ingredient.quantity;
        }
    }

    let mut units_per_name: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (name, unit) in groups.keys() {
        units_per_name
            .entry(name.as_str())
            .or_default()
            .insert(unit.as_str());
    }

    groups
        .iter()
        .map(|((name, unit), quantity)| {
            let unit_conflict = units_per_name[name.as_str()].len() > 1;
            if unit_conflict {
                warn!(
                    ingredient = %name,
                    unit = %unit,
                    "ingredient listed under multiple units; left for manual merge"
                );
            }
            ShoppingListEntry {
                name: name.clone(),
                quantity: *quantity,
                unit: unit.clone(),
                unit_conflict,
            }
        })
        .collect()
}
