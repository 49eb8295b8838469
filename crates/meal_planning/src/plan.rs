use crate::constraints::MealSlot;
use recipe::Recipe;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One filled meal slot: the slot plus a snapshot of the assigned recipe
///
/// The snapshot keeps the plan self-contained: shopping-list aggregation and
/// persistence never go back to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealAssignment {
    pub slot: MealSlot,
    pub recipe: Recipe,
}

/// A finalized meal plan: every slot carries exactly one assignment
///
/// Plans have no identity of their own; the persistence gateway assigns a
/// `PlanId` on save. Identical generation inputs therefore produce
/// byte-identical plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub assignments: Vec<MealAssignment>,
}

impl MealPlan {
    pub fn new(assignments: Vec<MealAssignment>) -> Self {
        MealPlan { assignments }
    }

    pub fn slot_count(&self) -> usize {
        self.assignments.len()
    }

    /// Count of distinct recipes used across the plan
    pub fn distinct_recipe_count(&self) -> usize {
        self.assignments
            .iter()
            .map(|a| a.recipe.id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// How many times the given recipe is assigned in the plan
    pub fn usage_count(&self, recipe_id: &str) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.recipe.id == recipe_id)
            .count()
    }
}
