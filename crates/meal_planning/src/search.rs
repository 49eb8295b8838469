use crate::constraints::ValidatedConstraints;
use crate::error::PlanningError;
use crate::plan::{MealAssignment, MealPlan};
use crate::scoring::{score_candidate, CandidateScore, ScoreWeights};
use recipe::Recipe;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Score ties within this distance are broken by usage count, then recipe id
const SCORE_EPSILON: f64 = 1e-9;

/// Per-request search configuration
///
/// Passed explicitly into each generation call; there is no process-wide
/// planner state, so concurrent requests stay isolated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub weights: ScoreWeights,
    /// Maximum undo-and-retry steps before giving up; defaults to slot count
    pub backtrack_budget: Option<usize>,
    /// Widens each nutrient target range by this fraction of its width
    pub nutrient_tolerance: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            weights: ScoreWeights::default(),
            backtrack_budget: None,
            nutrient_tolerance: 0.5,
        }
    }
}

/// Search-time plan state: assignments so far plus derived usage counts
///
/// Created at the start of a generation request and discarded at the end;
/// it never outlives a single call. Assign/unassign keep the usage indexes
/// in sync so backtracking is a cheap restore.
#[derive(Debug, Clone)]
pub struct PartialPlan {
    assignments: Vec<Option<Recipe>>,
    recipe_usage: HashMap<String, usize>,
    ingredient_usage: HashMap<String, usize>,
}

impl PartialPlan {
    pub fn new(slot_count: usize) -> Self {
        PartialPlan {
            assignments: vec![None; slot_count],
            recipe_usage: HashMap::new(),
            ingredient_usage: HashMap::new(),
        }
    }

    pub fn recipe_at(&self, index: usize) -> Option<&Recipe> {
        self.assignments.get(index).and_then(|a| a.as_ref())
    }

    pub fn usage_count(&self, recipe_id: &str) -> usize {
        self.recipe_usage.get(recipe_id).copied().unwrap_or(0)
    }

    pub fn distinct_count(&self) -> usize {
        self.recipe_usage.len()
    }

    pub fn uses_ingredient(&self, normalized: &str) -> bool {
        self.ingredient_usage.contains_key(normalized)
    }

    pub fn assign(&mut self, index: usize, recipe: Recipe) {
        debug_assert!(self.assignments[index].is_none());
        *self.recipe_usage.entry(recipe.id.clone()).or_insert(0) += 1;
        for ingredient in &recipe.ingredients {
            *self
                .ingredient_usage
                .entry(ingredient.normalized_name())
                .or_insert(0) += 1;
        }
        self.assignments[index] = Some(recipe);
    }

    pub fn unassign(&mut self, index: usize) -> Option<Recipe> {
        let recipe = self.assignments[index].take()?;
        if let Some(count) = self.recipe_usage.get_mut(&recipe.id) {
            *count -= 1;
            if *count == 0 {
                self.recipe_usage.remove(&recipe.id);
            }
        }
        for ingredient in &recipe.ingredients {
            let name = ingredient.normalized_name();
            if let Some(count) = self.ingredient_usage.get_mut(&name) {
                *count -= 1;
                if *count == 0 {
                    self.ingredient_usage.remove(&name);
                }
            }
        }
        Some(recipe)
    }
}

/// Lifecycle of one search run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Unstarted,
    InProgress,
    Complete,
    Failed,
}

/// Greedy-with-backtrack assignment of recipes to slots
///
/// Slots are processed in fixed chronological order. Each slot takes the
/// top-ranked feasible candidate; a slot with no feasible candidate undoes
/// the previous assignment, bans that recipe for the retried slot, and tries
/// again. The backtrack budget bounds total undo steps, trading completeness
/// for predictable latency. Identical inputs produce identical plans.
#[derive(Debug)]
pub struct PlanSearchEngine {
    config: SearchConfig,
    state: SearchState,
}

impl PlanSearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        PlanSearchEngine {
            config,
            state: SearchState::Unstarted,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Run the search over a fixed candidate pool
    ///
    /// The pool is sorted by recipe id up front so ranking ties resolve the
    /// same way on every run with the same catalog snapshot.
    pub fn run(
        &mut self,
        pool: Vec<Recipe>,
        constraints: &ValidatedConstraints,
    ) -> Result<MealPlan, PlanningError> {
        let slot_count = constraints.slot_count();
        let budget = self.config.backtrack_budget.unwrap_or(slot_count);

        let mut pool = pool;
        pool.sort_by(|a, b| a.id.cmp(&b.id));

        self.state = SearchState::InProgress;

        let mut partial = PartialPlan::new(slot_count);
        let mut banned: Vec<HashSet<String>> = vec![HashSet::new(); slot_count];
        let mut backtracks = 0usize;
        let mut index = 0usize;

        while index < slot_count {
            match self.pick_candidate(&partial, index, &pool, &banned[index], constraints) {
                Some((recipe, score)) => {
                    debug!(
                        slot = index,
                        recipe_id = %recipe.id,
                        score,
                        "assigned candidate to slot"
                    );
                    partial.assign(index, recipe);
                    index += 1;
                }
                None => {
                    if index == 0 {
                        self.state = SearchState::Failed;
                        return Err(PlanningError::Exhausted {
                            unassigned_slots: slot_count,
                        });
                    }
                    backtracks += 1;
                    if backtracks > budget {
                        self.state = SearchState::Failed;
                        return Err(PlanningError::Exhausted {
                            unassigned_slots: slot_count - index,
                        });
                    }
                    // Deeper exclusions are stale once this slot changes
                    banned[index].clear();
                    index -= 1;
                    if let Some(undone) = partial.unassign(index) {
                        debug!(
                            slot = index,
                            recipe_id = %undone.id,
                            backtracks,
                            "backtracked; excluding recipe for retried slot"
                        );
                        banned[index].insert(undone.id);
                    }
                }
            }
        }

        let assignments: Vec<MealAssignment> = constraints
            .slots()
            .iter()
            .enumerate()
            .map(|(i, c)| MealAssignment {
                slot: c.slot,
                recipe: partial
                    .unassign(i)
                    .unwrap_or_else(|| unreachable!("slot {} left unassigned", i)),
            })
            .collect();

        self.state = SearchState::Complete;
        info!(
            slots = slot_count,
            backtracks,
            distinct = %assignments
                .iter()
                .map(|a| a.recipe.id.as_str())
                .collect::<HashSet<_>>()
                .len(),
            "plan generation complete"
        );

        Ok(MealPlan::new(assignments))
    }

    /// Rank the surviving candidates for one slot and return the best
    ///
    /// Ties within epsilon prefer the recipe with the lower usage count in
    /// the plan so far, then the lexicographically smaller id (guaranteed by
    /// iterating the id-sorted pool).
    fn pick_candidate<'a>(
        &self,
        partial: &PartialPlan,
        index: usize,
        pool: &'a [Recipe],
        banned: &HashSet<String>,
        constraints: &ValidatedConstraints,
    ) -> Option<(Recipe, f64)> {
        let constraint = &constraints.slots()[index];
        let mut best: Option<(&'a Recipe, f64)> = None;

        for candidate in pool {
            if banned.contains(&candidate.id) {
                continue;
            }
            let CandidateScore::Scored(score) = score_candidate(
                partial,
                index,
                constraint,
                candidate,
                constraints,
                &self.config.weights,
                self.config.nutrient_tolerance,
            ) else {
                continue;
            };

            best = match best {
                None => Some((candidate, score)),
                Some((leader, leader_score)) => {
                    if score > leader_score + SCORE_EPSILON {
                        Some((candidate, score))
                    } else if (score - leader_score).abs() <= SCORE_EPSILON
                        && partial.usage_count(&candidate.id) < partial.usage_count(&leader.id)
                    {
                        Some((candidate, score))
                    } else {
                        Some((leader, leader_score))
                    }
                }
            };
        }

        best.map(|(recipe, score)| (recipe.clone(), score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{ConstraintModel, MealSlot, NutrientRange, SlotConstraint};
    use chrono::NaiveDate;
    use recipe::{Ingredient, MealType, Nutrients};

    fn recipe(id: &str, calories: f64, ingredients: &[&str]) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: format!("Recipe {}", id),
            ingredients: ingredients
                .iter()
                .map(|n| Ingredient::new(*n, 1.0, "item"))
                .collect(),
            nutrients: Nutrients::new(calories, 25.0, 15.0, 50.0),
            tags: Default::default(),
            prep_time_min: 30,
        }
    }

    fn dinner_slots(count: u32) -> Vec<SlotConstraint> {
        (1..=count)
            .map(|day| {
                SlotConstraint::new(
                    MealSlot::new(
                        NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
                        MealType::Dinner,
                    ),
                    NutrientRange::new(500.0, 700.0),
                )
            })
            .collect()
    }

    #[test]
    fn test_partial_plan_assign_unassign_round_trip() {
        let mut partial = PartialPlan::new(2);
        let r = recipe("a", 600.0, &["rice", "beans"]);

        partial.assign(0, r.clone());
        assert_eq!(partial.usage_count("a"), 1);
        assert_eq!(partial.distinct_count(), 1);
        assert!(partial.uses_ingredient("rice"));

        let undone = partial.unassign(0).unwrap();
        assert_eq!(undone.id, "a");
        assert_eq!(partial.usage_count("a"), 0);
        assert_eq!(partial.distinct_count(), 0);
        assert!(!partial.uses_ingredient("rice"));
    }

    #[test]
    fn test_partial_plan_shared_ingredients_survive_single_unassign() {
        let mut partial = PartialPlan::new(2);
        partial.assign(0, recipe("a", 600.0, &["rice"]));
        partial.assign(1, recipe("b", 600.0, &["rice", "tofu"]));

        partial.unassign(1);
        assert!(partial.uses_ingredient("rice"));
        assert!(!partial.uses_ingredient("tofu"));
    }

    #[test]
    fn test_engine_state_transitions() {
        let constraints = ConstraintModel::new(dinner_slots(2)).validate().unwrap();
        let mut engine = PlanSearchEngine::new(SearchConfig::default());
        assert_eq!(engine.state(), SearchState::Unstarted);

        let pool = vec![recipe("a", 600.0, &["rice"]), recipe("b", 650.0, &["tofu"])];
        engine.run(pool, &constraints).unwrap();
        assert_eq!(engine.state(), SearchState::Complete);
    }

    #[test]
    fn test_empty_catalog_is_exhausted() {
        let constraints = ConstraintModel::new(dinner_slots(2)).validate().unwrap();
        let mut engine = PlanSearchEngine::new(SearchConfig::default());

        let err = engine.run(vec![], &constraints).unwrap_err();
        assert!(matches!(
            err,
            PlanningError::Exhausted { unassigned_slots: 2 }
        ));
        assert_eq!(engine.state(), SearchState::Failed);
    }

    #[test]
    fn test_backtrack_recovers_from_dead_end() {
        // Window 2 over 3 slots. Greedy fills slots 0-1 with "a" then "b",
        // leaving slot 2 (which only "a" or "b" can satisfy) with nothing:
        // the engine must undo slot 1 and park "c" there instead.
        let mut slots = dinner_slots(3);
        slots[2].calories = NutrientRange::new(590.0, 630.0);
        let constraints = ConstraintModel::new(slots)
            .with_repeat_window(2)
            .validate()
            .unwrap();

        let pool = vec![
            recipe("a", 600.0, &["rice"]),
            recipe("b", 610.0, &["tofu"]),
            recipe("c", 450.0, &["kale"]),
        ];
        let mut engine = PlanSearchEngine::new(SearchConfig::default());
        let plan = engine.run(pool, &constraints).unwrap();

        let ids: Vec<&str> = plan
            .assignments
            .iter()
            .map(|a| a.recipe.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
        assert_eq!(engine.state(), SearchState::Complete);
    }

    #[test]
    fn test_determinism_identical_inputs_identical_plans() {
        let constraints = ConstraintModel::new(dinner_slots(5))
            .with_repeat_window(2)
            .validate()
            .unwrap();
        let pool: Vec<Recipe> = [
            ("d", 640.0),
            ("a", 600.0),
            ("c", 550.0),
            ("b", 650.0),
            ("e", 700.0),
        ]
        .iter()
        .map(|(id, kcal)| recipe(id, *kcal, &[*id]))
        .collect();

        let first = PlanSearchEngine::new(SearchConfig::default())
            .run(pool.clone(), &constraints)
            .unwrap();
        let second = PlanSearchEngine::new(SearchConfig::default())
            .run(pool, &constraints)
            .unwrap();

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_tie_break_prefers_lower_usage_then_id() {
        // Two identical recipes: slot 0 takes "a" (id order), slot 1 must
        // take "b" because "a" now has a higher usage count.
        let constraints = ConstraintModel::new(dinner_slots(2)).validate().unwrap();
        let pool = vec![recipe("b", 600.0, &["x"]), recipe("a", 600.0, &["x"])];

        let plan = PlanSearchEngine::new(SearchConfig::default())
            .run(pool, &constraints)
            .unwrap();
        assert_eq!(plan.assignments[0].recipe.id, "a");
        assert_eq!(plan.assignments[1].recipe.id, "b");
    }

    #[test]
    fn test_repeat_window_invariant_holds() {
        let constraints = ConstraintModel::new(dinner_slots(6))
            .with_repeat_window(2)
            .validate()
            .unwrap();
        let pool = vec![
            recipe("a", 600.0, &["rice"]),
            recipe("b", 620.0, &["tofu"]),
            recipe("c", 580.0, &["kale"]),
        ];

        let plan = PlanSearchEngine::new(SearchConfig::default())
            .run(pool, &constraints)
            .unwrap();

        for window in plan.assignments.windows(3) {
            let ids: HashSet<&str> = window.iter().map(|a| a.recipe.id.as_str()).collect();
            assert_eq!(ids.len(), 3, "repeat inside window of 2");
        }
    }

    #[test]
    fn test_backtrack_budget_exhaustion_reports_unassigned() {
        // One recipe, window 1, two slots: slot 1 can never be filled
        let constraints = ConstraintModel::new(dinner_slots(2))
            .with_repeat_window(1)
            .validate()
            .unwrap();
        let pool = vec![recipe("a", 600.0, &["rice"])];

        let mut engine = PlanSearchEngine::new(SearchConfig {
            backtrack_budget: Some(0),
            ..Default::default()
        });
        let err = engine.run(pool, &constraints).unwrap_err();
        assert!(matches!(
            err,
            PlanningError::Exhausted { unassigned_slots: 1 }
        ));
        assert_eq!(engine.state(), SearchState::Failed);
    }

    #[test]
    fn test_unsatisfiable_first_slot_fails_with_all_slots_unassigned() {
        // With a full backtrack budget the same setup walks back to slot 0,
        // bans its only recipe, and reports the whole plan unassignable.
        let constraints = ConstraintModel::new(dinner_slots(2))
            .with_repeat_window(1)
            .validate()
            .unwrap();
        let pool = vec![recipe("a", 600.0, &["rice"])];

        let mut engine = PlanSearchEngine::new(SearchConfig::default());
        let err = engine.run(pool, &constraints).unwrap_err();
        assert!(matches!(
            err,
            PlanningError::Exhausted { unassigned_slots: 2 }
        ));
    }

    #[test]
    fn test_three_slot_scenario_distinct_assignment() {
        // Catalog of three recipes in [500, 700], repeat window 1: the plan
        // must use three recipes with no immediate repeats.
        let constraints = ConstraintModel::new(dinner_slots(3))
            .with_repeat_window(1)
            .validate()
            .unwrap();
        let pool = vec![
            recipe("recipe_a", 600.0, &["eggs"]),
            recipe("recipe_b", 650.0, &["beef"]),
            recipe("recipe_c", 550.0, &["tofu"]),
        ];

        let plan = PlanSearchEngine::new(SearchConfig::default())
            .run(pool, &constraints)
            .unwrap();

        assert_eq!(plan.slot_count(), 3);
        for pair in plan.assignments.windows(2) {
            assert_ne!(pair[0].recipe.id, pair[1].recipe.id);
        }
    }
}
