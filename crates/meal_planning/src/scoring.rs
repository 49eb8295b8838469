use crate::constraints::{SlotConstraint, ValidatedConstraints};
use crate::search::PartialPlan;
use recipe::{NutrientField, Recipe};
use serde::{Deserialize, Serialize};

/// Weights for the soft scoring terms, overridable per request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight of the nutrient-deviation penalty
    pub nutrient_weight: f64,
    /// Weight of the ingredient-variety bonus
    pub variety_weight: f64,
    /// Weight of the prep-cost penalty, lowest by default
    pub cost_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            nutrient_weight: 1.0,
            variety_weight: 0.5,
            cost_weight: 0.25,
        }
    }
}

/// Why a candidate was hard-rejected for a slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    ExcludedTag(String),
    ExcludedIngredient(String),
    MissingRequiredTag(String),
    /// Recipe already assigned within the repeat window before this slot
    WithinRepeatWindow,
    /// A repeat here would make the minimum distinct-recipe count unreachable
    DistinctShortfall,
    /// A nutrient value has zero overlap with the slot's tolerance band
    NutrientOutOfTolerance(&'static str),
}

/// Outcome of scoring one (slot, recipe) pairing
///
/// Infeasibility is an expected, frequent outcome during search, so it is a
/// tagged result rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateScore {
    Rejected(RejectReason),
    Scored(f64),
}

/// Score a candidate recipe for a slot against the running plan state
///
/// Pure function of its inputs: hard constraints reject outright, the rest
/// combine into a scalar where higher is better. `tolerance` widens each
/// nutrient target range by `tolerance × width` on each side; values inside
/// the widened band are penalized by distance from the range midpoint,
/// values outside any band are rejected.
pub fn score_candidate(
    partial: &PartialPlan,
    slot_index: usize,
    constraint: &SlotConstraint,
    candidate: &Recipe,
    constraints: &ValidatedConstraints,
    weights: &ScoreWeights,
    tolerance: f64,
) -> CandidateScore {
    if let Some(tag) = candidate
        .tags
        .iter()
        .find(|t| constraints.excluded_tags().contains(*t))
    {
        return CandidateScore::Rejected(RejectReason::ExcludedTag(tag.clone()));
    }

    if let Some(name) = constraints
        .excluded_ingredients()
        .iter()
        .find(|n| candidate.uses_ingredient(n))
    {
        return CandidateScore::Rejected(RejectReason::ExcludedIngredient(name.clone()));
    }

    if let Some(tag) = constraint
        .required_tags
        .iter()
        .find(|t| !candidate.has_tag(t))
    {
        return CandidateScore::Rejected(RejectReason::MissingRequiredTag(tag.clone()));
    }

    let window = constraints.repeat_window();
    let window_start = slot_index.saturating_sub(window);
    for index in window_start..slot_index {
        if let Some(assigned) = partial.recipe_at(index) {
            if assigned.id == candidate.id {
                return CandidateScore::Rejected(RejectReason::WithinRepeatWindow);
            }
        }
    }

    // A repeat is only acceptable while enough open slots remain to still
    // reach the minimum distinct-recipe count.
    if partial.usage_count(&candidate.id) > 0 {
        let slots_after_this = constraints.slot_count() - slot_index - 1;
        if partial.distinct_count() + slots_after_this < constraints.min_distinct_recipes() {
            return CandidateScore::Rejected(RejectReason::DistinctShortfall);
        }
    }

    let mut deviation_sum = 0.0;
    let mut constrained_fields = 0usize;
    for field in NutrientField::ALL {
        let Some(range) = constraint.range(field) else {
            continue;
        };
        constrained_fields += 1;

        // Degenerate point ranges take their spread from the midpoint so the
        // band never collapses to a single value.
        let spread = if range.width() > 0.0 {
            tolerance * range.width()
        } else {
            tolerance * range.midpoint().max(1.0)
        };

        let value = candidate.nutrients.get(field);
        if value < range.min - spread || value > range.max + spread {
            return CandidateScore::Rejected(RejectReason::NutrientOutOfTolerance(field.as_str()));
        }

        let half_band = range.width() / 2.0 + spread;
        deviation_sum += (value - range.midpoint()).abs() / half_band;
    }

    let nutrient_penalty = if constrained_fields > 0 {
        deviation_sum / constrained_fields as f64
    } else {
        0.0
    };

    let variety_bonus = ingredient_novelty(partial, candidate);
    let cost_penalty = f64::from(candidate.prep_time_min) / 60.0;

    let score = weights.variety_weight * variety_bonus
        - weights.nutrient_weight * nutrient_penalty
        - weights.cost_weight * cost_penalty;

    CandidateScore::Scored(score)
}

/// Share of the candidate's ingredients not yet used anywhere in the plan
fn ingredient_novelty(partial: &PartialPlan, candidate: &Recipe) -> f64 {
    if candidate.ingredients.is_empty() {
        return 0.0;
    }
    let fresh = candidate
        .ingredients
        .iter()
        .filter(|i| !partial.uses_ingredient(&i.normalized_name()))
        .count();
    fresh as f64 / candidate.ingredients.len() as f64
}
