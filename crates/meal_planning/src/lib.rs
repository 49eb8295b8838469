pub mod constraints;
pub mod error;
pub mod plan;
pub mod scoring;
pub mod search;

pub use constraints::{
    ConstraintModel, MealSlot, NutrientRange, SlotConstraint, ValidatedConstraints,
};
pub use error::{InvalidConstraint, PlanningError};
pub use plan::{MealAssignment, MealPlan};
pub use scoring::{score_candidate, CandidateScore, RejectReason, ScoreWeights};
pub use search::{PartialPlan, PlanSearchEngine, SearchConfig, SearchState};

use recipe::{RecipeCatalog, RecipeFilter};
use tracing::debug;

/// Generate a meal plan from a catalog and a planning request
///
/// Loads the candidate pool once at request start (catalog exclusions are
/// pushed down as a pre-filter), validates the constraint model, and runs the
/// search to completion. Each call is self-contained: no state is shared
/// between requests, and a failed or abandoned request leaves nothing behind.
pub async fn generate_plan<C: RecipeCatalog + ?Sized>(
    catalog: &C,
    model: ConstraintModel,
    config: SearchConfig,
) -> Result<MealPlan, PlanningError> {
    let constraints = model.validate()?;

    let filter = RecipeFilter {
        excluded_tags: constraints.excluded_tags().clone(),
        excluded_ingredients: constraints.excluded_ingredients().clone(),
        max_prep_time_min: None,
    };
    let pool = catalog.list_recipes(&filter).await?;
    debug!(
        candidates = pool.len(),
        slots = constraints.slot_count(),
        "loaded candidate pool"
    );

    PlanSearchEngine::new(config).run(pool, &constraints)
}
