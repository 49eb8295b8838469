use chrono::NaiveDate;
use meal_planning::{MealAssignment, MealPlan, MealSlot};
use recipe::{MealType, Recipe};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    #[error("Stored plan {plan_id} is corrupt: {detail}")]
    CorruptPlan { plan_id: String, detail: String },
}

/// Identifier assigned to a plan when it is first stored
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(String);

impl PlanId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PlanId {
    fn from(id: String) -> Self {
        PlanId(id)
    }
}

/// Assignment row shape for queries
#[derive(Debug, Clone, sqlx::FromRow)]
struct AssignmentRow {
    date: String,
    meal_type: String,
    recipe_json: String,
}

/// Persistence gateway for finalized meal plans
///
/// Stores each plan as one `meal_plans` row plus one `meal_assignments` row
/// per slot, with the assigned recipe denormalized as a JSON snapshot so a
/// load round-trips the full plan without touching the catalog.
#[derive(Debug, Clone)]
pub struct PlanStore {
    pool: SqlitePool,
}

impl PlanStore {
    pub fn new(pool: SqlitePool) -> Self {
        PlanStore { pool }
    }

    /// Bootstrap the plan tables
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS meal_plans (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                slot_count INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS meal_assignments (
                id TEXT PRIMARY KEY,
                meal_plan_id TEXT NOT NULL REFERENCES meal_plans(id),
                position INTEGER NOT NULL,
                date TEXT NOT NULL,
                meal_type TEXT NOT NULL,
                recipe_id TEXT NOT NULL,
                recipe_json TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a finalized plan atomically
    ///
    /// The plan row and every assignment row commit in a single transaction:
    /// readers never observe a partially written plan.
    pub async fn save_plan(&self, plan: &MealPlan) -> Result<PlanId, StorageError> {
        let plan_id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO meal_plans (id, status, slot_count, created_at)
            VALUES (?1, 'complete', ?2, ?3)
            "#,
        )
        .bind(&plan_id)
        .bind(plan.slot_count() as i64)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;

        for (position, assignment) in plan.assignments.iter().enumerate() {
            let recipe_json =
                serde_json::to_string(&assignment.recipe).map_err(|e| StorageError::CorruptPlan {
                    plan_id: plan_id.clone(),
                    detail: format!("recipe snapshot encoding failed: {}", e),
                })?;

            sqlx::query(
                r#"
                INSERT INTO meal_assignments
                    (id, meal_plan_id, position, date, meal_type, recipe_id, recipe_json)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&plan_id)
            .bind(position as i64)
            .bind(assignment.slot.date.to_string())
            .bind(assignment.slot.meal_type.as_str())
            .bind(&assignment.recipe.id)
            .bind(recipe_json)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(plan_id = %plan_id, slots = plan.slot_count(), "meal plan stored");
        Ok(PlanId(plan_id))
    }

    /// Load a stored plan, reconstructing assignments from recipe snapshots
    pub async fn load_plan(&self, id: &PlanId) -> Result<MealPlan, StorageError> {
        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM meal_plans WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(StorageError::PlanNotFound(id.to_string()));
        }

        let rows: Vec<AssignmentRow> = sqlx::query_as(
            r#"
            SELECT date, meal_type, recipe_json
            FROM meal_assignments
            WHERE meal_plan_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut assignments = Vec::with_capacity(rows.len());
        for row in rows {
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|e| {
                StorageError::CorruptPlan {
                    plan_id: id.to_string(),
                    detail: format!("bad assignment date '{}': {}", row.date, e),
                }
            })?;
            let meal_type =
                MealType::parse(&row.meal_type).ok_or_else(|| StorageError::CorruptPlan {
                    plan_id: id.to_string(),
                    detail: format!("unknown meal type '{}'", row.meal_type),
                })?;
            let recipe: Recipe =
                serde_json::from_str(&row.recipe_json).map_err(|e| StorageError::CorruptPlan {
                    plan_id: id.to_string(),
                    detail: format!("recipe snapshot decoding failed: {}", e),
                })?;

            assignments.push(MealAssignment {
                slot: MealSlot::new(date, meal_type),
                recipe,
            });
        }

        Ok(MealPlan::new(assignments))
    }
}
