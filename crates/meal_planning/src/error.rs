use thiserror::Error;

/// Constraint validation failures, detected before search starts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidConstraint {
    #[error("Planning request has zero meal slots")]
    EmptyPlan,

    #[error("Nutrient range for {field} in slot {slot} has min {min} > max {max}")]
    InvertedRange {
        slot: usize,
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("Nutrient range for {field} in slot {slot} has a negative bound")]
    NegativeRange { slot: usize, field: &'static str },

    #[error("Repeat window {window} exceeds slot count {slots}")]
    RepeatWindowTooLarge { window: usize, slots: usize },

    #[error("Minimum distinct recipe count {minimum} exceeds slot count {slots}")]
    DistinctCountTooLarge { minimum: usize, slots: usize },
}

#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("Invalid planning request: {0}")]
    InvalidConstraint(#[from] InvalidConstraint),

    #[error("Plan generation exhausted backtrack budget with {unassigned_slots} slots unassigned")]
    Exhausted { unassigned_slots: usize },

    #[error("Recipe catalog error: {0}")]
    Catalog(#[from] recipe::CatalogError),
}
