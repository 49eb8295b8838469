use crate::error::InvalidConstraint;
use chrono::NaiveDate;
use recipe::{MealType, NutrientField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Meal slot represents a specific meal on a specific date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MealSlot {
    pub date: NaiveDate,
    pub meal_type: MealType,
}

impl MealSlot {
    pub fn new(date: NaiveDate, meal_type: MealType) -> Self {
        MealSlot { date, meal_type }
    }
}

/// Inclusive target range for one nutrient field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientRange {
    pub min: f64,
    pub max: f64,
}

impl NutrientRange {
    pub fn new(min: f64, max: f64) -> Self {
        NutrientRange { min, max }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Per-slot targets: nutrient ranges plus optional required tags
///
/// Only calories are mandatory; the remaining nutrient fields are constrained
/// when a range is present and unconstrained otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotConstraint {
    pub slot: MealSlot,
    pub calories: NutrientRange,
    pub protein_g: Option<NutrientRange>,
    pub fat_g: Option<NutrientRange>,
    pub carbs_g: Option<NutrientRange>,
    pub required_tags: BTreeSet<String>,
}

impl SlotConstraint {
    pub fn new(slot: MealSlot, calories: NutrientRange) -> Self {
        SlotConstraint {
            slot,
            calories,
            protein_g: None,
            fat_g: None,
            carbs_g: None,
            required_tags: BTreeSet::new(),
        }
    }

    pub fn with_required_tag(mut self, tag: impl Into<String>) -> Self {
        self.required_tags.insert(tag.into());
        self
    }

    /// Target range for a nutrient field, if one is constrained
    pub fn range(&self, field: NutrientField) -> Option<NutrientRange> {
        match field {
            NutrientField::Calories => Some(self.calories),
            NutrientField::Protein => self.protein_g,
            NutrientField::Fat => self.fat_g,
            NutrientField::Carbs => self.carbs_g,
        }
    }
}

/// Declarative planning request: slot targets plus global variety rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintModel {
    pub slots: Vec<SlotConstraint>,
    /// Minimum number of slots separating two uses of the same recipe
    pub repeat_window: usize,
    /// Minimum count of distinct recipes across the whole plan
    pub min_distinct_recipes: usize,
    pub excluded_tags: BTreeSet<String>,
    pub excluded_ingredients: BTreeSet<String>,
}

impl ConstraintModel {
    pub fn new(slots: Vec<SlotConstraint>) -> Self {
        ConstraintModel {
            slots,
            repeat_window: 0,
            min_distinct_recipes: 0,
            excluded_tags: BTreeSet::new(),
            excluded_ingredients: BTreeSet::new(),
        }
    }

    /// Build a week of dated slots from a start date
    ///
    /// Produces `7 × meal_types.len()` slots in chronological order, each with
    /// the given calorie target. Slot ordering follows date then
    /// breakfast < lunch < dinner.
    pub fn week(start: NaiveDate, meal_types: &[MealType], calories: NutrientRange) -> Self {
        let mut slots = Vec::with_capacity(7 * meal_types.len());
        for day in 0..7 {
            let date = start + chrono::Duration::days(day);
            let mut types: Vec<MealType> = meal_types.to_vec();
            types.sort();
            for meal_type in types {
                slots.push(SlotConstraint::new(MealSlot::new(date, meal_type), calories));
            }
        }
        ConstraintModel::new(slots)
    }

    pub fn with_repeat_window(mut self, window: usize) -> Self {
        self.repeat_window = window;
        self
    }

    pub fn with_min_distinct_recipes(mut self, minimum: usize) -> Self {
        self.min_distinct_recipes = minimum;
        self
    }

    pub fn with_excluded_tag(mut self, tag: impl Into<String>) -> Self {
        self.excluded_tags.insert(tag.into());
        self
    }

    pub fn with_excluded_ingredient(mut self, name: impl Into<String>) -> Self {
        self.excluded_ingredients
            .insert(name.into().trim().to_lowercase());
        self
    }

    /// Validate the request into its normalized immutable form
    ///
    /// Slots are sorted chronologically; exclusion names are normalized to
    /// lowercase. Fails fast on the first malformed rule.
    pub fn validate(mut self) -> Result<ValidatedConstraints, InvalidConstraint> {
        if self.slots.is_empty() {
            return Err(InvalidConstraint::EmptyPlan);
        }

        self.slots.sort_by_key(|c| c.slot);

        for (index, constraint) in self.slots.iter().enumerate() {
            for field in NutrientField::ALL {
                let Some(range) = constraint.range(field) else {
                    continue;
                };
                if range.min < 0.0 || range.max < 0.0 {
                    return Err(InvalidConstraint::NegativeRange {
                        slot: index,
                        field: field.as_str(),
                    });
                }
                if range.min > range.max {
                    return Err(InvalidConstraint::InvertedRange {
                        slot: index,
                        field: field.as_str(),
                        min: range.min,
                        max: range.max,
                    });
                }
            }
        }

        if self.repeat_window > self.slots.len() {
            return Err(InvalidConstraint::RepeatWindowTooLarge {
                window: self.repeat_window,
                slots: self.slots.len(),
            });
        }

        if self.min_distinct_recipes > self.slots.len() {
            return Err(InvalidConstraint::DistinctCountTooLarge {
                minimum: self.min_distinct_recipes,
                slots: self.slots.len(),
            });
        }

        let excluded_ingredients = self
            .excluded_ingredients
            .iter()
            .map(|n| n.trim().to_lowercase())
            .collect();

        Ok(ValidatedConstraints {
            slots: self.slots,
            repeat_window: self.repeat_window,
            min_distinct_recipes: self.min_distinct_recipes,
            excluded_tags: self.excluded_tags,
            excluded_ingredients,
        })
    }
}

/// Normalized constraint set consumed by the search engine
///
/// Construction goes through `ConstraintModel::validate`; fields are
/// read-only from here on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedConstraints {
    slots: Vec<SlotConstraint>,
    repeat_window: usize,
    min_distinct_recipes: usize,
    excluded_tags: BTreeSet<String>,
    excluded_ingredients: BTreeSet<String>,
}

impl ValidatedConstraints {
    pub fn slots(&self) -> &[SlotConstraint] {
        &self.slots
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn repeat_window(&self) -> usize {
        self.repeat_window
    }

    pub fn min_distinct_recipes(&self) -> usize {
        self.min_distinct_recipes
    }

    pub fn excluded_tags(&self) -> &BTreeSet<String> {
        &self.excluded_tags
    }

    pub fn excluded_ingredients(&self) -> &BTreeSet<String> {
        &self.excluded_ingredients
    }
}
