use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Single ingredient line of a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Ingredient {
            name: name.into(),
            quantity,
            unit: unit.into(),
        }
    }

    /// Normalized name used for grouping and exclusion checks (lowercase, trimmed)
    pub fn normalized_name(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

/// Per-serving nutrient vector for a recipe
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Nutrients {
    pub calories: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
}

/// Nutrient fields in a fixed order, shared by targets and scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NutrientField {
    Calories,
    Protein,
    Fat,
    Carbs,
}

impl NutrientField {
    pub const ALL: [NutrientField; 4] = [
        NutrientField::Calories,
        NutrientField::Protein,
        NutrientField::Fat,
        NutrientField::Carbs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientField::Calories => "calories",
            NutrientField::Protein => "protein_g",
            NutrientField::Fat => "fat_g",
            NutrientField::Carbs => "carbs_g",
        }
    }
}

impl Nutrients {
    pub fn new(calories: f64, protein_g: f64, fat_g: f64, carbs_g: f64) -> Self {
        Nutrients {
            calories,
            protein_g,
            fat_g,
            carbs_g,
        }
    }

    pub fn get(&self, field: NutrientField) -> f64 {
        match field {
            NutrientField::Calories => self.calories,
            NutrientField::Protein => self.protein_g,
            NutrientField::Fat => self.fat_g,
            NutrientField::Carbs => self.carbs_g,
        }
    }
}

/// Recipe record as read from the catalog
///
/// Immutable for the duration of a planning run: the search engine loads the
/// candidate pool once at request start and never re-queries mid-search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub nutrients: Nutrients,
    pub tags: BTreeSet<String>,
    pub prep_time_min: u32,
}

impl Recipe {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Check whether any ingredient matches the given normalized name
    pub fn uses_ingredient(&self, normalized: &str) -> bool {
        self.ingredients
            .iter()
            .any(|i| i.normalized_name() == normalized)
    }
}

/// Meal type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" => Some(MealType::Dinner),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_ingredient_name() {
        let i = Ingredient::new("  Chicken Breast ", 2.0, "lbs");
        assert_eq!(i.normalized_name(), "chicken breast");
    }

    #[test]
    fn test_nutrient_field_accessor() {
        let n = Nutrients::new(600.0, 30.0, 20.0, 55.0);
        assert_eq!(n.get(NutrientField::Calories), 600.0);
        assert_eq!(n.get(NutrientField::Protein), 30.0);
        assert_eq!(n.get(NutrientField::Fat), 20.0);
        assert_eq!(n.get(NutrientField::Carbs), 55.0);
    }

    #[test]
    fn test_meal_type_round_trip() {
        for mt in [MealType::Breakfast, MealType::Lunch, MealType::Dinner] {
            assert_eq!(MealType::parse(mt.as_str()), Some(mt));
        }
        assert_eq!(MealType::parse("brunch"), None);
    }

    #[test]
    fn test_recipe_uses_ingredient() {
        let recipe = Recipe {
            id: "r1".to_string(),
            name: "Omelette".to_string(),
            ingredients: vec![
                Ingredient::new("Eggs", 3.0, "item"),
                Ingredient::new("Butter", 15.0, "g"),
            ],
            nutrients: Nutrients::new(350.0, 20.0, 28.0, 2.0),
            tags: BTreeSet::from(["vegetarian".to_string()]),
            prep_time_min: 10,
        };

        assert!(recipe.uses_ingredient("eggs"));
        assert!(!recipe.uses_ingredient("peanuts"));
        assert!(recipe.has_tag("vegetarian"));
    }
}
