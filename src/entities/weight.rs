// ⚖️ Weight Entry
// One body-weight reading, from the diet log or from a doctor visit.

use super::Entity;
use crate::db::Collection;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unit every weight is recorded in
pub const WEIGHT_UNIT: &str = "kg";

// ============================================================================
// MEAL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
    Other,
}

impl Meal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Dinner => "dinner",
            Meal::Other => "other",
        }
    }
}

// ============================================================================
// SOURCE
// ============================================================================

/// Which log a weight reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightSource {
    #[serde(rename = "diet log")]
    DietLog,

    #[serde(rename = "doctor visit")]
    DoctorVisit,
}

impl WeightSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightSource::DietLog => "diet log",
            WeightSource::DoctorVisit => "doctor visit",
        }
    }
}

// ============================================================================
// WEIGHT ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub entry_date: NaiveDate,
    pub meal: Meal,
    pub value: f64,
    pub unit: String,
    pub source: WeightSource,
    pub menu: Option<String>,
    pub symptoms: Option<String>,
    pub notes: Option<String>,
}

impl WeightEntry {
    /// Create an entry with the fixed kg unit and no free-text fields
    pub fn new(entry_date: NaiveDate, meal: Meal, value: f64, source: WeightSource) -> Self {
        WeightEntry {
            entry_date,
            meal,
            value,
            unit: WEIGHT_UNIT.to_string(),
            source,
            menu: None,
            symptoms: None,
            notes: None,
        }
    }

    pub fn with_menu(mut self, menu: Option<String>) -> Self {
        self.menu = menu;
        self
    }

    pub fn with_symptoms(mut self, symptoms: Option<String>) -> Self {
        self.symptoms = symptoms;
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}

impl Entity for WeightEntry {
    const COLLECTION: Collection = Collection::Weights;
}
