// 🏷️ Classification Rules - Rules as Data
// Keyword tables mapping free text to closed categories.

use crate::entities::{LabCategory, Meal, MedicationStatus};

// ============================================================================
// KEYWORD RULES
// ============================================================================

/// Ordered keyword table. The first keyword found in the text wins.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRules<T: Copy + 'static> {
    rules: &'static [(&'static str, T)],
}

impl<T: Copy + 'static> KeywordRules<T> {
    pub const fn new(rules: &'static [(&'static str, T)]) -> Self {
        KeywordRules { rules }
    }

    /// Case-insensitive substring match, in table order
    pub fn classify(&self, text: &str) -> Option<T> {
        let text_lower = text.to_lowercase();
        self.rules
            .iter()
            .find(|(keyword, _)| text_lower.contains(keyword))
            .map(|(_, category)| *category)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Priority order matters: "dinner leftovers for breakfast" is breakfast
pub const MEAL_RULES: KeywordRules<Meal> = KeywordRules::new(&[
    ("breakfast", Meal::Breakfast),
    ("lunch", Meal::Lunch),
    ("dinner", Meal::Dinner),
]);

/// Test names that are imaging or scope procedures rather than lab panels
pub const PROCEDURE_RULES: KeywordRules<LabCategory> = KeywordRules::new(&[
    ("mri", LabCategory::Procedure),
    ("endoscopy", LabCategory::Procedure),
    ("colonoscopy", LabCategory::Procedure),
]);

// ============================================================================
// CLASSIFIERS
// ============================================================================

/// Meal column → meal type; empty or unrecognized → other
pub fn classify_meal(raw: &str) -> Meal {
    MEAL_RULES.classify(raw.trim()).unwrap_or(Meal::Other)
}

/// Test name → procedure or lab
pub fn classify_test(name: &str) -> LabCategory {
    PROCEDURE_RULES.classify(name).unwrap_or(LabCategory::Lab)
}

/// Visit "Completed" column: yes → true, no → false, anything else → unknown
pub fn parse_completed(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}

/// A completed course means the medication was stopped
pub fn medication_status(completed: Option<bool>) -> MedicationStatus {
    match completed {
        Some(true) => MedicationStatus::Stopped,
        _ => MedicationStatus::Active,
    }
}

// ============================================================================
// TESTS
// ============================================================================
