// 🧪 Lab Result Extractor
// Turns a free-text "Test Result" cell into one or more LabTestResult records.
//
// Matchers are tried in priority order, first one that produces records wins:
//   1. LabeledPairs  "Hb: 13.5 g/dL, WBC: 7200 /uL"  → one record per pair
//   2. SingleValue   "95 mg/dL"                        → one record, row test name
//   3. TextFallback  "Normal study"                    → one text-only record

use crate::entities::LabTestResult;
use crate::rules::classify_test;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// "<label>: <number> <unit up to the next comma>"
static PAIR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<name>[A-Za-z][A-Za-z0-9\s()/-]*):\s*(?P<value>\d+(?:\.\d+)?)\s*(?P<unit>[^,\d.][^,]*)")
        .expect("Invalid lab pair regex")
});

/// "<number><unit letters>"
static VALUE_UNIT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<value>\d+(?:\.\d+)?)\s*(?P<unit>[A-Za-z/%]+)").expect("Invalid value/unit regex")
});

// ============================================================================
// ROW CONTEXT
// ============================================================================

/// Fields every record from one test row inherits
#[derive(Debug, Clone, PartialEq)]
pub struct LabRowContext {
    pub entry_date: NaiveDate,
    /// The row's stated test name, used when no label is parsed from the result
    pub test_name: String,
    pub lab_name: Option<String>,
    pub reference_notes: Option<String>,
    pub notes: Option<String>,
}

impl LabRowContext {
    fn measured(&self, test_name: &str, value: f64, unit: &str) -> LabTestResult {
        LabTestResult::measured(
            self.entry_date,
            test_name.to_string(),
            value,
            unit.to_string(),
            classify_test(test_name),
        )
        .with_lab_name(self.lab_name.clone())
        .with_reference_notes(self.reference_notes.clone())
        .with_notes(self.notes.clone())
    }

    fn textual(&self, text: &str) -> LabTestResult {
        LabTestResult::textual(
            self.entry_date,
            self.test_name.clone(),
            text.to_string(),
            classify_test(&self.test_name),
        )
        .with_lab_name(self.lab_name.clone())
        .with_reference_notes(self.reference_notes.clone())
        .with_notes(self.notes.clone())
    }
}

/// "Problematic: <flag>. " prefix plus the interpretation; empty → None
pub fn compose_reference_notes(problematic: &str, interpretation: &str) -> Option<String> {
    let problematic = problematic.trim();
    let prefix = if problematic.is_empty() {
        String::new()
    } else {
        format!("Problematic: {}. ", problematic)
    };
    let composed = format!("{}{}", prefix, interpretation.trim());
    let composed = composed.trim();
    if composed.is_empty() {
        None
    } else {
        Some(composed.to_string())
    }
}

// ============================================================================
// MATCHERS
// ============================================================================

/// One strategy for reading a result string
pub trait ResultMatcher: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Records for this result, or None when the strategy does not apply
    fn extract(&self, result: &str, ctx: &LabRowContext) -> Option<Vec<LabTestResult>>;
}

/// Every "label: value unit" pair in the string
pub struct LabeledPairs;

impl ResultMatcher for LabeledPairs {
    fn name(&self) -> &'static str {
        "labeled_pairs"
    }

    fn extract(&self, result: &str, ctx: &LabRowContext) -> Option<Vec<LabTestResult>> {
        let records: Vec<LabTestResult> = PAIR_REGEX
            .captures_iter(result)
            .filter_map(|caps| {
                let label = caps["name"].trim();
                let unit = caps["unit"].trim();
                let value = caps["value"].parse::<f64>().ok()?;
                if label.is_empty() || unit.is_empty() {
                    return None;
                }
                Some(ctx.measured(label, value, unit))
            })
            .collect();

        if records.is_empty() {
            None
        } else {
            Some(records)
        }
    }
}

/// First "<number><unit>" occurrence, attributed to the row's test name
pub struct SingleValue;

impl ResultMatcher for SingleValue {
    fn name(&self) -> &'static str {
        "single_value"
    }

    fn extract(&self, result: &str, ctx: &LabRowContext) -> Option<Vec<LabTestResult>> {
        let caps = VALUE_UNIT_REGEX.captures(result)?;
        let value = caps["value"].parse::<f64>().ok()?;
        Some(vec![ctx.measured(&ctx.test_name, value, caps["unit"].trim())])
    }
}

/// Keep the raw text. Always applies.
pub struct TextFallback;

impl ResultMatcher for TextFallback {
    fn name(&self) -> &'static str {
        "text_fallback"
    }

    fn extract(&self, result: &str, ctx: &LabRowContext) -> Option<Vec<LabTestResult>> {
        Some(vec![ctx.textual(result.trim())])
    }
}

/// Priority order, most specific first
pub static MATCHERS: &[&dyn ResultMatcher] = &[&LabeledPairs, &SingleValue, &TextFallback];

/// Run the matchers in order and return the first non-empty result
///
/// Always returns at least one record.
pub fn extract_lab_results(result: &str, ctx: &LabRowContext) -> Vec<LabTestResult> {
    for matcher in MATCHERS {
        if let Some(records) = matcher.extract(result, ctx) {
            tracing::trace!(matcher = matcher.name(), count = records.len(), "lab result matched");
            return records;
        }
    }
    vec![ctx.textual(result.trim())]
}

// ============================================================================
// TESTS
// ============================================================================
