// 🏗️ Parser Framework
// One row parser per source export. Each turns a RawRow into zero or more
// normalized entities and never fails on bad data: rows missing a required
// field are dropped and counted, partial parses degrade to fallback records.

use crate::dates::parse_date;
use crate::entities::{
    Diagnosis, DoctorVisit, LabTestResult, Meal, MedicationEntry, MedicationStatus, WeightEntry,
    WeightSource, DEFAULT_DIAGNOSIS_NAME, WEIGHT_UNIT,
};
use crate::extract::{
    compose_reference_notes, extract_lab_results, parse_medication, split_prescriptions,
    LabRowContext,
};
use crate::ingest::{read_rows_from_path, RawRow};
use crate::rules::{classify_meal, medication_status, parse_completed};
use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

/// Default length limit for diagnosis short names, ellipsis included
pub const DEFAULT_DIAGNOSIS_NAME_LIMIT: usize = 80;

/// Weight cells that mean "not measured"
const WEIGHT_PLACEHOLDERS: &[&str] = &["—", "-"];

static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("Invalid number regex"));

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceType - which export a file is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    Diet,
    Visits,
    Tests,
}

impl SourceType {
    pub const ALL: [SourceType; 3] = [SourceType::Diet, SourceType::Visits, SourceType::Tests];

    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            SourceType::Diet => "Diet & weight log",
            SourceType::Visits => "Doctor visits",
            SourceType::Tests => "Test summary",
        }
    }

    /// Short code for internal use
    pub fn code(&self) -> &str {
        match self {
            SourceType::Diet => "diet",
            SourceType::Visits => "visits",
            SourceType::Tests => "tests",
        }
    }
}

/// Records accumulated from one or more sources, in input row order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRecords {
    pub weights: Vec<WeightEntry>,
    pub lab_tests: Vec<LabTestResult>,
    pub medications: Vec<MedicationEntry>,
    pub diagnoses: Vec<Diagnosis>,
    pub doctor_visits: Vec<DoctorVisit>,
    /// Prescription lines whose dose could not be parsed
    pub unparsed_medications: Vec<String>,
}

impl ParsedRecords {
    /// Append another batch, keeping order
    pub fn extend(&mut self, other: ParsedRecords) {
        self.weights.extend(other.weights);
        self.lab_tests.extend(other.lab_tests);
        self.medications.extend(other.medications);
        self.diagnoses.extend(other.diagnoses);
        self.doctor_visits.extend(other.doctor_visits);
        self.unparsed_medications.extend(other.unparsed_medications);
    }

    pub fn total(&self) -> usize {
        self.weights.len()
            + self.lab_tests.len()
            + self.medications.len()
            + self.diagnoses.len()
            + self.doctor_visits.len()
    }
}

/// What happened to a single row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Emitted,
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingDate,
    MissingWeight,
    MissingTestName,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::MissingDate => "missing or unparseable date",
            DropReason::MissingWeight => "missing or non-numeric weight",
            DropReason::MissingTestName => "missing test name",
        }
    }
}

/// Output of parsing one source file
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    pub source: SourceType,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub records: ParsedRecords,
}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// SourceParser - one implementation per export
pub trait SourceParser: Send + Sync {
    fn source_type(&self) -> SourceType;

    /// Normalize one row, appending whatever it produces to `out`
    fn parse_row(&self, row: &RawRow, out: &mut ParsedRecords) -> RowOutcome;

    /// Normalize every row in order
    fn parse_rows(&self, rows: &[RawRow]) -> SourceReport {
        let mut records = ParsedRecords::default();
        let mut rows_dropped = 0;

        for row in rows {
            if let RowOutcome::Dropped(reason) = self.parse_row(row, &mut records) {
                rows_dropped += 1;
                debug!(
                    source = self.source_type().code(),
                    line = row.line_number,
                    reason = reason.as_str(),
                    "row dropped"
                );
            }
        }

        SourceReport {
            source: self.source_type(),
            rows_read: rows.len(),
            rows_dropped,
            records,
        }
    }

    /// Read a CSV file and normalize it
    fn parse(&self, file_path: &Path) -> Result<SourceReport> {
        let rows = read_rows_from_path(file_path)?;
        let report = self.parse_rows(&rows);
        info!(
            source = self.source_type().code(),
            file = %file_path.display(),
            rows = report.rows_read,
            dropped = report.rows_dropped,
            records = report.records.total(),
            "parsed source"
        );
        Ok(report)
    }
}

/// Get the parser for a source type
pub fn get_parser(source_type: SourceType, diagnosis_name_limit: usize) -> Box<dyn SourceParser> {
    match source_type {
        SourceType::Diet => Box::new(DietParser::new()),
        SourceType::Visits => Box::new(VisitParser::new(diagnosis_name_limit)),
        SourceType::Tests => Box::new(TestParser::new()),
    }
}

// ============================================================================
// TEXT HELPERS
// ============================================================================

/// First sentence-like segment of free text (split on '.', ';' or newline)
pub fn first_clause(text: &str) -> &str {
    text.split(['.', ';', '\n']).next().unwrap_or("").trim()
}

/// Cut `text` to at most `limit` characters, ending in "..." when cut
pub fn truncate_label(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// First decimal number in a cell, ignoring placeholder dashes
pub fn extract_weight(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || WEIGHT_PLACEHOLDERS.contains(&raw) {
        return None;
    }
    NUMBER_REGEX
        .captures(raw)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

// ============================================================================
// DIET LOG
// ============================================================================

/// Diet & weight log: one WeightEntry per row with a date and a weight
pub struct DietParser;

impl DietParser {
    pub const DATE: &'static str = "Date";
    pub const WEIGHT: &'static str = "Weight before meal (kg)";
    pub const MEAL: &'static str = "Meal";
    pub const MENU: &'static str = "Menu";
    pub const SYMPTOMS: &'static str = "Post Meal Symptoms";
    pub const DAY: &'static str = "Day";

    pub fn new() -> Self {
        DietParser
    }
}

impl Default for DietParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for DietParser {
    fn source_type(&self) -> SourceType {
        SourceType::Diet
    }

    fn parse_row(&self, row: &RawRow, out: &mut ParsedRecords) -> RowOutcome {
        let Some(date) = parse_date(row.get(Self::DATE)) else {
            return RowOutcome::Dropped(DropReason::MissingDate);
        };

        let Some(value) = row
            .trimmed(Self::WEIGHT)
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
        else {
            return RowOutcome::Dropped(DropReason::MissingWeight);
        };

        let notes = row.optional(Self::DAY).map(|day| format!("Day: {}", day));

        out.weights.push(
            WeightEntry::new(date, classify_meal(row.get(Self::MEAL)), value, WeightSource::DietLog)
                .with_menu(row.optional(Self::MENU))
                .with_symptoms(row.optional(Self::SYMPTOMS))
                .with_notes(notes),
        );

        RowOutcome::Emitted
    }
}

// ============================================================================
// DOCTOR VISITS
// ============================================================================

/// Doctor visits: weight, diagnosis, medications and a visit summary per row
pub struct VisitParser {
    diagnosis_name_limit: usize,
}

impl VisitParser {
    pub const DATE: &'static str = "Date";
    pub const DOCTOR: &'static str = "Doctor";
    pub const DIAGNOSIS: &'static str = "Diagnosis / Comments";
    pub const MEDICINES: &'static str = "Medicines Prescribed";
    pub const COMPLETED: &'static str = "Completed";
    pub const WEIGHT: &'static str = "Weight (kg)";

    pub fn new(diagnosis_name_limit: usize) -> Self {
        VisitParser {
            diagnosis_name_limit,
        }
    }
}

impl Default for VisitParser {
    fn default() -> Self {
        Self::new(DEFAULT_DIAGNOSIS_NAME_LIMIT)
    }
}

impl SourceParser for VisitParser {
    fn source_type(&self) -> SourceType {
        SourceType::Visits
    }

    fn parse_row(&self, row: &RawRow, out: &mut ParsedRecords) -> RowOutcome {
        let Some(date) = parse_date(row.get(Self::DATE)) else {
            return RowOutcome::Dropped(DropReason::MissingDate);
        };

        let doctor = row.optional(Self::DOCTOR);
        let comments = row.trimmed(Self::DIAGNOSIS);
        let medicines = row.trimmed(Self::MEDICINES);
        let completed = parse_completed(row.get(Self::COMPLETED));
        let weight = extract_weight(row.get(Self::WEIGHT));

        // Weight reading
        if let Some(value) = weight {
            out.weights.push(
                WeightEntry::new(date, Meal::Other, value, WeightSource::DoctorVisit)
                    .with_notes(doctor.as_ref().map(|d| format!("Doctor: {}", d))),
            );
        }

        // Diagnosis
        let clause = first_clause(comments);
        if !comments.is_empty() {
            let name = if clause.is_empty() {
                DEFAULT_DIAGNOSIS_NAME.to_string()
            } else {
                truncate_label(clause, self.diagnosis_name_limit)
            };
            out.diagnoses.push(Diagnosis::monitoring(
                date,
                name,
                doctor.clone(),
                comments.to_string(),
            ));
        }

        // Medications, one per prescription line
        let status = medication_status(completed);
        for item in split_prescriptions(medicines) {
            let parsed = parse_medication(item);
            if !parsed.has_dose() {
                debug!(line = row.line_number, "medication dose not parsed");
                out.unparsed_medications.push(item.to_string());
            }
            out.medications.push(MedicationEntry {
                entry_date: date,
                prescribed_by: doctor.clone(),
                name: parsed.name,
                dose: parsed.dose,
                dose_unit: parsed.dose_unit,
                dose_count: parsed.dose_count,
                frequency: None,
                start_date: date,
                end_date: None,
                stop_date: (status == MedicationStatus::Stopped).then_some(date),
                status,
                notes: Some(format!("Original: {}", item)),
            });
        }

        // Visit summary, always
        out.doctor_visits.push(DoctorVisit {
            visit_date: date,
            doctor: doctor.unwrap_or_else(|| "Unknown".to_string()),
            diagnosis_summary: (!clause.is_empty()).then(|| clause.to_string()),
            medications_summary: (!medicines.is_empty())
                .then(|| medicines.replace('\n', "; ").trim().to_string()),
            completed,
            weight_value: weight,
            weight_unit: weight.map(|_| WEIGHT_UNIT.to_string()),
            notes: (!comments.is_empty()).then(|| comments.to_string()),
        });

        RowOutcome::Emitted
    }
}

// ============================================================================
// TEST SUMMARY
// ============================================================================

/// Test summary: one or more LabTestResults per row
pub struct TestParser;

impl TestParser {
    pub const NAME: &'static str = "Test Name";
    pub const DATE: &'static str = "Test Date";
    pub const RESULT: &'static str = "Test Result";
    pub const PROBLEMATIC: &'static str = "Problematic (No/Slight/Yes)";
    pub const INTERPRETATION: &'static str = "Test Interpretation";
    pub const LAB: &'static str = "Lab";
    pub const NOTES: &'static str = "Notes";

    pub fn new() -> Self {
        TestParser
    }
}

impl Default for TestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for TestParser {
    fn source_type(&self) -> SourceType {
        SourceType::Tests
    }

    fn parse_row(&self, row: &RawRow, out: &mut ParsedRecords) -> RowOutcome {
        let Some(date) = parse_date(row.get(Self::DATE)) else {
            return RowOutcome::Dropped(DropReason::MissingDate);
        };
        let test_name = row.trimmed(Self::NAME);
        if test_name.is_empty() {
            return RowOutcome::Dropped(DropReason::MissingTestName);
        }

        let ctx = LabRowContext {
            entry_date: date,
            test_name: test_name.to_string(),
            lab_name: row.optional(Self::LAB),
            reference_notes: compose_reference_notes(
                row.get(Self::PROBLEMATIC),
                row.get(Self::INTERPRETATION),
            ),
            notes: row.optional(Self::NOTES),
        };

        out.lab_tests
            .extend(extract_lab_results(row.trimmed(Self::RESULT), &ctx));

        RowOutcome::Emitted
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DiagnosisStatus, LabCategory, MedicationStatus};
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parse_one<P: SourceParser>(parser: &P, pairs: &[(&str, &str)]) -> (RowOutcome, ParsedRecords) {
        let row = RawRow::from_pairs(2, pairs.iter().copied());
        let mut out = ParsedRecords::default();
        let outcome = parser.parse_row(&row, &mut out);
        (outcome, out)
    }

    #[test]
    fn test_source_type_codes() {
        assert_eq!(SourceType::Diet.code(), "diet");
        assert_eq!(SourceType::Visits.code(), "visits");
        assert_eq!(SourceType::Tests.code(), "tests");
        assert_eq!(SourceType::Visits.name(), "Doctor visits");
    }

    #[test]
    fn test_get_parser() {
        for source in SourceType::ALL {
            assert_eq!(get_parser(source, 80).source_type(), source);
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    #[test]
    fn test_first_clause() {
        assert_eq!(first_clause("Gastritis. Follow up in 2 weeks"), "Gastritis");
        assert_eq!(first_clause("Reflux; mild"), "Reflux");
        assert_eq!(first_clause("Line one\nLine two"), "Line one");
        assert_eq!(first_clause(". leading dot"), "");
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("short", 80), "short");
        let long = "a".repeat(100);
        let cut = truncate_label(&long, 80);
        assert_eq!(cut.chars().count(), 80);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate_label(&"b".repeat(80), 80), "b".repeat(80));
    }

    #[test]
    fn test_truncate_label_counts_characters_not_bytes() {
        let text = "é".repeat(81);
        let cut = truncate_label(&text, 80);
        assert_eq!(cut.chars().count(), 80);
    }

    #[test]
    fn test_extract_weight() {
        assert_eq!(extract_weight("72.4"), Some(72.4));
        assert_eq!(extract_weight("approx 80 kg"), Some(80.0));
        assert_eq!(extract_weight("—"), None);
        assert_eq!(extract_weight(" - "), None);
        assert_eq!(extract_weight(""), None);
        assert_eq!(extract_weight("not weighed"), None);
    }

    // ------------------------------------------------------------------------
    // Diet
    // ------------------------------------------------------------------------

    #[test]
    fn test_diet_row_breakfast_weight() {
        let (outcome, out) = parse_one(
            &DietParser::new(),
            &[("Date", "01-Jan-24"), ("Meal", "Breakfast"), ("Weight before meal (kg)", "70.5")],
        );

        assert_eq!(outcome, RowOutcome::Emitted);
        assert_eq!(out.weights.len(), 1);
        let w = &out.weights[0];
        assert_eq!(w.entry_date, ymd(2024, 1, 1));
        assert_eq!(w.meal, Meal::Breakfast);
        assert_eq!(w.value, 70.5);
        assert_eq!(w.unit, "kg");
        assert_eq!(w.source, WeightSource::DietLog);
        assert_eq!(w.notes, None);
    }

    #[test]
    fn test_diet_row_optional_fields() {
        let (_, out) = parse_one(
            &DietParser::new(),
            &[
                ("Date", "02-Jan-24"),
                ("Meal", "snack"),
                ("Weight before meal (kg)", " 69.9 "),
                ("Menu", " oats "),
                ("Post Meal Symptoms", ""),
                ("Day", "Tuesday"),
            ],
        );
        let w = &out.weights[0];
        assert_eq!(w.meal, Meal::Other);
        assert_eq!(w.menu.as_deref(), Some("oats"));
        assert_eq!(w.symptoms, None);
        assert_eq!(w.notes.as_deref(), Some("Day: Tuesday"));
    }

    #[test]
    fn test_diet_row_empty_weight_dropped() {
        let (outcome, out) = parse_one(
            &DietParser::new(),
            &[("Date", "01-Jan-24"), ("Meal", "Lunch"), ("Weight before meal (kg)", "")],
        );
        assert_eq!(outcome, RowOutcome::Dropped(DropReason::MissingWeight));
        assert_eq!(out.total(), 0);
    }

    #[test]
    fn test_diet_row_non_numeric_or_missing_date_dropped() {
        let parser = DietParser::new();
        let (outcome, _) = parse_one(&parser, &[("Date", "01-Jan-24"), ("Weight before meal (kg)", "n/a")]);
        assert_eq!(outcome, RowOutcome::Dropped(DropReason::MissingWeight));

        let (outcome, _) = parse_one(&parser, &[("Date", "inf"), ("Weight before meal (kg)", "70")]);
        assert_eq!(outcome, RowOutcome::Dropped(DropReason::MissingDate));

        let (outcome, _) = parse_one(&parser, &[("Date", "01-Jan-24"), ("Weight before meal (kg)", "inf")]);
        assert_eq!(outcome, RowOutcome::Dropped(DropReason::MissingWeight));
    }

    // ------------------------------------------------------------------------
    // Visits
    // ------------------------------------------------------------------------

    #[test]
    fn test_visit_row_medications() {
        let (outcome, out) = parse_one(
            &VisitParser::default(),
            &[
                ("Date", "15-Mar-24"),
                ("Doctor", "Dr. Lee"),
                ("Medicines Prescribed", "Metformin 500mg\nAspirin x2"),
                ("Completed", "No"),
            ],
        );

        assert_eq!(outcome, RowOutcome::Emitted);
        assert_eq!(out.medications.len(), 2);

        let metformin = &out.medications[0];
        assert_eq!(metformin.name, "Metformin");
        assert_eq!(metformin.dose, Some(500.0));
        assert_eq!(metformin.dose_unit.as_deref(), Some("mg"));
        assert_eq!(metformin.status, MedicationStatus::Active);
        assert_eq!(metformin.stop_date, None);
        assert_eq!(metformin.start_date, ymd(2024, 3, 15));
        assert_eq!(metformin.prescribed_by.as_deref(), Some("Dr. Lee"));
        assert_eq!(metformin.notes.as_deref(), Some("Original: Metformin 500mg"));

        let aspirin = &out.medications[1];
        assert!(aspirin.name.contains("Aspirin"));
        assert_eq!(aspirin.dose, None);
        assert_eq!(aspirin.dose_count, Some(2));
        assert_eq!(aspirin.status, MedicationStatus::Active);

        assert_eq!(out.unparsed_medications, vec!["Aspirin x2".to_string()]);
        assert_eq!(out.doctor_visits.len(), 1);
        assert!(out.weights.is_empty());
        assert!(out.diagnoses.is_empty());
    }

    #[test]
    fn test_visit_completed_yes_stops_medication() {
        let (_, out) = parse_one(
            &VisitParser::default(),
            &[("Date", "15-Mar-24"), ("Medicines Prescribed", "Omeprazole 20mg"), ("Completed", "yes")],
        );
        let med = &out.medications[0];
        assert_eq!(med.status, MedicationStatus::Stopped);
        assert_eq!(med.stop_date, Some(ymd(2024, 3, 15)));
        assert_eq!(med.prescribed_by, None);
        assert_eq!(out.doctor_visits[0].completed, Some(true));
    }

    #[test]
    fn test_visit_summary_fields() {
        let (_, out) = parse_one(
            &VisitParser::default(),
            &[
                ("Date", "March 20, 2024"),
                ("Doctor", ""),
                ("Diagnosis / Comments", "Mild gastritis. Avoid spicy food; review in 4 weeks"),
                ("Medicines Prescribed", "Pantoprazole 40mg\nDomperidone 10mg"),
                ("Completed", "maybe"),
                ("Weight (kg)", "81.2 kg"),
            ],
        );

        let visit = &out.doctor_visits[0];
        assert_eq!(visit.visit_date, ymd(2024, 3, 20));
        assert_eq!(visit.doctor, "Unknown");
        assert_eq!(visit.diagnosis_summary.as_deref(), Some("Mild gastritis"));
        assert_eq!(
            visit.medications_summary.as_deref(),
            Some("Pantoprazole 40mg; Domperidone 10mg")
        );
        assert_eq!(visit.completed, None);
        assert_eq!(visit.weight_value, Some(81.2));
        assert_eq!(visit.weight_unit.as_deref(), Some("kg"));
        assert_eq!(
            visit.notes.as_deref(),
            Some("Mild gastritis. Avoid spicy food; review in 4 weeks")
        );

        let dx = &out.diagnoses[0];
        assert_eq!(dx.name, "Mild gastritis");
        assert_eq!(dx.diagnosis_date, dx.entry_date);
        assert_eq!(dx.status, DiagnosisStatus::Monitoring);
        assert_eq!(dx.provider, None);

        let w = &out.weights[0];
        assert_eq!(w.value, 81.2);
        assert_eq!(w.source, WeightSource::DoctorVisit);
        assert_eq!(w.meal, Meal::Other);
        assert_eq!(w.notes, None);
    }

    #[test]
    fn test_visit_weight_note_names_doctor() {
        let (_, out) = parse_one(
            &VisitParser::default(),
            &[("Date", "15-Mar-24"), ("Doctor", "Dr. Rao"), ("Weight (kg)", "78")],
        );
        assert_eq!(out.weights[0].notes.as_deref(), Some("Doctor: Dr. Rao"));
    }

    #[test]
    fn test_visit_placeholder_weight_ignored() {
        let (_, out) = parse_one(
            &VisitParser::default(),
            &[("Date", "15-Mar-24"), ("Weight (kg)", "—")],
        );
        assert!(out.weights.is_empty());
        assert_eq!(out.doctor_visits[0].weight_value, None);
        assert_eq!(out.doctor_visits[0].weight_unit, None);
    }

    #[test]
    fn test_visit_without_date_dropped_entirely() {
        let (outcome, out) = parse_one(
            &VisitParser::default(),
            &[("Date", "N/A"), ("Doctor", "Dr. Lee"), ("Medicines Prescribed", "Metformin 500mg")],
        );
        assert_eq!(outcome, RowOutcome::Dropped(DropReason::MissingDate));
        assert_eq!(out.total(), 0);
    }

    #[test]
    fn test_visit_always_emits_summary() {
        let (_, out) = parse_one(&VisitParser::default(), &[("Date", "15-Mar-24")]);
        assert_eq!(out.doctor_visits.len(), 1);
        assert_eq!(out.total(), 1);
        let visit = &out.doctor_visits[0];
        assert_eq!(visit.diagnosis_summary, None);
        assert_eq!(visit.medications_summary, None);
        assert_eq!(visit.notes, None);
    }

    #[test]
    fn test_diagnosis_name_truncated_to_limit() {
        let comments = format!("{} and more", "x".repeat(120));
        let (_, out) = parse_one(
            &VisitParser::new(40),
            &[("Date", "15-Mar-24"), ("Diagnosis / Comments", comments.as_str())],
        );
        let dx = &out.diagnoses[0];
        assert_eq!(dx.name.chars().count(), 40);
        assert!(dx.name.ends_with("..."));
        assert_eq!(dx.notes, comments);
        // summary keeps the untruncated clause
        assert_eq!(out.doctor_visits[0].diagnosis_summary.as_deref(), Some(comments.as_str()));
    }

    #[test]
    fn test_diagnosis_empty_clause_uses_default_name() {
        let (_, out) = parse_one(
            &VisitParser::default(),
            &[("Date", "15-Mar-24"), ("Diagnosis / Comments", ". see notes")],
        );
        assert_eq!(out.diagnoses[0].name, DEFAULT_DIAGNOSIS_NAME);
    }

    // ------------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_test_row_single_pair() {
        let (outcome, out) = parse_one(
            &TestParser::new(),
            &[("Test Name", "Glucose"), ("Test Date", "10-Apr-24"), ("Test Result", "Glucose: 95 mg/dL")],
        );
        assert_eq!(outcome, RowOutcome::Emitted);
        assert_eq!(out.lab_tests.len(), 1);
        let r = &out.lab_tests[0];
        assert_eq!(r.test_name, "Glucose");
        assert_eq!(r.value, Some(95.0));
        assert_eq!(r.unit.as_deref(), Some("mg/dL"));
        assert_eq!(r.category, LabCategory::Lab);
        assert_eq!(r.reference_notes, None);
    }

    #[test]
    fn test_test_row_procedure_text() {
        let (_, out) = parse_one(
            &TestParser::new(),
            &[
                ("Test Name", "MRI Brain"),
                ("Test Date", "10-Apr-2024"),
                ("Test Result", "Normal"),
                ("Problematic (No/Slight/Yes)", "No"),
                ("Test Interpretation", "No abnormality"),
                ("Lab", "Imaging Center"),
                ("Notes", ""),
            ],
        );
        let r = &out.lab_tests[0];
        assert_eq!(r.value, None);
        assert_eq!(r.result_text.as_deref(), Some("Normal"));
        assert_eq!(r.category, LabCategory::Procedure);
        assert_eq!(r.lab_name.as_deref(), Some("Imaging Center"));
        assert_eq!(r.reference_notes.as_deref(), Some("Problematic: No. No abnormality"));
        assert_eq!(r.notes, None);
    }

    #[test]
    fn test_test_row_requires_date_and_name() {
        let parser = TestParser::new();
        let (outcome, out) = parse_one(&parser, &[("Test Name", ""), ("Test Date", "10-Apr-24")]);
        assert_eq!(outcome, RowOutcome::Dropped(DropReason::MissingTestName));
        assert!(out.lab_tests.is_empty());

        let (outcome, _) = parse_one(&parser, &[("Test Name", "CBC"), ("Test Date", "")]);
        assert_eq!(outcome, RowOutcome::Dropped(DropReason::MissingDate));
    }

    #[test]
    fn test_parse_rows_counts_drops_and_keeps_order() {
        let rows = vec![
            RawRow::from_pairs(2, [("Date", "01-Jan-24"), ("Weight before meal (kg)", "70.5")]),
            RawRow::from_pairs(3, [("Date", ""), ("Weight before meal (kg)", "70.1")]),
            RawRow::from_pairs(4, [("Date", "02-Jan-24"), ("Weight before meal (kg)", "70.2")]),
        ];
        let report = DietParser::new().parse_rows(&rows);

        assert_eq!(report.source, SourceType::Diet);
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_dropped, 1);
        let values: Vec<f64> = report.records.weights.iter().map(|w| w.value).collect();
        assert_eq!(values, vec![70.5, 70.2]);
    }

    #[test]
    fn test_parsed_records_extend_preserves_order() {
        let mut all = ParsedRecords::default();
        let diet = DietParser::new().parse_rows(&[RawRow::from_pairs(
            2,
            [("Date", "01-Jan-24"), ("Weight before meal (kg)", "70")],
        )]);
        let visits = VisitParser::default().parse_rows(&[RawRow::from_pairs(
            2,
            [("Date", "05-Jan-24"), ("Weight (kg)", "71")],
        )]);
        all.extend(diet.records);
        all.extend(visits.records);

        let sources: Vec<WeightSource> = all.weights.iter().map(|w| w.source).collect();
        assert_eq!(sources, vec![WeightSource::DietLog, WeightSource::DoctorVisit]);
        assert_eq!(all.total(), 3);
    }
}
