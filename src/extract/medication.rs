// 💊 Medication Extractor
// "Metformin 500mg x2" → name "Metformin", dose 500, unit "mg", count 2

use regex::Regex;
use std::sync::LazyLock;

/// "<name><dose><unit>" with the unit vocabulary mg, ml, mcg, g, iu, unit(s)
static DOSE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?P<name>.*?)(?P<dose>\d+(?:\.\d+)?)\s*(?P<unit>mg|ml|mcg|g|iu|units?)\b")
        .expect("Invalid dose regex")
});

/// Repeat-count marker "x2", "× 3"
static COUNT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:x|×)\s*(\d+)").expect("Invalid dose count regex"));

/// Result of parsing one prescription line
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMedication {
    /// Text before the dose, or the whole line when no dose was found
    pub name: String,
    pub dose: Option<f64>,
    pub dose_unit: Option<String>,
    pub dose_count: Option<u32>,
}

impl ParsedMedication {
    /// False when the line did not contain a recognizable dose
    pub fn has_dose(&self) -> bool {
        self.dose.is_some()
    }
}

/// Parse one prescription line
///
/// Never fails: a line without a dose comes back with the full line as the
/// name and no dose/unit. The repeat count is searched independently.
pub fn parse_medication(line: &str) -> ParsedMedication {
    let line = line.trim();
    let dose_count = extract_dose_count(line);

    let dosed = DOSE_REGEX.captures(line).and_then(|caps| {
        let dose = caps["dose"].parse::<f64>().ok()?;
        let name = caps["name"].trim_matches(|c: char| c == ' ' || c == '-' || c == '\t');
        Some((name.to_string(), dose, caps["unit"].to_lowercase()))
    });

    match dosed {
        Some((name, dose, unit)) => ParsedMedication {
            name: if name.is_empty() { line.to_string() } else { name },
            dose: Some(dose),
            dose_unit: Some(unit),
            dose_count,
        },
        None => ParsedMedication {
            name: line.to_string(),
            dose: None,
            dose_unit: None,
            dose_count,
        },
    }
}

/// Search anywhere in the line for "x<N>" / "×<N>"
pub fn extract_dose_count(line: &str) -> Option<u32> {
    COUNT_REGEX
        .captures(line)
        .and_then(|caps| caps[1].parse::<u32>().ok())
}

/// Split a "Medicines Prescribed" cell into one trimmed line per item
pub fn split_prescriptions(cell: &str) -> Vec<&str> {
    cell.split('\n')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}
