// Free-text extractors used by the row parsers

pub mod lab;
pub mod medication;

pub use lab::{compose_reference_notes, extract_lab_results, LabRowContext, ResultMatcher};
pub use medication::{parse_medication, split_prescriptions, ParsedMedication};
