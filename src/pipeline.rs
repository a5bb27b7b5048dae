// 🚚 Import pipeline
// verify inputs → parse diet, visits, tests → optional reset → insert
//
// Inputs are fully parsed before the sink is touched, so a bad CSV never
// leaves a half-cleared store behind. A sink failure aborts the run.

use crate::config::ImportConfig;
use crate::db::{Collection, Record, RecordSink};
use crate::entities::to_records;
use crate::error::ImportError;
use crate::ingest::file_fingerprint;
use crate::parser::{get_parser, ParsedRecords, SourceType};
use crate::summary::{ImportSummary, SourceSummary};
use anyhow::Result;
use tracing::{debug, info, info_span, trace, warn};

/// Everything read from the three inputs
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedImport {
    pub sources: Vec<SourceSummary>,
    pub records: ParsedRecords,
}

/// Parse every source in order: diet, visits, tests
pub fn parse_sources(config: &ImportConfig) -> Result<ParsedImport> {
    let mut sources = Vec::with_capacity(SourceType::ALL.len());
    let mut records = ParsedRecords::default();

    for source in SourceType::ALL {
        let _span = info_span!("source", source = source.code()).entered();
        let path = config.input_path(source);

        let fingerprint = file_fingerprint(path)?;
        info!(file = %path.display(), sha256 = %fingerprint, "reading source");

        let report = get_parser(source, config.diagnosis_name_limit).parse(path)?;
        sources.push(SourceSummary {
            source,
            path: path.to_path_buf(),
            fingerprint,
            rows_read: report.rows_read,
            rows_dropped: report.rows_dropped,
        });
        records.extend(report.records);
    }

    Ok(ParsedImport { sources, records })
}

/// Flatten parsed entities into per-collection records, in insert order
pub fn collection_records(records: &ParsedRecords) -> Result<Vec<(Collection, Vec<Record>)>> {
    Ok(vec![
        (Collection::Weights, to_records(&records.weights)?),
        (Collection::LabTests, to_records(&records.lab_tests)?),
        (Collection::Medications, to_records(&records.medications)?),
        (Collection::Diagnoses, to_records(&records.diagnoses)?),
        (Collection::DoctorVisits, to_records(&records.doctor_visits)?),
    ])
}

fn report_unparsed(lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    warn!(count = lines.len(), "medication lines stored without a parsed dose");
    for line in lines {
        trace!(line = %line, "unparsed medication");
    }
}

/// Parse all inputs and write them to `sink`
pub fn run_import(config: &ImportConfig, sink: &mut dyn RecordSink) -> Result<ImportSummary> {
    config.validate()?;
    let parsed = parse_sources(config)?;
    let batches = collection_records(&parsed.records)?;
    report_unparsed(&parsed.records.unparsed_medications);

    let target = sink.describe();
    let _span = info_span!("import", sink = %target).entered();

    if config.reset {
        for collection in Collection::ALL {
            sink.clear_all(collection)
                .map_err(|e| ImportError::sink_write(collection.name(), e))?;
        }
        info!("all collections cleared");
    }

    let mut counts = Vec::with_capacity(batches.len());
    for (collection, records) in &batches {
        debug!(collection = collection.name(), records = records.len(), "inserting");
        let inserted = sink
            .insert(*collection, records)
            .map_err(|e| ImportError::sink_write(collection.name(), e))?;
        info!(collection = collection.name(), inserted, "collection imported");
        counts.push((*collection, inserted));
    }

    Ok(ImportSummary {
        sink: Some(target),
        reset: config.reset,
        sources: parsed.sources,
        counts,
        unparsed_medications: parsed.records.unparsed_medications,
    })
}

/// Parse all inputs and report what would be written
pub fn run_dry(config: &ImportConfig) -> Result<ImportSummary> {
    config.validate()?;
    let parsed = parse_sources(config)?;
    let batches = collection_records(&parsed.records)?;
    report_unparsed(&parsed.records.unparsed_medications);

    let counts = batches
        .iter()
        .map(|(collection, records)| (*collection, records.len()))
        .collect();
    info!("dry run complete, nothing written");

    Ok(ImportSummary {
        sink: None,
        reset: false,
        sources: parsed.sources,
        counts,
        unparsed_medications: parsed.records.unparsed_medications,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_DIET_FILE, DEFAULT_TESTS_FILE, DEFAULT_VISITS_FILE};
    use crate::db::{MemorySink, SinkCall};
    use std::fs;
    use std::path::Path;

    fn write_fixture(dir: &Path) {
        fs::write(
            dir.join(DEFAULT_DIET_FILE),
            "Date,Meal,Weight before meal (kg),Menu,Post Meal Symptoms,Day\n\
             01-Jan-24,Breakfast,70.5,oats,,Monday\n\
             ,Lunch,70.1,,,\n",
        )
        .unwrap();
        fs::write(
            dir.join(DEFAULT_VISITS_FILE),
            "Date,Doctor,Diagnosis / Comments,Medicines Prescribed,Completed,Weight (kg)\n\
             15-Mar-24,Dr. Lee,Gastritis. Review,\"Metformin 500mg\nAspirin x2\",No,72\n",
        )
        .unwrap();
        fs::write(
            dir.join(DEFAULT_TESTS_FILE),
            "Test Name,Test Date,Test Result,Problematic (No/Slight/Yes),Test Interpretation,Lab,Notes\n\
             CBC,10-Apr-24,\"Hb: 13.5 g/dL, WBC: 7200 /uL\",No,,City Lab,\n",
        )
        .unwrap();
    }

    #[test]
    fn test_parse_sources_collects_fingerprints_and_drops() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let parsed = parse_sources(&ImportConfig::from_data_dir(dir.path())).unwrap();

        let codes: Vec<&str> = parsed.sources.iter().map(|s| s.source.code()).collect();
        assert_eq!(codes, vec!["diet", "visits", "tests"]);
        assert_eq!(parsed.sources[0].rows_dropped, 1);
        assert!(parsed.sources.iter().all(|s| s.fingerprint.len() == 64));

        assert_eq!(parsed.records.weights.len(), 2);
        assert_eq!(parsed.records.lab_tests.len(), 2);
        assert_eq!(parsed.records.medications.len(), 2);
        assert_eq!(parsed.records.diagnoses.len(), 1);
        assert_eq!(parsed.records.doctor_visits.len(), 1);
    }

    #[test]
    fn test_insert_order_without_reset() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let mut sink = MemorySink::new();

        let summary = run_import(&ImportConfig::from_data_dir(dir.path()), &mut sink).unwrap();

        let order: Vec<Collection> = sink
            .calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::Insert { collection, .. } => Some(*collection),
                SinkCall::Clear(_) => None,
            })
            .collect();
        assert_eq!(order, Collection::ALL.to_vec());
        assert!(!sink.calls.iter().any(|c| matches!(c, SinkCall::Clear(_))));
        assert_eq!(summary.total(), 8);
        assert_eq!(summary.unparsed_medications, vec!["Aspirin x2".to_string()]);
    }

    #[test]
    fn test_empty_collection_makes_no_insert_call() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        fs::write(
            dir.path().join(DEFAULT_TESTS_FILE),
            "Test Name,Test Date,Test Result\n",
        )
        .unwrap();
        let mut sink = MemorySink::new();

        let summary = run_import(&ImportConfig::from_data_dir(dir.path()), &mut sink).unwrap();

        assert_eq!(summary.count(Collection::LabTests), 0);
        assert!(!sink.calls.contains(&SinkCall::Insert {
            collection: Collection::LabTests,
            count: 0
        }));
    }

    #[test]
    fn test_sink_failure_aborts_with_collection_name() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let mut sink = MemorySink::new().failing_on(Collection::Medications);

        let err = run_import(&ImportConfig::from_data_dir(dir.path()), &mut sink).unwrap_err();

        let import_err = err.downcast_ref::<ImportError>().expect("typed error");
        assert!(matches!(import_err, ImportError::SinkWrite { collection, .. } if collection == "medications"));
        assert!(sink.records(Collection::Diagnoses).is_empty(), "later collections untouched");
        assert_eq!(sink.records(Collection::LabTests).len(), 2);
    }

    #[test]
    fn test_missing_input_fails_before_sink_is_touched() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = MemorySink::new();
        let config = ImportConfig::from_data_dir(dir.path()).with_reset(true);

        let err = run_import(&config, &mut sink).unwrap_err();

        assert!(matches!(err.downcast_ref::<ImportError>(), Some(ImportError::MissingInput { .. })));
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn test_dry_run_counts_parsed_records() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let summary = run_dry(&ImportConfig::from_data_dir(dir.path())).unwrap();

        assert!(summary.is_dry_run());
        assert_eq!(summary.count(Collection::Weights), 2);
        assert_eq!(summary.count(Collection::LabTests), 2);
        assert_eq!(summary.dropped(SourceType::Diet), 1);
    }
}
