// Health Ingest - Core Library
// Normalizes diet, doctor-visit and lab-test CSV logs into five record
// collections and hands them to a record sink.

pub mod config;
pub mod dates;
pub mod db;
pub mod entities;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod rules;
pub mod summary;

// Re-export commonly used types
pub use config::{ImportConfig, SinkTarget};
pub use dates::{parse_date, to_iso};
pub use db::{
    Collection, Event, JsonDirSink, MemorySink, Record, RecordSink, SinkCall, SqliteSink,
    setup_database, get_events_for_collection,
};
pub use entities::{
    Diagnosis, DiagnosisStatus, DoctorVisit, Entity, LabCategory, LabTestResult, Meal,
    MedicationEntry, MedicationStatus, WeightEntry, WeightSource,
};
pub use error::ImportError;
pub use extract::{extract_lab_results, parse_medication, LabRowContext, ParsedMedication};
pub use ingest::{read_rows, RawRow};
pub use parser::{
    get_parser, DietParser, ParsedRecords, SourceParser, SourceReport, SourceType, TestParser,
    VisitParser,
};
pub use pipeline::{parse_sources, run_dry, run_import};
pub use summary::{ImportSummary, SourceSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
