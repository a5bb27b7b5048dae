// ⚙️ Import configuration
// Plain values handed to the pipeline. Nothing in the library reads the
// process environment; the binary fills this in from flags and env vars.

use crate::db::{JsonDirSink, RecordSink, SqliteSink, DEFAULT_BATCH_SIZE};
use crate::error::ImportError;
use crate::parser::{SourceType, DEFAULT_DIAGNOSIS_NAME_LIMIT};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_DIET_FILE: &str = "diet and weight summarized.csv";
pub const DEFAULT_VISITS_FILE: &str = "doctor visits.csv";
pub const DEFAULT_TESTS_FILE: &str = "test summary.csv";

/// Where records are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Sqlite(PathBuf),
    JsonDir(PathBuf),
}

impl SinkTarget {
    pub fn describe(&self) -> String {
        match self {
            SinkTarget::Sqlite(path) => format!("sqlite:{}", path.display()),
            SinkTarget::JsonDir(dir) => format!("json:{}", dir.display()),
        }
    }

    /// Open the backend, failing with SinkUnavailable
    pub fn open(&self, batch_size: usize) -> Result<Box<dyn RecordSink>, ImportError> {
        let sink: Box<dyn RecordSink> = match self {
            SinkTarget::Sqlite(path) => Box::new(
                SqliteSink::open(path)
                    .map_err(|e| ImportError::sink_unavailable(self.describe(), e))?
                    .with_batch_size(batch_size),
            ),
            SinkTarget::JsonDir(dir) => Box::new(
                JsonDirSink::open(dir)
                    .map_err(|e| ImportError::sink_unavailable(self.describe(), e))?
                    .with_batch_size(batch_size),
            ),
        };
        Ok(sink)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub diet_path: PathBuf,
    pub visits_path: PathBuf,
    pub tests_path: PathBuf,
    pub sink: Option<SinkTarget>,
    pub batch_size: usize,
    /// Max characters of a diagnosis short name, "..." included
    pub diagnosis_name_limit: usize,
    /// Clear every collection before inserting
    pub reset: bool,
    /// Parse and summarize without touching a sink
    pub dry_run: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self::from_data_dir(DEFAULT_DATA_DIR)
    }
}

impl ImportConfig {
    /// Default file names inside `data_dir`
    pub fn from_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        ImportConfig {
            diet_path: dir.join(DEFAULT_DIET_FILE),
            visits_path: dir.join(DEFAULT_VISITS_FILE),
            tests_path: dir.join(DEFAULT_TESTS_FILE),
            sink: None,
            batch_size: DEFAULT_BATCH_SIZE,
            diagnosis_name_limit: DEFAULT_DIAGNOSIS_NAME_LIMIT,
            reset: false,
            dry_run: false,
        }
    }

    pub fn with_sink(mut self, sink: SinkTarget) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_diagnosis_name_limit(mut self, limit: usize) -> Self {
        self.diagnosis_name_limit = limit;
        self
    }

    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn input_path(&self, source: SourceType) -> &Path {
        match source {
            SourceType::Diet => &self.diet_path,
            SourceType::Visits => &self.visits_path,
            SourceType::Tests => &self.tests_path,
        }
    }

    /// The configured sink, or MissingCredential
    pub fn require_sink(&self) -> Result<&SinkTarget, ImportError> {
        self.sink.as_ref().ok_or_else(|| ImportError::MissingCredential {
            name: "storage target".to_string(),
        })
    }

    /// Check limits and that every input file exists
    pub fn validate(&self) -> Result<(), ImportError> {
        if self.batch_size == 0 {
            return Err(ImportError::InvalidConfig {
                reason: "batch size must be at least 1".to_string(),
            });
        }
        if self.diagnosis_name_limit <= 3 {
            return Err(ImportError::InvalidConfig {
                reason: format!(
                    "diagnosis name limit must be greater than 3, got {}",
                    self.diagnosis_name_limit
                ),
            });
        }

        for source in SourceType::ALL {
            let path = self.input_path(source);
            if !path.is_file() {
                return Err(ImportError::MissingInput {
                    input: source.code().to_string(),
                    path: path.to_path_buf(),
                });
            }
        }

        Ok(())
    }
}
