// health-ingest - normalize health-log CSV exports into record collections

use anyhow::Result;
use clap::Parser;
use health_ingest::logging::{init_logging, LogConfig, LogFormat};
use health_ingest::{run_dry, run_import, ImportConfig, SinkTarget};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "health-ingest", version, about = "Import diet, doctor-visit and lab-test CSV logs")]
struct Cli {
    /// Clear every collection before importing
    #[arg(long)]
    reset: bool,

    /// Parse and summarize without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Directory holding the three CSV exports
    #[arg(long, env = "HEALTH_INGEST_DATA_DIR", default_value = health_ingest::config::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Diet & weight log (default: <data-dir>/diet and weight summarized.csv)
    #[arg(long, env = "HEALTH_INGEST_DIET")]
    diet: Option<PathBuf>,

    /// Doctor visits (default: <data-dir>/doctor visits.csv)
    #[arg(long, env = "HEALTH_INGEST_VISITS")]
    visits: Option<PathBuf>,

    /// Test summary (default: <data-dir>/test summary.csv)
    #[arg(long, env = "HEALTH_INGEST_TESTS")]
    tests: Option<PathBuf>,

    /// SQLite database to write to
    #[arg(long, env = "HEALTH_INGEST_DATABASE", conflicts_with = "json_dir")]
    database: Option<PathBuf>,

    /// Directory of <collection>.json files to write to
    #[arg(long, env = "HEALTH_INGEST_JSON_DIR")]
    json_dir: Option<PathBuf>,

    #[arg(long, env = "HEALTH_INGEST_BATCH_SIZE", default_value_t = health_ingest::db::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Max characters of a diagnosis short name
    #[arg(long, env = "HEALTH_INGEST_NAME_LIMIT", default_value_t = health_ingest::parser::DEFAULT_DIAGNOSIS_NAME_LIMIT)]
    name_limit: usize,

    /// -v for debug, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long, value_enum, env = "HEALTH_INGEST_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

impl Cli {
    fn into_config(self) -> ImportConfig {
        let mut config = ImportConfig::from_data_dir(&self.data_dir)
            .with_batch_size(self.batch_size)
            .with_diagnosis_name_limit(self.name_limit)
            .with_reset(self.reset)
            .with_dry_run(self.dry_run);

        if let Some(path) = self.diet {
            config.diet_path = path;
        }
        if let Some(path) = self.visits {
            config.visits_path = path;
        }
        if let Some(path) = self.tests {
            config.tests_path = path;
        }

        if let Some(path) = self.database {
            config = config.with_sink(SinkTarget::Sqlite(path));
        } else if let Some(dir) = self.json_dir {
            config = config.with_sink(SinkTarget::JsonDir(dir));
        }
        config
    }
}

/// .env.local first, then .env; neither overrides variables already set
fn load_env_files() {
    for name in [".env.local", ".env"] {
        let path = Path::new(name);
        if path.exists() {
            if let Err(e) = dotenvy::from_path(path) {
                eprintln!("warning: could not load {}: {}", name, e);
            }
        }
    }
}

fn run(config: &ImportConfig) -> Result<()> {
    if config.dry_run {
        let summary = run_dry(config)?;
        summary.print();
        return Ok(());
    }

    // No storage target: stop before parsing anything
    let target = config.require_sink()?;
    config.validate()?;

    let mut sink = target.open(config.batch_size)?;
    let summary = run_import(config, sink.as_mut())?;
    summary.print();
    Ok(())
}

fn main() -> ExitCode {
    load_env_files();
    let cli = Cli::parse();

    init_logging(&LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format));

    let config = cli.into_config();
    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
