// 🗄️ Record Sink
// Named collections of flat records, plus the storage backends that accept them.
//
// Backends:
// - SqliteSink   one table per collection, WAL journal, audit trail in import_events
// - JsonDirSink  one <collection>.json array per collection
// - MemorySink   keeps everything in memory and logs every call

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Records per insert batch unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// A flat key-value record, one per entity
pub type Record = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// COLLECTIONS
// ============================================================================

/// Collection - the five named record sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Weights,
    LabTests,
    Medications,
    Diagnoses,
    DoctorVisits,
}

impl Collection {
    /// Insert order, also used for resets
    pub const ALL: [Collection; 5] = [
        Collection::Weights,
        Collection::LabTests,
        Collection::Medications,
        Collection::Diagnoses,
        Collection::DoctorVisits,
    ];

    /// Collection / table name
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Weights => "weights",
            Collection::LabTests => "lab_tests",
            Collection::Medications => "medications",
            Collection::Diagnoses => "diagnoses",
            Collection::DoctorVisits => "doctor_visits",
        }
    }

    /// Record fields and their SQLite column types
    pub fn columns(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Collection::Weights => &[
                ("entry_date", "TEXT NOT NULL"),
                ("meal", "TEXT NOT NULL"),
                ("value", "REAL NOT NULL"),
                ("unit", "TEXT NOT NULL"),
                ("source", "TEXT NOT NULL"),
                ("menu", "TEXT"),
                ("symptoms", "TEXT"),
                ("notes", "TEXT"),
            ],
            Collection::LabTests => &[
                ("entry_date", "TEXT NOT NULL"),
                ("test_name", "TEXT NOT NULL"),
                ("value", "REAL"),
                ("unit", "TEXT"),
                ("result_text", "TEXT"),
                ("lab_name", "TEXT"),
                ("category", "TEXT NOT NULL"),
                ("reference_notes", "TEXT"),
                ("ref_low", "REAL"),
                ("ref_high", "REAL"),
                ("notes", "TEXT"),
            ],
            Collection::Medications => &[
                ("entry_date", "TEXT NOT NULL"),
                ("prescribed_by", "TEXT"),
                ("name", "TEXT NOT NULL"),
                ("dose", "REAL"),
                ("dose_unit", "TEXT"),
                ("dose_count", "INTEGER"),
                ("frequency", "TEXT"),
                ("start_date", "TEXT NOT NULL"),
                ("end_date", "TEXT"),
                ("stop_date", "TEXT"),
                ("status", "TEXT NOT NULL"),
                ("notes", "TEXT"),
            ],
            Collection::Diagnoses => &[
                ("entry_date", "TEXT NOT NULL"),
                ("name", "TEXT NOT NULL"),
                ("diagnosis_date", "TEXT NOT NULL"),
                ("status", "TEXT NOT NULL"),
                ("provider", "TEXT"),
                ("notes", "TEXT NOT NULL"),
            ],
            Collection::DoctorVisits => &[
                ("visit_date", "TEXT NOT NULL"),
                ("doctor", "TEXT NOT NULL"),
                ("diagnosis_summary", "TEXT"),
                ("medications_summary", "TEXT"),
                ("completed", "INTEGER"),
                ("weight_value", "REAL"),
                ("weight_unit", "TEXT"),
                ("notes", "TEXT"),
            ],
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// SINK TRAIT
// ============================================================================

/// RecordSink - anything that accepts batches of records per collection
pub trait RecordSink {
    /// Where records go, for logs and the summary
    fn describe(&self) -> String;

    /// Records per batch
    fn batch_size(&self) -> usize {
        DEFAULT_BATCH_SIZE
    }

    /// Store one batch, returning how many records were stored
    fn insert_batch(&mut self, collection: Collection, batch: &[Record]) -> Result<usize>;

    /// Remove every record in a collection
    fn clear_all(&mut self, collection: Collection) -> Result<()>;

    /// Store records in sequential batches, preserving their order
    fn insert(&mut self, collection: Collection, records: &[Record]) -> Result<usize> {
        let mut inserted = 0;
        for (index, batch) in records.chunks(self.batch_size().max(1)).enumerate() {
            inserted += self.insert_batch(collection, batch)?;
            debug!(
                collection = collection.name(),
                batch = index + 1,
                size = batch.len(),
                "batch stored"
            );
        }
        Ok(inserted)
    }
}

// ============================================================================
// AUDIT EVENTS
// ============================================================================

/// One entry in the import audit trail
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub collection: String,
    pub record_count: i64,
    pub actor: String,
}

impl Event {
    pub fn new(event_type: &str, collection: Collection, record_count: usize, actor: &str) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            collection: collection.name().to_string(),
            record_count: record_count as i64,
            actor: actor.to_string(),
        }
    }
}

const EVENT_ACTOR: &str = "health_ingest";

// ============================================================================
// SQLITE
// ============================================================================

/// Create one table per collection plus the audit table
pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    for collection in Collection::ALL {
        let columns: Vec<String> = collection
            .columns()
            .iter()
            .map(|(name, sql_type)| format!("{} {}", name, sql_type))
            .collect();

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id TEXT PRIMARY KEY,
                    {},
                    imported_at TEXT NOT NULL
                )",
                collection.name(),
                columns.join(",\n                    ")
            ),
            [],
        )
        .with_context(|| format!("Failed to create table {}", collection.name()))?;
    }

    // ==========================================================================
    // Audit trail
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS import_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            collection TEXT NOT NULL,
            record_count INTEGER NOT NULL,
            actor TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_import_events_collection ON import_events(collection)",
        [],
    )?;

    Ok(())
}

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    conn.execute(
        "INSERT INTO import_events (
            event_id, timestamp, event_type, collection, record_count, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.collection,
            event.record_count,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Audit events for a collection, oldest first
pub fn get_events_for_collection(conn: &Connection, collection: Collection) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, collection, record_count, actor
         FROM import_events
         WHERE collection = ?1
         ORDER BY id ASC",
    )?;

    let events = stmt
        .query_map(params![collection.name()], |row| {
            let timestamp_str: String = row.get(1)?;
            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
                    })?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                collection: row.get(3)?,
                record_count: row.get(4)?,
                actor: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

/// Map a JSON field onto a SQLite value
fn to_sql_value(value: &serde_json::Value) -> SqlValue {
    match value {
        serde_json::Value::Null => SqlValue::Null,
        serde_json::Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        serde_json::Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

/// SqliteSink - records land in a local SQLite database
pub struct SqliteSink {
    conn: Connection,
    location: String,
    batch_size: usize,
}

impl SqliteSink {
    /// Open (or create) a database file and make sure the schema exists
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        setup_database(&conn)?;
        Ok(SqliteSink {
            conn,
            location: path.display().to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteSink {
            conn,
            location: ":memory:".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Row count of a collection's table
    pub fn count(&self, collection: Collection) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", collection.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl RecordSink for SqliteSink {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.location)
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn insert_batch(&mut self, collection: Collection, batch: &[Record]) -> Result<usize> {
        let columns = collection.columns();
        let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        let placeholders: Vec<String> = (1..=names.len() + 2).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} (id, {}, imported_at) VALUES ({})",
            collection.name(),
            names.join(", "),
            placeholders.join(", ")
        );
        let imported_at = Utc::now().to_rfc3339();

        // One transaction per batch
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for record in batch {
                if let Some(unknown) = record.keys().find(|key| !names.contains(&key.as_str())) {
                    bail!("Unknown field '{}' in {} record", unknown, collection.name());
                }

                let mut values = Vec::with_capacity(names.len() + 2);
                values.push(SqlValue::Text(uuid::Uuid::new_v4().to_string()));
                for name in &names {
                    values.push(record.get(*name).map(to_sql_value).unwrap_or(SqlValue::Null));
                }
                values.push(SqlValue::Text(imported_at.clone()));

                stmt.execute(params_from_iter(values))
                    .with_context(|| format!("Failed to insert {} record", collection.name()))?;
            }
        }
        insert_event(&tx, &Event::new("batch_inserted", collection, batch.len(), EVENT_ACTOR))?;
        tx.commit()?;

        Ok(batch.len())
    }

    fn clear_all(&mut self, collection: Collection) -> Result<()> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute(&format!("DELETE FROM {}", collection.name()), [])?;
        insert_event(&tx, &Event::new("collection_cleared", collection, removed, EVENT_ACTOR))?;
        tx.commit()?;
        info!(collection = collection.name(), removed, "collection cleared");
        Ok(())
    }
}

// ============================================================================
// JSON DIRECTORY
// ============================================================================

/// JsonDirSink - one pretty-printed JSON array per collection
pub struct JsonDirSink {
    dir: PathBuf,
    batch_size: usize,
}

impl JsonDirSink {
    /// Use `dir`, creating it when missing
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        Ok(JsonDirSink {
            dir: dir.to_path_buf(),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn collection_path(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.name()))
    }

    /// Everything stored for a collection so far
    pub fn read(&self, collection: Collection) -> Result<Vec<Record>> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON in {}", path.display()))
    }
}

impl RecordSink for JsonDirSink {
    fn describe(&self) -> String {
        format!("json:{}", self.dir.display())
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn insert_batch(&mut self, collection: Collection, batch: &[Record]) -> Result<usize> {
        let mut records = self.read(collection)?;
        records.extend(batch.iter().cloned());

        let path = self.collection_path(collection);
        let json = serde_json::to_string_pretty(&records)?;
        fs::write(&path, json).with_context(|| format!("Failed to write file: {}", path.display()))?;

        Ok(batch.len())
    }

    fn clear_all(&mut self, collection: Collection) -> Result<()> {
        let path = self.collection_path(collection);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove file: {}", path.display()))?;
        }
        info!(collection = collection.name(), "collection cleared");
        Ok(())
    }
}

// ============================================================================
// MEMORY
// ============================================================================

/// One call made against a MemorySink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkCall {
    Clear(Collection),
    Insert { collection: Collection, count: usize },
}

/// MemorySink - keeps records in memory and remembers every call
#[derive(Debug, Default)]
pub struct MemorySink {
    pub calls: Vec<SinkCall>,
    records: HashMap<Collection, Vec<Record>>,
    batch_size: Option<usize>,
    fail_on: Option<Collection>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Make every insert into `collection` fail
    pub fn failing_on(mut self, collection: Collection) -> Self {
        self.fail_on = Some(collection);
        self
    }

    /// Pre-load records, as if left over from an earlier import
    pub fn seed(&mut self, collection: Collection, records: Vec<Record>) {
        self.records.entry(collection).or_default().extend(records);
    }

    pub fn records(&self, collection: Collection) -> &[Record] {
        self.records.get(&collection).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl RecordSink for MemorySink {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    fn insert_batch(&mut self, collection: Collection, batch: &[Record]) -> Result<usize> {
        if self.fail_on == Some(collection) {
            bail!("{} is not accepting records", collection.name());
        }
        self.calls.push(SinkCall::Insert {
            collection,
            count: batch.len(),
        });
        self.records
            .entry(collection)
            .or_default()
            .extend(batch.iter().cloned());
        Ok(batch.len())
    }

    fn clear_all(&mut self, collection: Collection) -> Result<()> {
        self.calls.push(SinkCall::Clear(collection));
        self.records.remove(&collection);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
