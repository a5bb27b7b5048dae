// Entity Models
// The five normalized record types produced by the row parsers.
//
// Each entity:
// - Is built once by a parser and never mutated afterwards
// - Belongs to exactly one sink collection
// - Serializes to a flat key-value record (see db::Record)

pub mod diagnosis;
pub mod doctor_visit;
pub mod medication;
pub mod weight;

pub use diagnosis::{Diagnosis, DiagnosisStatus, DEFAULT_DIAGNOSIS_NAME};
pub use doctor_visit::DoctorVisit;
pub use lab_test::{LabCategory, LabTestResult};
pub use medication::{MedicationEntry, MedicationStatus};
pub use weight::{Meal, WeightEntry, WeightSource, WEIGHT_UNIT};

use crate::db::{Collection, Record};
use anyhow::{Context, Result};
use serde::Serialize;

/// An entity that can be handed to a record sink
pub trait Entity: Serialize {
    /// Target collection in the sink
    const COLLECTION: Collection;

    /// Flatten into a key-value record
    fn to_record(&self) -> Result<Record> {
        match serde_json::to_value(self)
            .with_context(|| format!("Failed to serialize {} record", Self::COLLECTION.name()))?
        {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(anyhow::anyhow!(
                "{} record serialized to a non-object value: {}",
                Self::COLLECTION.name(),
                other
            )),
        }
    }
}

/// Convert a slice of entities into sink records, preserving order
pub fn to_records<E: Entity>(entities: &[E]) -> Result<Vec<Record>> {
    entities.iter().map(Entity::to_record).collect()
}
