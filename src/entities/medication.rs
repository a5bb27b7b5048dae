// 💊 Medication Entry
// One prescribed item from a doctor visit.

use super::Entity;
use crate::db::Collection;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedicationStatus {
    Active,
    Stopped,
}

impl MedicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MedicationStatus::Active => "active",
            MedicationStatus::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub entry_date: NaiveDate,
    pub prescribed_by: Option<String>,
    pub name: String,
    pub dose: Option<f64>,
    pub dose_unit: Option<String>,
    pub dose_count: Option<u32>,
    /// Reserved, never populated by the importer
    pub frequency: Option<String>,
    pub start_date: NaiveDate,
    /// Reserved, never populated by the importer
    pub end_date: Option<NaiveDate>,
    pub stop_date: Option<NaiveDate>,
    pub status: MedicationStatus,
    pub notes: Option<String>,
}

impl Entity for MedicationEntry {
    const COLLECTION: Collection = Collection::Medications;
}
