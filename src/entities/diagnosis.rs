// 🩺 Diagnosis
// Short label plus the full comment text from a doctor visit.

use super::Entity;
use crate::db::Collection;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Label used when the first clause of the comment text is empty
pub const DEFAULT_DIAGNOSIS_NAME: &str = "Doctor visit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosisStatus {
    Active,
    Resolved,
    Monitoring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub entry_date: NaiveDate,
    pub name: String,
    pub diagnosis_date: NaiveDate,
    pub status: DiagnosisStatus,
    pub provider: Option<String>,
    pub notes: String,
}

impl Diagnosis {
    /// Imported diagnoses always start out as "monitoring"
    pub fn monitoring(entry_date: NaiveDate, name: String, provider: Option<String>, notes: String) -> Self {
        Diagnosis {
            entry_date,
            name,
            diagnosis_date: entry_date,
            status: DiagnosisStatus::Monitoring,
            provider,
            notes,
        }
    }
}

impl Entity for Diagnosis {
    const COLLECTION: Collection = Collection::Diagnoses;
}
