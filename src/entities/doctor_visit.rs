use super::Entity;
use crate::db::Collection;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Summary of one doctor visit row, emitted for every row with a usable date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorVisit {
    pub visit_date: NaiveDate,
    pub doctor: String,
    pub diagnosis_summary: Option<String>,
    pub medications_summary: Option<String>,
    /// yes / no / unknown
    pub completed: Option<bool>,
    pub weight_value: Option<f64>,
    pub weight_unit: Option<String>,
    pub notes: Option<String>,
}

impl Entity for DoctorVisit {
    const COLLECTION: Collection = Collection::DoctorVisits;
}
