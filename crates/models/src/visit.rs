use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::record::{Record, RecordKey, TableSpec};
use crate::validate;

/// Commercial visit logged by a vendor at a client site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub visit_id: String,
    pub vendor_id: String,
    pub client_id: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub visit_datetime: String,
    pub observations: String,
    #[serde(default)]
    pub bucket_data: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Visit {
    const TABLE: TableSpec = TableSpec { logical: "visits", partition_key: "visit_id", sort_key: None };

    fn key(&self) -> RecordKey {
        RecordKey::hash(&self.visit_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewVisit {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub visit_datetime: Option<String>,
    #[serde(default)]
    pub observations: Option<String>,
    #[serde(default)]
    pub bucket_data: Option<Vec<String>>,
}

impl NewVisit {
    pub fn into_visit(self, vendor_id: &str, now: DateTime<Utc>) -> Result<Visit, ModelError> {
        let vendor_id = vendor_id.trim();
        if vendor_id.is_empty() {
            return Err(ModelError::field("vendor_id", "is required"));
        }
        let client_id = validate::required("client_id", &self.client_id)?;
        let contact_name = validate::required("contact_name", &self.contact_name)?;
        let contact_phone = validate::required("contact_phone", &self.contact_phone)?;
        let visit_datetime = validate::required("visit_datetime", &self.visit_datetime)?;
        let observations = validate::required("observations", &self.observations)?;
        validate::datetime_prefix("visit_datetime", &visit_datetime)?;

        Ok(Visit {
            visit_id: Uuid::new_v4().to_string(),
            vendor_id: vendor_id.to_string(),
            client_id,
            contact_name,
            contact_phone,
            visit_datetime,
            observations,
            bucket_data: self.bucket_data.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }
}
