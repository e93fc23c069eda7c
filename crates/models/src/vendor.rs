use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::record::{Record, RecordKey, TableSpec};
use crate::validate;

pub const MAX_INSTITUTIONS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub institutions: Vec<String>,
}

impl Record for Vendor {
    const TABLE: TableSpec = TableSpec { logical: "vendors", partition_key: "email", sort_key: None };

    fn key(&self) -> RecordKey {
        RecordKey::hash(&self.email)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewVendor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub institutions: Option<Vec<String>>,
}

impl NewVendor {
    pub fn into_vendor(self) -> Result<Vendor, ModelError> {
        let name = validate::required("name", &self.name)?;
        let email = validate::required("email", &self.email)?;
        let email = validate::email("email", &email)?;
        validate::length("name", &name, 2, 255)?;

        let institutions: Vec<String> = self
            .institutions
            .unwrap_or_default()
            .into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();
        if institutions.len() > MAX_INSTITUTIONS {
            return Err(ModelError::field(
                "institutions",
                format!("a vendor can have at most {MAX_INSTITUTIONS} institutions"),
            ));
        }

        Ok(Vendor { vendor_id: Uuid::new_v4().to_string(), email, name, institutions })
    }
}
