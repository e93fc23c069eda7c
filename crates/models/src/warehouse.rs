use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::record::{Record, RecordKey, TableSpec};
use crate::validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: String,
    pub name: String,
    pub address: String,
    pub country: String,
    pub city: String,
    pub capacity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Warehouse {
    const TABLE: TableSpec = TableSpec { logical: "warehouses", partition_key: "id", sort_key: None };

    fn key(&self) -> RecordKey {
        RecordKey::hash(&self.id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewWarehouse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub capacity: Option<i64>,
}

impl NewWarehouse {
    pub fn into_warehouse(self, now: DateTime<Utc>) -> Result<Warehouse, ModelError> {
        let mut fields = Vec::with_capacity(5);
        for (field, value) in [
            ("id", &self.id),
            ("name", &self.name),
            ("address", &self.address),
            ("country", &self.country),
            ("city", &self.city),
        ] {
            let v = validate::required(field, value)?;
            validate::length(field, &v, 2, 100)?;
            fields.push(v);
        }
        let capacity = validate::min_i64("capacity", self.capacity, 1)?;
        let [id, name, address, country, city]: [String; 5] = fields
            .try_into()
            .map_err(|_| ModelError::Validation("warehouse: malformed input".into()))?;

        Ok(Warehouse { id, name, address, country, city, capacity, created_at: now, updated_at: now })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_warehouse() {
        let w = NewWarehouse {
            id: Some("WH-01".into()),
            name: Some("Bodega Norte".into()),
            address: Some("Cra 7 # 100".into()),
            country: Some("Colombia".into()),
            city: Some("Bogota".into()),
            capacity: Some(500),
        }
        .into_warehouse(Utc::now())
        .unwrap();
        assert_eq!(w.key(), RecordKey::hash("WH-01"));
        assert_eq!(w.created_at, w.updated_at);
    }

    #[test]
    fn capacity_must_be_positive() {
        let err = NewWarehouse {
            id: Some("WH-01".into()),
            name: Some("Bodega Norte".into()),
            address: Some("Cra 7 # 100".into()),
            country: Some("Colombia".into()),
            city: Some("Bogota".into()),
            capacity: Some(0),
        }
        .into_warehouse(Utc::now())
        .unwrap_err();
        assert_eq!(err.to_string(), "capacity: must be at least 1");
    }
}
