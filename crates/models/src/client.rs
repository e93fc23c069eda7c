use common::crypto::sha256_hex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::record::{Record, RecordKey, TableSpec};
use crate::validate;

pub const LEVELS: &[&str] = &["I", "II", "III", "IV"];

/// Institutional client (hospital, clinic, pharmacy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub client_id: String,
    pub tax_id: String,
    pub tax_id_encrypted: String,
    pub name: String,
    pub country: String,
    pub level: String,
    pub specialty: String,
    pub location: String,
}

impl Record for Client {
    const TABLE: TableSpec = TableSpec { logical: "clients", partition_key: "tax_id", sort_key: None };

    fn key(&self) -> RecordKey {
        RecordKey::hash(&self.tax_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewClient {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl NewClient {
    /// Validate, normalize and assign a fresh `client_id`.
    pub fn into_client(self) -> Result<Client, ModelError> {
        let name = validate::required("name", &self.name)?;
        let tax_id = validate::required("tax_id", &self.tax_id)?;
        let country = validate::required("country", &self.country)?.to_uppercase();
        let level = validate::required("level", &self.level)?.to_uppercase();
        let specialty = validate::required("specialty", &self.specialty)?;
        let location = validate::required("location", &self.location)?;

        validate::length("name", &name, 2, 255)?;
        validate::length("tax_id", &tax_id, 5, 20)?;
        validate::length("country", &country, 2, 2)?;
        validate::one_of("level", &level, LEVELS)?;
        validate::length("specialty", &specialty, 2, 100)?;
        validate::length("location", &location, 2, 255)?;
        validate::tax_id_for_country(&country, &tax_id)?;

        Ok(Client {
            client_id: Uuid::new_v4().to_string(),
            tax_id_encrypted: sha256_hex(&tax_id),
            tax_id,
            name,
            country,
            level,
            specialty,
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewClient {
        NewClient {
            name: Some(" Clinica Central ".into()),
            tax_id: Some("900123456".into()),
            country: Some("co".into()),
            level: Some("ii".into()),
            specialty: Some("Cardiology".into()),
            location: Some("Bogota".into()),
        }
    }

    #[test]
    fn normalizes_and_hashes() {
        let c = input().into_client().unwrap();
        assert_eq!(c.name, "Clinica Central");
        assert_eq!(c.country, "CO");
        assert_eq!(c.level, "II");
        assert_eq!(c.tax_id_encrypted, sha256_hex("900123456"));
        assert!(Uuid::parse_str(&c.client_id).is_ok());
        assert_eq!(c.key(), RecordKey::hash("900123456"));
    }

    #[test]
    fn each_missing_field_is_named() {
        for field in ["name", "tax_id", "country", "level", "specialty", "location"] {
            let mut i = input();
            match field {
                "name" => i.name = None,
                "tax_id" => i.tax_id = None,
                "country" => i.country = None,
                "level" => i.level = None,
                "specialty" => i.specialty = None,
                _ => i.location = None,
            }
            let err = i.into_client().unwrap_err();
            assert_eq!(err.to_string(), format!("{field}: is required"));
        }
    }

    #[test]
    fn rejects_bad_level_and_tax_id() {
        let mut i = input();
        i.level = Some("V".into());
        assert!(i.into_client().unwrap_err().to_string().starts_with("level:"));

        let mut i = input();
        i.tax_id = Some("12345".into());
        assert!(i.into_client().unwrap_err().to_string().starts_with("tax_id:"));
    }
}
