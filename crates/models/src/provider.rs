use common::crypto::sha256_hex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::record::{Record, RecordKey, TableSpec};
use crate::validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub provider_id: String,
    pub nit: String,
    pub nit_encrypted: String,
    pub name: String,
    pub country: String,
    pub address: String,
    pub email: String,
    pub phone: String,
}

impl Record for Provider {
    const TABLE: TableSpec = TableSpec { logical: "providers", partition_key: "nit", sort_key: None };

    fn key(&self) -> RecordKey {
        RecordKey::hash(&self.nit)
    }
}

/// Columns expected in a provider bulk file, in order.
pub const BULK_COLUMNS: &[&str] = &["name", "country", "nit", "address", "email", "phone"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProvider {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub nit: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewProvider {
    pub fn into_provider(self) -> Result<Provider, ModelError> {
        let name = validate::required("name", &self.name)?;
        let country = validate::required("country", &self.country)?.to_uppercase();
        let nit = validate::required("nit", &self.nit)?;
        let address = validate::required("address", &self.address)?;
        let email = validate::required("email", &self.email)?;
        let phone = validate::required("phone", &self.phone)?;

        validate::length("name", &name, 2, 255)?;
        validate::length("country", &country, 2, 2)?;
        validate::exact_digits("nit", &nit, 10)?;
        validate::length("address", &address, 5, 255)?;
        let email = validate::email("email", &email)?;
        validate::exact_digits("phone", &phone, 10)?;

        Ok(Provider {
            provider_id: Uuid::new_v4().to_string(),
            nit_encrypted: sha256_hex(&nit),
            nit,
            name,
            country,
            address,
            email,
            phone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewProvider {
        NewProvider {
            name: Some("MedSupplies SAS".into()),
            country: Some("co".into()),
            nit: Some("9001234567".into()),
            address: Some("Calle 1 # 2-3".into()),
            email: Some("Ventas@MedSupplies.co".into()),
            phone: Some("3001234567".into()),
        }
    }

    #[test]
    fn valid_provider() {
        let p = input().into_provider().unwrap();
        assert_eq!(p.email, "ventas@medsupplies.co");
        assert_eq!(p.country, "CO");
        assert_eq!(p.nit_encrypted.len(), 64);
    }

    #[test]
    fn nit_phone_and_email_rules() {
        let mut i = input();
        i.nit = Some("123".into());
        assert_eq!(i.into_provider().unwrap_err().to_string(), "nit: must be exactly 10 digits");

        let mut i = input();
        i.phone = Some("300-123-45".into());
        assert!(i.into_provider().unwrap_err().to_string().starts_with("phone:"));

        let mut i = input();
        i.email = Some("not-an-email".into());
        assert_eq!(i.into_provider().unwrap_err().to_string(), "email: invalid email format");
    }
}
