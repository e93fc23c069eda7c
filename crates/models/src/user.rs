use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::record::{Record, RecordKey, TableSpec};
use crate::validate;

pub const ROLES: &[&str] = &["admin", "vendor", "client", "provider"];

/// Login identity. Credentials live in the identity provider; this table only
/// tracks which email holds which role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl Record for User {
    const TABLE: TableSpec = TableSpec { logical: "users", partition_key: "email", sort_key: None };

    fn key(&self) -> RecordKey {
        RecordKey::hash(&self.email)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

pub fn validate_email(email: &str) -> Result<String, ModelError> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(ModelError::field("email", "invalid email"));
    }
    Ok(email)
}

impl NewUser {
    pub fn into_user(self, now: DateTime<Utc>) -> Result<User, ModelError> {
        let email = validate_email(&validate::required("email", &self.email)?)?;
        let role = validate::required("role", &self.role)?.to_lowercase();
        let role = validate::one_of("role", &role, ROLES)?.to_string();
        Ok(User { user_id: Uuid::new_v4().to_string(), email, role, created_at: now })
    }
}
