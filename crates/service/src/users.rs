use std::sync::Arc;

use chrono::Utc;
use models::user::{NewUser, User};
use models::{Record, RecordKey};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::errors::ServiceError;
use crate::storage::Table;
use crate::Created;

#[derive(Debug, Clone, Serialize)]
pub struct FailedUser {
    pub email: Option<String>,
    pub role: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkUsers {
    pub created: Vec<Created<User>>,
    pub failed: Vec<FailedUser>,
}

pub struct UserService {
    table: Arc<dyn Table<User>>,
}

fn text(record: &Value, field: &str) -> Option<String> {
    record.get(field).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

impl UserService {
    pub fn new(table: Arc<dyn Table<User>>) -> Self {
        Self { table }
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewUser) -> Result<Created<User>, ServiceError> {
        let user = input.into_user(Utc::now())?;
        if self.table.get(&user.key()).await?.is_some() {
            return Err(ServiceError::conflict(format!("user {} already exists", user.email)));
        }
        self.table.insert(&user).await?;
        info!(user_id = %user.user_id, role = %user.role, "user_created");
        Ok(Created::new("User created successfully", user))
    }

    pub async fn find(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.table.get(&RecordKey::hash(email.trim().to_lowercase())).await?)
    }

    /// Create every user listed under `users` in `payload`. One failure does
    /// not stop the rest; each is reported with its reason.
    #[instrument(skip(self, payload))]
    pub async fn bulk_create(&self, payload: &Value) -> Result<BulkUsers, ServiceError> {
        let records = payload
            .get("users")
            .and_then(Value::as_array)
            .ok_or_else(|| ServiceError::Validation("users: must be a list".to_string()))?;

        let mut created = Vec::new();
        let mut failed = Vec::new();
        for record in records {
            let (email, role) = (text(record, "email"), text(record, "role"));
            if email.is_none() || role.is_none() {
                failed.push(FailedUser { email, role, reason: "Missing email or role".to_string() });
                continue;
            }
            match self.create(NewUser { email: email.clone(), role: role.clone() }).await {
                Ok(user) => created.push(user),
                Err(e) => {
                    warn!(error = %e, "bulk user rejected");
                    failed.push(FailedUser { email, role, reason: e.to_string() });
                }
            }
        }
        info!(created = created.len(), failed = failed.len(), "user_bulk_create");
        Ok(BulkUsers { created, failed })
    }
}
