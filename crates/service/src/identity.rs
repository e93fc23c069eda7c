//! Login identity registration for providers and vendors.

use async_trait::async_trait;
use common::user_api::UserApiClient;
use tracing::info;

use crate::errors::ServiceError;

#[async_trait]
pub trait IdentityRegistrar: Send + Sync {
    async fn register(&self, email: &str, role: &str) -> Result<(), ServiceError>;
}

/// Registers identities through the user service over HTTP.
pub struct HttpIdentityRegistrar {
    client: UserApiClient,
}

impl HttpIdentityRegistrar {
    pub fn new(client: UserApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityRegistrar for HttpIdentityRegistrar {
    async fn register(&self, email: &str, role: &str) -> Result<(), ServiceError> {
        self.client.create_identity(email, role).await?;
        info!(%email, %role, upstream = self.client.base_url(), "identity registered");
        Ok(())
    }
}

/// Used when no user service is configured.
pub struct NoopIdentityRegistrar;

#[async_trait]
impl IdentityRegistrar for NoopIdentityRegistrar {
    async fn register(&self, email: &str, role: &str) -> Result<(), ServiceError> {
        tracing::debug!(%email, %role, "identity registration skipped");
        Ok(())
    }
}

/// Recording registrar for tests.
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockIdentityRegistrar {
        pub registered: Mutex<Vec<(String, String)>>,
        pub fail: bool,
    }

    impl MockIdentityRegistrar {
        pub fn failing() -> Self {
            Self { registered: Mutex::default(), fail: true }
        }

        pub fn calls(&self) -> Vec<(String, String)> {
            self.registered.lock().map(|v| v.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl IdentityRegistrar for MockIdentityRegistrar {
        async fn register(&self, email: &str, role: &str) -> Result<(), ServiceError> {
            if self.fail {
                return Err(ServiceError::Upstream("unexpected status 500".into()));
            }
            if let Ok(mut v) = self.registered.lock() {
                v.push((email.to_string(), role.to_string()));
            }
            Ok(())
        }
    }
}
