use std::sync::Arc;

use models::client::{Client, NewClient};
use models::Record;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::storage::{ScanFilter, Table};
use crate::{sort_by_name, Created};

pub struct ClientService {
    table: Arc<dyn Table<Client>>,
}

impl ClientService {
    pub fn new(table: Arc<dyn Table<Client>>) -> Self {
        Self { table }
    }

    /// Register an institutional client. The tax id is the table key, so a
    /// second registration with the same tax id is a conflict.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewClient) -> Result<Created<Client>, ServiceError> {
        let client = input.into_client()?;
        if self.table.get(&client.key()).await?.is_some() {
            return Err(ServiceError::conflict(format!("a client with tax_id {} already exists", client.tax_id)));
        }
        self.table.insert(&client).await?;
        info!(client_id = %client.client_id, country = %client.country, "client_created");
        Ok(Created::new("Client created successfully", client))
    }

    pub async fn list(&self) -> Result<Vec<Client>, ServiceError> {
        let mut clients = self.table.scan(&ScanFilter::all()).await?;
        sort_by_name(&mut clients, |c| c.name.as_str());
        Ok(clients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTable;

    fn input(name: &str, tax_id: &str) -> NewClient {
        NewClient {
            name: Some(name.into()),
            tax_id: Some(tax_id.into()),
            country: Some("CO".into()),
            level: Some("I".into()),
            specialty: Some("Pediatrics".into()),
            location: Some("Medellin".into()),
        }
    }

    fn service() -> ClientService {
        ClientService::new(Arc::new(MemoryTable::<Client>::new("Clients")))
    }

    #[tokio::test]
    async fn create_then_list_sorted() -> Result<(), ServiceError> {
        let svc = service();
        assert!(svc.list().await?.is_empty());
        let created = svc.create(input("zeta Clinic", "900000001")).await?;
        assert_eq!(created.message, "Client created successfully");
        svc.create(input("Alpha Hospital", "900000002")).await?;
        svc.create(input("beta Care", "900000003")).await?;
        let names: Vec<String> = svc.list().await?.into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Alpha Hospital", "beta Care", "zeta Clinic"]);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_tax_id_conflicts() -> Result<(), ServiceError> {
        let svc = service();
        svc.create(input("Alpha Hospital", "900000002")).await?;
        let err = svc.create(input("Other", "900000002")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        Ok(())
    }
}
