use std::sync::Arc;

use models::vendor::{NewVendor, Vendor};
use models::Record;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::errors::ServiceError;
use crate::identity::IdentityRegistrar;
use crate::storage::{ScanFilter, StoreError, Table};
use crate::{sort_by_name, Created};

#[derive(Debug, Clone, Serialize)]
pub struct VendorClients {
    pub vendor_id: String,
    pub institutions: Vec<String>,
}

pub struct VendorService {
    table: Arc<dyn Table<Vendor>>,
    identities: Arc<dyn IdentityRegistrar>,
}

impl VendorService {
    pub fn new(table: Arc<dyn Table<Vendor>>, identities: Arc<dyn IdentityRegistrar>) -> Self {
        Self { table, identities }
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewVendor) -> Result<Created<Vendor>, ServiceError> {
        let vendor = input.into_vendor()?;
        if self.table.get(&vendor.key()).await?.is_some() {
            return Err(ServiceError::conflict(format!("the email {} is already registered", vendor.email)));
        }
        self.identities.register(&vendor.email, "vendor").await?;
        match self.table.insert(&vendor).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                // A concurrent create won; the identity above now has no record.
                warn!(email = %vendor.email, role = "vendor", "orphaned_identity");
                return Err(ServiceError::conflict(format!("the email {} is already registered", vendor.email)));
            }
            Err(e) => return Err(e.into()),
        }
        info!(vendor_id = %vendor.vendor_id, institutions = vendor.institutions.len(), "vendor_created");
        Ok(Created::new("Vendor created successfully", vendor))
    }

    pub async fn list(&self) -> Result<Vec<Vendor>, ServiceError> {
        let mut vendors = self.table.scan(&ScanFilter::all()).await?;
        sort_by_name(&mut vendors, |v| v.name.as_str());
        Ok(vendors)
    }

    /// Institutions assigned to the vendor with `vendor_id`.
    pub async fn clients_of(&self, vendor_id: &str) -> Result<VendorClients, ServiceError> {
        let vendor = self
            .table
            .scan(&ScanFilter::all().eq("vendor_id", vendor_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::not_found("vendor"))?;
        Ok(VendorClients { vendor_id: vendor.vendor_id, institutions: vendor.institutions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::mock::MockIdentityRegistrar;
    use crate::storage::MemoryTable;

    fn service() -> (VendorService, Arc<MockIdentityRegistrar>) {
        let registrar = Arc::new(MockIdentityRegistrar::default());
        (VendorService::new(Arc::new(MemoryTable::<Vendor>::new("Vendors")), registrar.clone()), registrar)
    }

    fn input(name: &str, email: &str) -> NewVendor {
        NewVendor { name: Some(name.into()), email: Some(email.into()), institutions: Some(vec!["c-1".into()]) }
    }

    #[tokio::test]
    async fn create_list_and_clients() -> Result<(), ServiceError> {
        let (svc, registrar) = service();
        let created = svc.create(input("Marta", "Marta@Sales.co")).await?;
        svc.create(input("Andres", "andres@sales.co")).await?;
        assert_eq!(registrar.calls().len(), 2);
        assert_eq!(registrar.calls()[0].1, "vendor");

        let names: Vec<String> = svc.list().await?.into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["Andres", "Marta"]);

        let clients = svc.clients_of(&created.record.vendor_id).await?;
        assert_eq!(clients.institutions, vec!["c-1"]);
        assert!(matches!(svc.clients_of("nope").await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn losing_a_create_race_is_a_conflict() -> Result<(), ServiceError> {
        use crate::storage::testing::LateWriterTable;

        let registrar = Arc::new(MockIdentityRegistrar::default());
        let svc = VendorService::new(Arc::new(LateWriterTable(MemoryTable::<Vendor>::new("Vendors"))), registrar.clone());
        svc.create(input("Marta", "marta@sales.co")).await?;
        let err = svc.create(input("Marta 2", "marta@sales.co")).await.unwrap_err();
        assert_eq!(err.to_string(), "the email marta@sales.co is already registered");
        assert_eq!(registrar.calls().len(), 2);
        assert_eq!(svc.list().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn email_is_unique_case_insensitively() -> Result<(), ServiceError> {
        let (svc, _) = service();
        svc.create(input("Marta", "marta@sales.co")).await?;
        let err = svc.create(input("Marta 2", "MARTA@sales.co")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        Ok(())
    }
}
