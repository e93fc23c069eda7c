use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use models::provider::{NewProvider, Provider, BULK_COLUMNS};
use models::Record;
use tracing::{info, instrument, warn};

use crate::bulk::{self, BulkReport, UploadedFile};
use crate::errors::ServiceError;
use crate::identity::IdentityRegistrar;
use crate::storage::{ScanFilter, StoreError, Table};
use crate::{sort_by_name, Created};

/// Minimum success rate for a provider upload to count as complete.
pub const BULK_SUCCESS_THRESHOLD: f64 = 95.0;

pub struct ProviderService {
    table: Arc<dyn Table<Provider>>,
    identities: Arc<dyn IdentityRegistrar>,
}

impl ProviderService {
    pub fn new(table: Arc<dyn Table<Provider>>, identities: Arc<dyn IdentityRegistrar>) -> Self {
        Self { table, identities }
    }

    /// Register a provider and its `provider` login identity.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewProvider) -> Result<Created<Provider>, ServiceError> {
        let provider = input.into_provider()?;
        if self.table.get(&provider.key()).await?.is_some() {
            return Err(ServiceError::conflict(format!("a provider with NIT {} already exists", provider.nit)));
        }
        self.identities.register(&provider.email, "provider").await?;
        match self.table.insert(&provider).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                // A concurrent create won; the identity above now has no record.
                warn!(email = %provider.email, role = "provider", "orphaned_identity");
                return Err(ServiceError::conflict(format!("a provider with NIT {} already exists", provider.nit)));
            }
            Err(e) => return Err(e.into()),
        }
        info!(provider_id = %provider.provider_id, "provider_created");
        Ok(Created::new("Provider created successfully", provider))
    }

    pub async fn list(&self) -> Result<Vec<Provider>, ServiceError> {
        let mut providers = self.table.scan(&ScanFilter::all()).await?;
        sort_by_name(&mut providers, |p| p.name.as_str());
        Ok(providers)
    }

    /// Load providers from a CSV or XLSX file. Rows that fail validation or
    /// repeat a NIT (in the file or the table) are rejected individually.
    #[instrument(skip(self, file), fields(filename = %file.filename, size = file.bytes.len()))]
    pub async fn bulk_upload(&self, file: UploadedFile) -> Result<BulkReport, ServiceError> {
        let started = Instant::now();
        let sheet = bulk::read_sheet(&file, BULK_COLUMNS)?;
        let total = sheet.rows.len();

        let mut seen: HashSet<String> = self
            .table
            .scan(&ScanFilter::all())
            .await?
            .into_iter()
            .map(|p| p.nit)
            .collect();

        let (valid, rejected) = bulk::partition(sheet, |row| {
            let input = NewProvider {
                name: bulk::cell(row, "name"),
                country: bulk::cell(row, "country"),
                nit: bulk::cell(row, "nit"),
                address: bulk::cell(row, "address"),
                email: bulk::cell(row, "email"),
                phone: bulk::cell(row, "phone"),
            };
            let provider = input.into_provider().map_err(|e| e.to_string())?;
            if !seen.insert(provider.nit.clone()) {
                return Err(format!("nit: duplicate NIT {}", provider.nit));
            }
            Ok(provider)
        });

        let successful = if valid.is_empty() { 0 } else { self.table.put_batch(&valid).await? };
        let report = BulkReport::new(total, successful, rejected, started);
        let message = if report.rate() >= BULK_SUCCESS_THRESHOLD {
            "Bulk upload completed successfully"
        } else {
            "Bulk upload completed partially"
        };
        if report.rejected > 0 {
            warn!(rejected = report.rejected, total, "provider rows rejected");
        }
        info!(total, successful, rate = %report.success_rate, "provider_bulk_upload");
        Ok(report.with_message(message))
    }
}
