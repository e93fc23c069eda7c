use std::sync::Arc;

use chrono::Utc;
use models::visit::{NewVisit, Visit};
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::storage::{ScanFilter, Table};
use crate::Created;

pub struct VisitService {
    table: Arc<dyn Table<Visit>>,
}

impl VisitService {
    pub fn new(table: Arc<dyn Table<Visit>>) -> Self {
        Self { table }
    }

    /// Record a commercial visit made by `vendor_id`.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewVisit, vendor_id: &str) -> Result<Created<Visit>, ServiceError> {
        let visit = input.into_visit(vendor_id, Utc::now())?;
        self.table.insert(&visit).await?;
        info!(visit_id = %visit.visit_id, client_id = %visit.client_id, "visit_created");
        Ok(Created::new("Visit created successfully", visit))
    }

    /// Visits of `vendor_id`, most recent visit first.
    pub async fn by_vendor(&self, vendor_id: &str) -> Result<Vec<Visit>, ServiceError> {
        let mut visits = self.table.scan(&ScanFilter::all().eq("vendor_id", vendor_id)).await?;
        visits.sort_by(|a, b| b.visit_datetime.cmp(&a.visit_datetime));
        Ok(visits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTable;

    fn input(at: &str) -> NewVisit {
        NewVisit {
            client_id: Some("c-1".into()),
            contact_name: Some("Dra. Lopez".into()),
            contact_phone: Some("3001112233".into()),
            visit_datetime: Some(at.into()),
            observations: Some("Interested in gauze".into()),
            bucket_data: None,
        }
    }

    #[tokio::test]
    async fn visits_belong_to_the_caller() -> Result<(), ServiceError> {
        let svc = VisitService::new(Arc::new(MemoryTable::<Visit>::new("Visits")));
        svc.create(input("2025-03-01T10:00:00"), "v-1").await?;
        svc.create(input("2025-03-05T09:30:00"), "v-1").await?;
        svc.create(input("2025-03-02T08:00:00"), "v-2").await?;

        let mine = svc.by_vendor("v-1").await?;
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].visit_datetime, "2025-03-05T09:30:00");
        assert!(mine[0].bucket_data.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn missing_vendor_is_a_validation_error() {
        let svc = VisitService::new(Arc::new(MemoryTable::<Visit>::new("Visits")));
        let err = svc.create(input("2025-03-01T10:00:00"), "  ").await.unwrap_err();
        assert_eq!(err.to_string(), "vendor_id: is required");
    }
}
