use std::sync::Arc;

use chrono::Utc;
use models::warehouse::{NewWarehouse, Warehouse};
use models::Record;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::storage::{ScanFilter, Table};
use crate::{sort_by_name, Created};

pub struct WarehouseService {
    table: Arc<dyn Table<Warehouse>>,
}

impl WarehouseService {
    pub fn new(table: Arc<dyn Table<Warehouse>>) -> Self {
        Self { table }
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewWarehouse) -> Result<Created<Warehouse>, ServiceError> {
        let warehouse = input.into_warehouse(Utc::now())?;
        if self.table.get(&warehouse.key()).await?.is_some() {
            return Err(ServiceError::conflict(format!("warehouse {} already exists", warehouse.id)));
        }
        self.table.insert(&warehouse).await?;
        info!(warehouse_id = %warehouse.id, capacity = warehouse.capacity, "warehouse_created");
        Ok(Created::new("Warehouse created successfully", warehouse))
    }

    pub async fn list(&self) -> Result<Vec<Warehouse>, ServiceError> {
        let mut warehouses = self.table.scan(&ScanFilter::all()).await?;
        sort_by_name(&mut warehouses, |w| w.name.as_str());
        Ok(warehouses)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Warehouse>, ServiceError> {
        Ok(self.table.get(&models::RecordKey::hash(id)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTable;

    fn input(id: &str, name: &str) -> NewWarehouse {
        NewWarehouse {
            id: Some(id.into()),
            name: Some(name.into()),
            address: Some("Av 68 # 10".into()),
            country: Some("Colombia".into()),
            city: Some("Bogota".into()),
            capacity: Some(1000),
        }
    }

    #[tokio::test]
    async fn create_get_and_conflict() -> Result<(), ServiceError> {
        let svc = WarehouseService::new(Arc::new(MemoryTable::<Warehouse>::new("Warehouses")));
        svc.create(input("WH-2", "Sur")).await?;
        svc.create(input("WH-1", "Norte")).await?;
        assert_eq!(svc.get("WH-1").await?.map(|w| w.name), Some("Norte".to_string()));
        assert!(matches!(svc.create(input("WH-1", "Again")).await, Err(ServiceError::Conflict(_))));
        let names: Vec<String> = svc.list().await?.into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["Norte", "Sur"]);
        Ok(())
    }
}
