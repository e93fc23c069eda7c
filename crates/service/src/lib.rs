//! Business operations for the medical-supply services on top of `models`.
//! - One service per domain, each over `Arc<dyn Table<_>>` handles.
//! - Storage is pluggable: DynamoDB in production, memory in tests and demos.
//! - Errors surface as `ServiceError`, mapped to HTTP by the server crate.

use std::path::Path;
use std::sync::Arc;

use configs::TableNames;
use serde::Serialize;

pub mod bulk;
pub mod caller;
pub mod clients;
pub mod errors;
pub mod identity;
pub mod orders;
pub mod products;
pub mod providers;
pub mod report;
pub mod sales_plans;
pub mod storage;
pub mod users;
pub mod vendors;
pub mod visits;
pub mod warehouses;

use models::client::Client;
use models::order::Order;
use models::product::Product;
use models::provider::Provider;
use models::sales_plan::SalesPlan;
use models::user::User;
use models::vendor::Vendor;
use models::visit::Visit;
use models::warehouse::Warehouse;
use models::Record;
use storage::{DynamoTable, MemoryTable, StoreError, Table};

/// Creation result: a message next to the stored record's fields.
#[derive(Debug, Clone, Serialize)]
pub struct Created<T> {
    pub message: String,
    #[serde(flatten)]
    pub record: T,
}

impl<T> Created<T> {
    pub fn new(message: impl Into<String>, record: T) -> Self {
        Self { message: message.into(), record }
    }
}

/// Case-insensitive sort by a name field.
pub(crate) fn sort_by_name<T>(items: &mut [T], name: impl Fn(&T) -> &str) {
    items.sort_by_cached_key(|item| name(item).to_lowercase());
}

/// One handle per table.
#[derive(Clone)]
pub struct Tables {
    pub clients: Arc<dyn Table<Client>>,
    pub providers: Arc<dyn Table<Provider>>,
    pub vendors: Arc<dyn Table<Vendor>>,
    pub products: Arc<dyn Table<Product>>,
    pub warehouses: Arc<dyn Table<Warehouse>>,
    pub orders: Arc<dyn Table<Order>>,
    pub sales_plans: Arc<dyn Table<SalesPlan>>,
    pub visits: Arc<dyn Table<Visit>>,
    pub users: Arc<dyn Table<User>>,
}

impl Tables {
    pub fn memory(names: &TableNames) -> Self {
        Self {
            clients: Arc::new(MemoryTable::<Client>::new(&names.clients)),
            providers: Arc::new(MemoryTable::<Provider>::new(&names.providers)),
            vendors: Arc::new(MemoryTable::<Vendor>::new(&names.vendors)),
            products: Arc::new(MemoryTable::<Product>::new(&names.products)),
            warehouses: Arc::new(MemoryTable::<Warehouse>::new(&names.warehouses)),
            orders: Arc::new(MemoryTable::<Order>::new(&names.orders)),
            sales_plans: Arc::new(MemoryTable::<SalesPlan>::new(&names.sales_plans)),
            visits: Arc::new(MemoryTable::<Visit>::new(&names.visits)),
            users: Arc::new(MemoryTable::<User>::new(&names.users)),
        }
    }

    /// Memory tables that load from and save to `<dir>/<table>.json`.
    pub async fn snapshots(names: &TableNames, dir: &Path) -> Result<Self, StoreError> {
        async fn open<T: Record>(dir: &Path, name: &str) -> Result<Arc<dyn Table<T>>, StoreError> {
            let table = MemoryTable::<T>::persistent(name, dir.join(format!("{name}.json"))).await?;
            Ok(Arc::new(table))
        }
        Ok(Self {
            clients: open(dir, &names.clients).await?,
            providers: open(dir, &names.providers).await?,
            vendors: open(dir, &names.vendors).await?,
            products: open(dir, &names.products).await?,
            warehouses: open(dir, &names.warehouses).await?,
            orders: open(dir, &names.orders).await?,
            sales_plans: open(dir, &names.sales_plans).await?,
            visits: open(dir, &names.visits).await?,
            users: open(dir, &names.users).await?,
        })
    }

    pub fn dynamo(client: aws_sdk_dynamodb::Client, names: &TableNames) -> Self {
        Self {
            clients: Arc::new(DynamoTable::<Client>::new(client.clone(), &names.clients)),
            providers: Arc::new(DynamoTable::<Provider>::new(client.clone(), &names.providers)),
            vendors: Arc::new(DynamoTable::<Vendor>::new(client.clone(), &names.vendors)),
            products: Arc::new(DynamoTable::<Product>::new(client.clone(), &names.products)),
            warehouses: Arc::new(DynamoTable::<Warehouse>::new(client.clone(), &names.warehouses)),
            orders: Arc::new(DynamoTable::<Order>::new(client.clone(), &names.orders)),
            sales_plans: Arc::new(DynamoTable::<SalesPlan>::new(client.clone(), &names.sales_plans)),
            visits: Arc::new(DynamoTable::<Visit>::new(client.clone(), &names.visits)),
            users: Arc::new(DynamoTable::<User>::new(client, &names.users)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Named {
        name: String,
    }

    #[test]
    fn created_flattens_the_record() {
        let body = serde_json::to_value(Created::new("done", Named { name: "x".into() })).unwrap();
        assert_eq!(body, serde_json::json!({"message": "done", "name": "x"}));
    }

    #[test]
    fn names_sort_case_insensitively() {
        let mut names = vec!["beta", "Alpha", "gamma", "Delta"];
        sort_by_name(&mut names, |n| *n);
        assert_eq!(names, vec!["Alpha", "beta", "Delta", "gamma"]);
    }

    #[tokio::test]
    async fn memory_tables_start_empty() {
        let tables = Tables::memory(&TableNames::default());
        assert!(tables.orders.scan(&storage::ScanFilter::all()).await.unwrap().is_empty());
        assert_eq!(tables.users.name(), TableNames::default().users);
    }
}
