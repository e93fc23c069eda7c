use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use models::product::{NewProduct, Product, ProductStatus, BULK_COLUMNS};
use models::{Record, RecordKey};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::bulk::{self, BulkReport, Row, UploadedFile};
use crate::errors::ServiceError;
use crate::storage::{ScanFilter, StoreError, Table, Update};
use crate::warehouses::WarehouseService;
use crate::{sort_by_name, Created};

/// Optional search filters; all given filters must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub product_name: Option<String>,
    pub batch: Option<String>,
    pub status: Option<String>,
    pub warehouse_name: Option<String>,
}

impl ProductQuery {
    fn filter(&self) -> ScanFilter {
        let given = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        let mut filter = ScanFilter::all();
        if let Some(name) = given(&self.product_name) {
            filter = filter.contains("name", name);
        }
        if let Some(batch) = given(&self.batch) {
            filter = filter.eq("batch", batch);
        }
        if let Some(status) = given(&self.status) {
            filter = filter.eq("status", status);
        }
        if let Some(warehouse) = given(&self.warehouse_name) {
            filter = filter.contains("warehouse_name", warehouse);
        }
        filter
    }
}

pub struct ProductService {
    table: Arc<dyn Table<Product>>,
    warehouses: Arc<WarehouseService>,
}

/// Identity of a stocked lot: the same provider, name and batch in one
/// warehouse.
type LotKey = (String, String, String, String);

fn lot_key(p: &Product) -> LotKey {
    (p.warehouse.clone(), p.provider_nit.clone(), p.name.clone(), p.batch.clone())
}

impl ProductService {
    pub fn new(table: Arc<dyn Table<Product>>, warehouses: Arc<WarehouseService>) -> Self {
        Self { table, warehouses }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    async fn find_lot(&self, product: &Product) -> Result<Option<Product>, ServiceError> {
        let filter = ScanFilter::all()
            .eq("warehouse", product.warehouse.as_str())
            .eq("provider_nit", product.provider_nit.as_str())
            .eq("name", product.name.as_str())
            .eq("batch", product.batch.as_str());
        Ok(self.table.scan(&filter).await?.into_iter().next())
    }

    async fn warehouse_name(&self, warehouse: &str) -> Result<String, ServiceError> {
        Ok(self.warehouses.get(warehouse).await?.map(|w| w.name).unwrap_or_default())
    }

    /// Store a product lot. A lot already in the same warehouse with the same
    /// provider NIT, name and batch gets its stock increased instead of a new
    /// sku; a sold-out lot becomes available again.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewProduct) -> Result<Created<Product>, ServiceError> {
        let mut product = input.into_product(Self::today(), Utc::now())?;

        if let Some(existing) = self.find_lot(&product).await? {
            let mut update = Update::new()
                .increment("stock", product.stock)
                .set("updated_at", Utc::now().to_rfc3339());
            if existing.status == ProductStatus::Agotado && product.stock > 0 {
                update = update.set("status", ProductStatus::Disponible.as_str());
            }
            let updated = self
                .table
                .update(&existing.key(), &update)
                .await?
                .ok_or_else(|| ServiceError::not_found("product"))?;
            info!(sku = %updated.sku, stock = updated.stock, "product_stock_increased");
            return Ok(Created::new(format!("Stock updated to {} units", updated.stock), updated));
        }

        product.warehouse_name = self.warehouse_name(&product.warehouse).await?;
        self.table.insert(&product).await?;
        info!(sku = %product.sku, warehouse = %product.warehouse, "product_created");
        Ok(Created::new("Product created successfully", product))
    }

    pub async fn list(&self) -> Result<Vec<Product>, ServiceError> {
        let mut products = self.table.scan(&ScanFilter::all()).await?;
        sort_by_name(&mut products, |p| p.name.as_str());
        Ok(products)
    }

    pub async fn search(&self, query: &ProductQuery) -> Result<Vec<Product>, ServiceError> {
        let mut products = self.table.scan(&query.filter()).await?;
        sort_by_name(&mut products, |p| p.name.as_str());
        Ok(products)
    }

    /// Every lot carrying `sku` (one per warehouse at most).
    pub async fn detail(&self, sku: &str) -> Result<Vec<Product>, ServiceError> {
        let mut products = self.table.scan(&ScanFilter::all().eq("sku", sku)).await?;
        if products.is_empty() {
            return Err(ServiceError::not_found("product"));
        }
        sort_by_name(&mut products, |p| p.name.as_str());
        Ok(products)
    }

    /// Add `delta` (possibly negative) units. Stock never drops below zero:
    /// the bound is checked by the store in the same write. A lot that
    /// reaches zero is marked `Agotado`, and `Agotado` lots that get stock
    /// back become `Disponible`.
    #[instrument(skip(self))]
    pub async fn adjust_stock(&self, warehouse: &str, sku: &str, delta: i64) -> Result<Product, ServiceError> {
        let key = RecordKey::composite(warehouse, sku);
        let mut update = Update::new().increment("stock", delta).set("updated_at", Utc::now().to_rfc3339());
        if delta < 0 {
            update = update.at_least("stock", -delta);
        }
        let updated = match self.table.update(&key, &update).await {
            Ok(Some(p)) => p,
            Ok(None) => return Err(ServiceError::not_found("product")),
            Err(StoreError::GuardFailed(_)) => {
                let available = self.table.get(&key).await?.map(|p| p.stock).unwrap_or(0);
                return Err(ServiceError::Validation(format!(
                    "delta: insufficient stock ({available} available, {} requested)",
                    -delta
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let status = match updated.stock {
            0 if updated.status != ProductStatus::Agotado => Some(ProductStatus::Agotado),
            n if n > 0 && updated.status == ProductStatus::Agotado => Some(ProductStatus::Disponible),
            _ => None,
        };
        let updated = match status {
            Some(status) => self
                .table
                .update(&key, &Update::new().set("status", status.as_str()))
                .await?
                .ok_or_else(|| ServiceError::not_found("product"))?,
            None => updated,
        };
        info!(sku, warehouse, delta, stock = updated.stock, "product_stock_adjusted");
        Ok(updated)
    }

    /// Load product lots from a CSV or XLSX file. `default_warehouse` is used
    /// for rows without a `warehouse` column value.
    #[instrument(skip(self, file), fields(filename = %file.filename, size = file.bytes.len()))]
    pub async fn bulk_upload(
        &self,
        file: UploadedFile,
        default_warehouse: Option<String>,
    ) -> Result<BulkReport, ServiceError> {
        let started = Instant::now();
        let sheet = bulk::read_sheet(&file, BULK_COLUMNS)?;
        let total = sheet.rows.len();
        let today = Self::today();
        let now = Utc::now();

        let mut lots: HashSet<LotKey> = self.table.scan(&ScanFilter::all()).await?.iter().map(lot_key).collect();

        let (mut valid, rejected) = bulk::partition(sheet, |row| {
            let input = row_to_input(row, default_warehouse.as_deref())?;
            let product = input.into_product(today, now).map_err(|e| e.to_string())?;
            if !lots.insert(lot_key(&product)) {
                return Err("duplicate product: provider_nit, name and batch already exist in this warehouse".to_string());
            }
            Ok(product)
        });

        for product in valid.iter_mut() {
            product.warehouse_name = self.warehouse_name(&product.warehouse).await?;
        }
        let successful = if valid.is_empty() { 0 } else { self.table.put_batch(&valid).await? };
        let report = BulkReport::new(total, successful, rejected, started);
        let message = if report.rejected == 0 { "Bulk upload completed" } else { "Bulk upload completed partially" };
        if report.rejected > 0 {
            warn!(rejected = report.rejected, total, "product rows rejected");
        }
        info!(total, successful, rate = %report.success_rate, "product_bulk_upload");
        Ok(report.with_message(message))
    }
}

fn parse_int(value: &str) -> Option<i64> {
    value.parse::<i64>().ok().or_else(|| {
        let f = value.parse::<f64>().ok()?;
        (f.fract() == 0.0 && f.is_finite()).then_some(f as i64)
    })
}

fn parse_number<T>(row: &Row, column: &str, parse: impl Fn(&str) -> Option<T>) -> Result<Option<T>, String> {
    match bulk::cell(row, column) {
        None => Ok(None),
        Some(v) => parse(&v).map(Some).ok_or_else(|| format!("{column}: must be a number")),
    }
}

fn row_to_input(row: &Row, default_warehouse: Option<&str>) -> Result<NewProduct, String> {
    Ok(NewProduct {
        warehouse: bulk::cell(row, "warehouse").or_else(|| default_warehouse.map(str::to_string)),
        provider_nit: bulk::cell(row, "provider_nit"),
        name: bulk::cell(row, "name"),
        product_type: bulk::cell(row, "product_type"),
        stock: parse_number(row, "stock", parse_int)?,
        // Spreadsheets often hand dates back as "2030-01-31 00:00:00".
        expiration_date: bulk::cell(row, "expiration_date").map(|d| d.chars().take(10).collect()),
        temperature_required: parse_number(row, "temperature_required", |v| v.parse::<f64>().ok())?,
        batch: bulk::cell(row, "batch"),
        status: bulk::cell(row, "status"),
        unit_value: parse_number(row, "unit_value", |v| v.parse::<f64>().ok())?,
        storage_conditions: bulk::cell(row, "storage_conditions"),
    })
}
