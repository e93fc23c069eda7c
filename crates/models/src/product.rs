use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::record::{Record, RecordKey, TableSpec};
use crate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    Disponible,
    Agotado,
    Vencido,
    Pendiente,
}

impl ProductStatus {
    pub const ALL: &'static [&'static str] = &["Disponible", "Agotado", "Vencido", "Pendiente"];

    pub fn parse(value: &str) -> Result<Self, ModelError> {
        match validate::one_of("status", value, Self::ALL)? {
            "Disponible" => Ok(Self::Disponible),
            "Agotado" => Ok(Self::Agotado),
            "Vencido" => Ok(Self::Vencido),
            _ => Ok(Self::Pendiente),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disponible => "Disponible",
            Self::Agotado => "Agotado",
            Self::Vencido => "Vencido",
            Self::Pendiente => "Pendiente",
        }
    }
}

/// A stocked product lot. Keyed by warehouse and sku.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub warehouse: String,
    pub sku: String,
    #[serde(default)]
    pub warehouse_name: String,
    pub provider_nit: String,
    pub name: String,
    pub product_type: String,
    pub stock: i64,
    pub expiration_date: String,
    pub temperature_required: f64,
    pub batch: String,
    pub status: ProductStatus,
    pub unit_value: f64,
    pub storage_conditions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Product {
    const TABLE: TableSpec = TableSpec { logical: "products", partition_key: "warehouse", sort_key: Some("sku") };

    fn key(&self) -> RecordKey {
        RecordKey::composite(&self.warehouse, &self.sku)
    }
}

/// Columns a product bulk file must carry. `warehouse` may come from the file
/// or from the upload form.
pub const BULK_COLUMNS: &[&str] = &[
    "provider_nit",
    "name",
    "product_type",
    "stock",
    "expiration_date",
    "temperature_required",
    "batch",
    "status",
    "unit_value",
    "storage_conditions",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub provider_nit: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub temperature_required: Option<f64>,
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub unit_value: Option<f64>,
    #[serde(default)]
    pub storage_conditions: Option<String>,
}

impl NewProduct {
    /// Validate against `today`; the expiration date must be strictly later.
    pub fn into_product(self, today: NaiveDate, now: DateTime<Utc>) -> Result<Product, ModelError> {
        let warehouse = validate::required("warehouse", &self.warehouse)?;
        let provider_nit = validate::required("provider_nit", &self.provider_nit)?;
        let name = validate::required("name", &self.name)?;
        let product_type = validate::required("product_type", &self.product_type)?;
        let expiration = validate::required("expiration_date", &self.expiration_date)?;
        let batch = validate::required("batch", &self.batch)?;
        let status = validate::required("status", &self.status)?;
        let storage_conditions = validate::required("storage_conditions", &self.storage_conditions)?;

        validate::exact_digits("provider_nit", &provider_nit, 10)?;
        validate::length("name", &name, 2, 255)?;
        validate::length("product_type", &product_type, 3, 100)?;
        let stock = validate::min_i64("stock", self.stock, 1)?;
        let expires = validate::date("expiration_date", &expiration)?;
        if expires <= today {
            return Err(ModelError::field("expiration_date", "must be later than today"));
        }
        let temperature_required = match self.temperature_required {
            Some(t) if t.is_finite() => t,
            Some(_) => return Err(ModelError::field("temperature_required", "must be a number")),
            None => return Err(ModelError::field("temperature_required", "is required")),
        };
        validate::length("batch", &batch, 2, 50)?;
        let status = ProductStatus::parse(&status)?;
        let unit_value = validate::min_f64("unit_value", self.unit_value, 0.01)?;
        validate::length("storage_conditions", &storage_conditions, 5, 255)?;

        Ok(Product {
            warehouse,
            sku: Uuid::new_v4().simple().to_string(),
            warehouse_name: String::new(),
            provider_nit,
            name,
            product_type,
            stock,
            expiration_date: expires.format("%Y-%m-%d").to_string(),
            temperature_required,
            batch,
            status,
            unit_value,
            storage_conditions,
            created_at: now,
            updated_at: now,
        })
    }
}
