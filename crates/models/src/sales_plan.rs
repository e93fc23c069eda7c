use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::record::{Record, RecordKey, TableSpec};
use crate::validate;

pub const MAX_TARGETS: usize = 100;

/// Per product sales target inside a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTarget {
    pub product_id: String,
    pub name: String,
    pub target_units: i64,
    pub target_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPlan {
    pub plan_id: String,
    pub vendor_id: String,
    pub period: String,
    pub region: String,
    pub products: Vec<ProductTarget>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for SalesPlan {
    const TABLE: TableSpec = TableSpec { logical: "sales_plans", partition_key: "plan_id", sort_key: None };

    fn key(&self) -> RecordKey {
        RecordKey::hash(&self.plan_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProductTarget {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_units: Option<i64>,
    #[serde(default)]
    pub target_value: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSalesPlan {
    #[serde(default)]
    pub vendor_id: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub products: Option<Vec<NewProductTarget>>,
}

impl NewSalesPlan {
    pub fn into_plan(self, now: DateTime<Utc>) -> Result<SalesPlan, ModelError> {
        let vendor_id = validate::required("vendor_id", &self.vendor_id)?;
        let period = validate::required("period", &self.period)?.to_uppercase();
        let region = validate::required("region", &self.region)?;
        validate::length("period", &period, 3, 50)?;
        validate::length("region", &region, 2, 100)?;

        let targets = self.products.ok_or_else(|| ModelError::field("products", "is required"))?;
        if targets.is_empty() || targets.len() > MAX_TARGETS {
            return Err(ModelError::field("products", format!("must contain between 1 and {MAX_TARGETS} products")));
        }
        let products = targets
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                let field = |name: &str| format!("products[{i}].{name}");
                Ok(ProductTarget {
                    product_id: validate::required(&field("product_id"), &t.product_id)?,
                    name: validate::required(&field("name"), &t.name)?,
                    target_units: validate::min_i64(&field("target_units"), t.target_units, 1)?,
                    target_value: validate::min_f64(&field("target_value"), t.target_value, 0.0)?,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        Ok(SalesPlan {
            plan_id: Uuid::new_v4().to_string(),
            vendor_id,
            period,
            region,
            products,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(units: i64, value: f64) -> NewProductTarget {
        NewProductTarget {
            product_id: Some("p1".into()),
            name: Some("Mouse".into()),
            target_units: Some(units),
            target_value: Some(value),
        }
    }

    #[test]
    fn period_is_uppercased() {
        let plan = NewSalesPlan {
            vendor_id: Some("v1".into()),
            period: Some("q1-2025".into()),
            region: Some("Norte".into()),
            products: Some(vec![target(10, 25000.0)]),
        }
        .into_plan(Utc::now())
        .unwrap();
        assert_eq!(plan.period, "Q1-2025");
        assert_eq!(plan.products.len(), 1);
    }

    #[test]
    fn target_bounds() {
        let base = || NewSalesPlan {
            vendor_id: Some("v1".into()),
            period: Some("Q1-2025".into()),
            region: Some("Norte".into()),
            products: None,
        };
        assert_eq!(base().into_plan(Utc::now()).unwrap_err().to_string(), "products: is required");

        let mut p = base();
        p.products = Some(vec![target(0, 1.0)]);
        assert_eq!(p.into_plan(Utc::now()).unwrap_err().to_string(), "products[0].target_units: must be at least 1");

        let mut p = base();
        p.products = Some((0..101).map(|_| target(1, 1.0)).collect());
        assert!(p.into_plan(Utc::now()).is_err());
    }
}
