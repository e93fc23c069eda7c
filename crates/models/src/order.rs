use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::record::{Record, RecordKey, TableSpec};
use crate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    pub const ALL: &'static [&'static str] =
        &["PENDING", "CONFIRMED", "PROCESSING", "SHIPPED", "DELIVERED", "CANCELLED", "RETURNED"];

    pub fn parse(value: &str) -> Result<Self, ModelError> {
        let upper = value.trim().to_uppercase();
        Ok(match validate::one_of("status", &upper, Self::ALL)? {
            "PENDING" => Self::Pending,
            "CONFIRMED" => Self::Confirmed,
            "PROCESSING" => Self::Processing,
            "SHIPPED" => Self::Shipped,
            "DELIVERED" => Self::Delivered,
            "CANCELLED" => Self::Cancelled,
            _ => Self::Returned,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Returned => "RETURNED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: &'static [&'static str] = &["LOW", "MEDIUM", "HIGH"];

    pub fn parse(value: &str) -> Result<Self, ModelError> {
        Ok(match validate::one_of("priority", value.trim(), Self::ALL)? {
            "LOW" => Self::Low,
            "MEDIUM" => Self::Medium,
            _ => Self::High,
        })
    }
}

/// One product line embedded in an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: String,
    pub name: String,
    pub amount: i64,
    pub id_warehouse: String,
    pub unit_price: f64,
}

impl OrderLine {
    pub fn subtotal(&self) -> f64 {
        self.amount as f64 * self.unit_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    pub priority: Priority,
    pub products: Vec<OrderLine>,
    #[serde(default)]
    pub id_client: String,
    #[serde(default)]
    pub id_vendor: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub date_estimated: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Order {
    const TABLE: TableSpec = TableSpec { logical: "orders", partition_key: "id", sort_key: None };

    fn key(&self) -> RecordKey {
        RecordKey::hash(&self.id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrderLine {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub id_warehouse: Option<String>,
    #[serde(default)]
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrder {
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub products: Option<Vec<NewOrderLine>>,
    #[serde(default)]
    pub id_client: Option<String>,
    #[serde(default)]
    pub id_vendor: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub date_estimated: Option<String>,
}

impl NewOrder {
    /// Validated order in `PENDING` state. Client and vendor ids are taken
    /// from the body as-is; callers override them from the caller identity.
    pub fn into_order(self, now: DateTime<Utc>) -> Result<Order, ModelError> {
        let priority = Priority::parse(&validate::required("priority", &self.priority)?)?;
        let lines = match self.products {
            None => return Err(ModelError::field("products", "is required")),
            Some(lines) if lines.is_empty() => {
                return Err(ModelError::field("products", "must contain at least one product"))
            }
            Some(lines) => lines,
        };
        let products = lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| line.validate(i))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Order {
            id: Uuid::new_v4().to_string(),
            status: OrderStatus::Pending,
            priority,
            products,
            id_client: validate::optional(&self.id_client),
            id_vendor: validate::optional(&self.id_vendor),
            country: validate::optional(&self.country),
            city: validate::optional(&self.city),
            address: validate::optional(&self.address),
            date_estimated: validate::optional(&self.date_estimated),
            created_at: now,
            updated_at: now,
        })
    }
}

impl NewOrderLine {
    fn validate(self, index: usize) -> Result<OrderLine, ModelError> {
        let field = |name: &str| format!("products[{index}].{name}");
        Ok(OrderLine {
            id: validate::required(&field("id"), &self.id)?,
            name: validate::required(&field("name"), &self.name)?,
            amount: validate::min_i64(&field("amount"), self.amount, 1)?,
            id_warehouse: validate::required(&field("id_warehouse"), &self.id_warehouse)?,
            unit_price: validate::min_f64(&field("unit_price"), self.unit_price, 0.0)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(amount: i64) -> NewOrderLine {
        NewOrderLine {
            id: Some("p1".into()),
            name: Some("Mouse".into()),
            amount: Some(amount),
            id_warehouse: Some("WH-01".into()),
            unit_price: Some(100.0),
        }
    }

    #[test]
    fn new_orders_start_pending() {
        let o = NewOrder {
            priority: Some("HIGH".into()),
            products: Some(vec![line(2)]),
            city: Some(" Bogota ".into()),
            ..Default::default()
        }
        .into_order(Utc::now())
        .unwrap();
        assert_eq!(o.status, OrderStatus::Pending);
        assert_eq!(o.priority, Priority::High);
        assert_eq!(o.city, "Bogota");
        assert_eq!(o.products[0].subtotal(), 200.0);
    }

    #[test]
    fn priority_and_products_required() {
        let err = NewOrder { products: Some(vec![line(1)]), ..Default::default() }.into_order(Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "priority: is required");

        let err = NewOrder { priority: Some("URGENT".into()), products: Some(vec![line(1)]), ..Default::default() }
            .into_order(Utc::now())
            .unwrap_err();
        assert!(err.to_string().starts_with("priority: must be one of"));

        let err = NewOrder { priority: Some("LOW".into()), products: Some(vec![]), ..Default::default() }
            .into_order(Utc::now())
            .unwrap_err();
        assert!(err.to_string().starts_with("products:"));
    }

    #[test]
    fn line_amount_must_be_positive() {
        let err = NewOrder { priority: Some("LOW".into()), products: Some(vec![line(1), line(0)]), ..Default::default() }
            .into_order(Utc::now())
            .unwrap_err();
        assert_eq!(err.to_string(), "products[1].amount: must be at least 1");
    }

    #[test]
    fn status_parsing() {
        assert_eq!(OrderStatus::parse("shipped").unwrap(), OrderStatus::Shipped);
        assert!(OrderStatus::parse("LOST").is_err());
        assert_eq!(serde_json::to_value(OrderStatus::Cancelled).unwrap(), "CANCELLED");
    }
}
