//! Vendor performance report: sales recorded in orders against the targets of
//! the vendor's sales plans.

use std::collections::{HashMap, HashSet};

use models::order::Order;
use models::sales_plan::SalesPlan;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoldProduct {
    pub id: String,
    pub name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorReport {
    pub vendor_id: String,
    pub ordered_products: usize,
    pub customers_served: usize,
    pub total_sales: f64,
    pub total_units_sold: i64,
    pub target_units: i64,
    pub target_value: f64,
    pub remaining_to_goal: f64,
    pub sales_percentage: f64,
    pub sold_products: Vec<SoldProduct>,
}

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Aggregate `plans` and `orders` of one vendor. Products keep the order in
/// which they first appear; the latest name seen for an id wins.
pub fn build(vendor_id: &str, plans: &[SalesPlan], orders: &[Order]) -> VendorReport {
    let targets = plans.iter().flat_map(|p| p.products.iter());
    let (target_units, target_value) =
        targets.fold((0i64, 0.0f64), |(units, value), t| (units + t.target_units, value + t.target_value));

    let customers: HashSet<&str> =
        orders.iter().map(|o| o.id_client.as_str()).filter(|c| !c.is_empty()).collect();

    let mut sold: Vec<SoldProduct> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut total_sales = 0.0;
    let mut total_units_sold = 0;
    for line in orders.iter().flat_map(|o| o.products.iter()) {
        match index.get(line.id.as_str()) {
            Some(&i) => {
                sold[i].name = line.name.clone();
                sold[i].quantity += line.amount;
            }
            None => {
                index.insert(line.id.as_str(), sold.len());
                sold.push(SoldProduct { id: line.id.clone(), name: line.name.clone(), quantity: line.amount });
            }
        }
        total_units_sold += line.amount;
        total_sales += line.subtotal();
    }

    let sales_percentage = if target_value > 0.0 { total_sales / target_value * 100.0 } else { 0.0 };
    VendorReport {
        vendor_id: vendor_id.to_string(),
        ordered_products: orders.len(),
        customers_served: customers.len(),
        total_sales: round2(total_sales),
        total_units_sold,
        target_units,
        target_value: round2(target_value),
        remaining_to_goal: round2((target_value - total_sales).max(0.0)),
        sales_percentage: round2(sales_percentage),
        sold_products: sold,
    }
}
