use std::sync::Arc;

use chrono::Utc;
use models::order::Order;
use models::sales_plan::{NewSalesPlan, SalesPlan};
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::report::{self, VendorReport};
use crate::storage::{ScanFilter, Table};
use crate::Created;

pub struct SalesPlanService {
    plans: Arc<dyn Table<SalesPlan>>,
    orders: Arc<dyn Table<Order>>,
}

impl SalesPlanService {
    pub fn new(plans: Arc<dyn Table<SalesPlan>>, orders: Arc<dyn Table<Order>>) -> Self {
        Self { plans, orders }
    }

    /// A vendor holds at most one plan per period.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewSalesPlan) -> Result<Created<SalesPlan>, ServiceError> {
        let plan = input.into_plan(Utc::now())?;
        let same_period = ScanFilter::all().eq("vendor_id", plan.vendor_id.as_str()).eq("period", plan.period.as_str());
        if !self.plans.scan(&same_period).await?.is_empty() {
            return Err(ServiceError::conflict(format!(
                "vendor {} already has a sales plan for {}",
                plan.vendor_id, plan.period
            )));
        }
        self.plans.insert(&plan).await?;
        info!(plan_id = %plan.plan_id, vendor_id = %plan.vendor_id, period = %plan.period, "sales_plan_created");
        Ok(Created::new("Sales plan created successfully", plan))
    }

    pub async fn list(&self) -> Result<Vec<SalesPlan>, ServiceError> {
        let mut plans = self.plans.scan(&ScanFilter::all()).await?;
        plans.sort_by(|a, b| a.vendor_id.cmp(&b.vendor_id).then_with(|| a.period.cmp(&b.period)));
        Ok(plans)
    }

    #[instrument(skip(self))]
    pub async fn report(&self, vendor_id: &str) -> Result<VendorReport, ServiceError> {
        let plans = self.plans.scan(&ScanFilter::all().eq("vendor_id", vendor_id)).await?;
        let mut orders = self.orders.scan(&ScanFilter::all().eq("id_vendor", vendor_id)).await?;
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let report = report::build(vendor_id, &plans, &orders);
        info!(plans = plans.len(), orders = orders.len(), pct = report.sales_percentage, "vendor_report_built");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTable;
    use models::order::{OrderLine, OrderStatus, Priority};
    use models::sales_plan::NewProductTarget;

    fn input(vendor: &str, period: &str, value: f64) -> NewSalesPlan {
        NewSalesPlan {
            vendor_id: Some(vendor.into()),
            period: Some(period.into()),
            region: Some("Caribe".into()),
            products: Some(vec![NewProductTarget {
                product_id: Some("p-1".into()),
                name: Some("Gasa".into()),
                target_units: Some(10),
                target_value: Some(value),
            }]),
        }
    }

    #[tokio::test]
    async fn one_plan_per_period_and_report() -> Result<(), ServiceError> {
        let orders = Arc::new(MemoryTable::<Order>::new("Orders"));
        let svc = SalesPlanService::new(Arc::new(MemoryTable::<SalesPlan>::new("SalesPlans")), orders.clone());

        svc.create(input("v-1", "q1-2025", 1000.0)).await?;
        let dup = svc.create(input("v-1", "Q1-2025", 5.0)).await.unwrap_err();
        assert!(matches!(dup, ServiceError::Conflict(_)));
        svc.create(input("v-1", "Q2-2025", 1000.0)).await?;
        svc.create(input("v-2", "Q1-2025", 1000.0)).await?;
        assert_eq!(svc.list().await?.len(), 3);

        let now = Utc::now();
        orders
            .insert(&Order {
                id: "o-1".into(),
                status: OrderStatus::Delivered,
                priority: Priority::Low,
                products: vec![OrderLine {
                    id: "p-1".into(),
                    name: "Gasa".into(),
                    amount: 5,
                    id_warehouse: "WH-01".into(),
                    unit_price: 100.0,
                }],
                id_client: "c-1".into(),
                id_vendor: "v-1".into(),
                country: String::new(),
                city: String::new(),
                address: String::new(),
                date_estimated: String::new(),
                created_at: now,
                updated_at: now,
            })
            .await?;

        let report = svc.report("v-1").await?;
        assert_eq!(report.target_value, 2000.0);
        assert_eq!(report.total_sales, 500.0);
        assert_eq!(report.sales_percentage, 25.0);
        assert_eq!(report.remaining_to_goal, 1500.0);

        let empty = svc.report("v-3").await?;
        assert_eq!(empty.sales_percentage, 0.0);
        assert_eq!(empty.ordered_products, 0);
        Ok(())
    }
}
