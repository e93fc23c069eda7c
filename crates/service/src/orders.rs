use std::sync::Arc;

use chrono::Utc;
use models::order::{NewOrder, Order, OrderStatus};
use models::RecordKey;
use tracing::{info, instrument, warn};

use crate::caller::Caller;
use crate::errors::ServiceError;
use crate::storage::{ScanFilter, Table, Update};
use crate::Created;

pub struct OrderService {
    table: Arc<dyn Table<Order>>,
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

impl OrderService {
    pub fn new(table: Arc<dyn Table<Order>>) -> Self {
        Self { table }
    }

    /// Place an order on behalf of `caller`. Clients order for themselves;
    /// vendors order for the client named in the body.
    #[instrument(skip(self, input), fields(caller = %caller.sub, role = %caller.role))]
    pub async fn create(&self, input: NewOrder, caller: &Caller) -> Result<Created<Order>, ServiceError> {
        let mut order = input.into_order(Utc::now())?;
        if caller.has_role("client") {
            order.id_client = caller.sub.clone();
            order.id_vendor = String::new();
        } else if caller.has_role("vendor") {
            order.id_vendor = caller.sub.clone();
        } else {
            warn!(role = %caller.role, "order rejected for role");
            return Err(ServiceError::Forbidden(format!("role '{}' cannot place orders", caller.role)));
        }
        self.table.insert(&order).await?;
        info!(order_id = %order.id, lines = order.products.len(), "order_created");
        Ok(Created::new("Order created successfully", order))
    }

    pub async fn list(&self) -> Result<Vec<Order>, ServiceError> {
        let mut orders = self.table.scan(&ScanFilter::all()).await?;
        newest_first(&mut orders);
        Ok(orders)
    }

    pub async fn get(&self, id: &str) -> Result<Order, ServiceError> {
        self.table.get(&RecordKey::hash(id)).await?.ok_or_else(|| ServiceError::not_found("order"))
    }

    pub async fn by_client(&self, client_id: &str) -> Result<Vec<Order>, ServiceError> {
        let mut orders = self.table.scan(&ScanFilter::all().eq("id_client", client_id)).await?;
        newest_first(&mut orders);
        Ok(orders)
    }

    pub async fn by_vendor(&self, vendor_id: &str) -> Result<Vec<Order>, ServiceError> {
        let mut orders = self.table.scan(&ScanFilter::all().eq("id_vendor", vendor_id)).await?;
        newest_first(&mut orders);
        Ok(orders)
    }

    #[instrument(skip(self))]
    pub async fn update_status(&self, id: &str, status: &str) -> Result<Order, ServiceError> {
        let status = OrderStatus::parse(status)?;
        let update = Update::new().set("status", status.as_str()).set("updated_at", Utc::now().to_rfc3339());
        let order = self
            .table
            .update(&RecordKey::hash(id), &update)
            .await?
            .ok_or_else(|| ServiceError::not_found("order"))?;
        info!(order_id = %order.id, status = status.as_str(), "order_status_updated");
        Ok(order)
    }
}
