use std::sync::Arc;

use service::clients::ClientService;
use service::identity::IdentityRegistrar;
use service::orders::OrderService;
use service::products::ProductService;
use service::providers::ProviderService;
use service::sales_plans::SalesPlanService;
use service::users::UserService;
use service::vendors::VendorService;
use service::visits::VisitService;
use service::warehouses::WarehouseService;
use service::Tables;

/// Shared handler state: one service per domain over the same tables.
#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub clients: Arc<ClientService>,
    pub providers: Arc<ProviderService>,
    pub vendors: Arc<VendorService>,
    pub warehouses: Arc<WarehouseService>,
    pub products: Arc<ProductService>,
    pub orders: Arc<OrderService>,
    pub sales_plans: Arc<SalesPlanService>,
    pub visits: Arc<VisitService>,
    pub users: Arc<UserService>,
}

impl AppState {
    pub fn new(app_name: impl Into<String>, tables: Tables, identities: Arc<dyn IdentityRegistrar>) -> Self {
        let warehouses = Arc::new(WarehouseService::new(tables.warehouses));
        Self {
            app_name: app_name.into(),
            clients: Arc::new(ClientService::new(tables.clients)),
            providers: Arc::new(ProviderService::new(tables.providers, identities.clone())),
            vendors: Arc::new(VendorService::new(tables.vendors, identities)),
            products: Arc::new(ProductService::new(tables.products, warehouses.clone())),
            warehouses,
            orders: Arc::new(OrderService::new(tables.orders.clone())),
            sales_plans: Arc::new(SalesPlanService::new(tables.sales_plans, tables.orders)),
            visits: Arc::new(VisitService::new(tables.visits)),
            users: Arc::new(UserService::new(tables.users)),
        }
    }
}
