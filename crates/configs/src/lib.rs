use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dynamodb: DynamoConfig,
    #[serde(default)]
    pub services: UpstreamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub app: AppInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Which microservice this process serves: client, provider, vendor,
    /// product, order, user or all.
    #[serde(default = "default_service")]
    pub service: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4), service: default_service() }
    }
}

fn default_service() -> String { "all".into() }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Client,
    Provider,
    Vendor,
    Product,
    Order,
    User,
    All,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Client => "client",
            ServiceKind::Provider => "provider",
            ServiceKind::Vendor => "vendor",
            ServiceKind::Product => "product",
            ServiceKind::Order => "order",
            ServiceKind::User => "user",
            ServiceKind::All => "all",
        }
    }
}

impl FromStr for ServiceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" | "clients" => Ok(ServiceKind::Client),
            "provider" | "providers" => Ok(ServiceKind::Provider),
            "vendor" | "vendors" => Ok(ServiceKind::Vendor),
            "product" | "products" => Ok(ServiceKind::Product),
            "order" | "orders" => Ok(ServiceKind::Order),
            "user" | "users" => Ok(ServiceKind::User),
            "all" | "" => Ok(ServiceKind::All),
            other => Err(anyhow!("unknown service '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DynamoConfig {
    #[serde(default = "default_region")]
    pub region: String,
    /// Local endpoint override, e.g. `http://localhost:8000` for DynamoDB Local.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub auto_create_tables: bool,
    /// Keep tables in process memory instead of DynamoDB (local demos).
    #[serde(default)]
    pub in_memory: bool,
    /// With `in_memory`, snapshot each table as JSON under this directory.
    #[serde(default)]
    pub snapshot_dir: Option<String>,
    #[serde(default)]
    pub tables: TableNames,
}

impl Default for DynamoConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            auto_create_tables: false,
            in_memory: false,
            snapshot_dir: None,
            tables: TableNames::default(),
        }
    }
}

fn default_region() -> String { "us-east-1".into() }

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub clients: String,
    pub providers: String,
    pub vendors: String,
    pub products: String,
    pub warehouses: String,
    pub orders: String,
    pub sales_plans: String,
    pub visits: String,
    pub users: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            clients: "Clients".into(),
            providers: "Providers".into(),
            vendors: "Vendors".into(),
            products: "Products".into(),
            warehouses: "Warehouses".into(),
            orders: "Orders".into(),
            sales_plans: "SalesPlans".into(),
            visits: "Visits".into(),
            users: "Users".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpstreamConfig {
    /// Base URL of the user service; identities are registered there when set.
    #[serde(default)]
    pub user_api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppInfo {
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for AppInfo {
    fn default() -> Self { Self { version: default_version() } }
}

fn default_version() -> String { "1.0".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to defaults when the
    /// file is absent, then apply environment overrides.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_with(|key| std::env::var(key).ok())
    }

    /// Same as [`normalize_and_validate`](Self::normalize_and_validate) with an
    /// injectable environment lookup.
    pub fn normalize_with<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.server.apply_env(&env)?;
        self.server.normalize()?;
        self.dynamodb.apply_env(&env);
        self.dynamodb.validate()?;
        if let Some(url) = non_empty(env("USER_API_URL")) {
            self.services.user_api_url = Some(url);
        }
        self.services.user_api_url = self
            .services
            .user_api_url
            .take()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
        if let Some(v) = non_empty(env("VERSION")) {
            self.app.version = v;
        }
        if let Some(v) = non_empty(env("LOG_JSON")) {
            self.logging.json = truthy(&v);
        }
        Ok(())
    }

    pub fn service_kind(&self) -> Result<ServiceKind> {
        self.server.service.parse()
    }
}

impl ServerConfig {
    fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, env: &F) -> Result<()> {
        if let Some(host) = non_empty(env("SERVER_HOST")) {
            self.host = host;
        }
        if let Some(port) = non_empty(env("SERVER_PORT")) {
            self.port = port.parse().map_err(|_| anyhow!("SERVER_PORT must be a number in 1..=65535"))?;
        }
        if let Some(w) = non_empty(env("TOKIO_WORKER_THREADS")).and_then(|v| v.parse().ok()) {
            self.worker_threads = Some(w);
        }
        if let Some(service) = non_empty(env("SERVICE_NAME")) {
            self.service = service;
        }
        Ok(())
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        let kind: ServiceKind = self.service.parse()?;
        self.service = kind.as_str().to_string();
        Ok(())
    }
}

fn truthy(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

impl DynamoConfig {
    fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, env: &F) {
        if let Some(region) = non_empty(env("AWS_REGION")) {
            self.region = region;
        }
        if let Some(endpoint) = non_empty(env("DYNAMODB_ENDPOINT")) {
            self.endpoint = Some(endpoint);
        }
        if let Some(v) = non_empty(env("DYNAMODB_AUTO_CREATE")) {
            self.auto_create_tables = truthy(&v);
        }
        if let Some(v) = non_empty(env("DYNAMODB_IN_MEMORY")) {
            self.in_memory = truthy(&v);
        }
        if let Some(dir) = non_empty(env("DYNAMODB_SNAPSHOT_DIR")) {
            self.snapshot_dir = Some(dir);
        }
        let t = &mut self.tables;
        for (var, slot) in [
            ("CLIENTS_TABLE_NAME", &mut t.clients),
            ("PROVIDERS_TABLE_NAME", &mut t.providers),
            ("VENDORS_TABLE_NAME", &mut t.vendors),
            ("PRODUCTS_TABLE_NAME", &mut t.products),
            ("WAREHOUSES_TABLE_NAME", &mut t.warehouses),
            ("ORDERS_TABLE_NAME", &mut t.orders),
            ("SALES_PLANS_TABLE_NAME", &mut t.sales_plans),
            ("VISITS_TABLE_NAME", &mut t.visits),
            ("USERS_TABLE_NAME", &mut t.users),
        ] {
            if let Some(name) = non_empty(env(var)) {
                *slot = name;
            }
        }
        self.endpoint = self.endpoint.take().filter(|e| !e.trim().is_empty());
    }

    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(anyhow!("dynamodb.region is empty; set it in config.toml or AWS_REGION"));
        }
        if let Some(endpoint) = &self.endpoint {
            let lower = endpoint.to_lowercase();
            if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                return Err(anyhow!("dynamodb.endpoint must start with http:// or https://"));
            }
        }
        let t = &self.tables;
        for name in [
            &t.clients, &t.providers, &t.vendors, &t.products, &t.warehouses, &t.orders, &t.sales_plans, &t.visits,
            &t.users,
        ] {
            if name.trim().is_empty() {
                return Err(anyhow!("dynamodb.tables entries must not be empty"));
            }
        }
        Ok(())
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_empty_toml() {
        let mut cfg = parse("").unwrap();
        cfg.normalize_with(env_of(&[])).unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.dynamodb.region, "us-east-1");
        assert_eq!(cfg.dynamodb.tables.clients, "Clients");
        assert_eq!(cfg.service_kind().unwrap(), ServiceKind::All);
        assert!(cfg.services.user_api_url.is_none());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 3000
            service = "client"

            [dynamodb]
            region = "eu-west-1"
            "#,
        )
        .unwrap();
        cfg.normalize_with(env_of(&[
            ("AWS_REGION", "us-east-2"),
            ("DYNAMODB_ENDPOINT", "http://localhost:8000"),
            ("VENDORS_TABLE_NAME", "VendorsTest"),
            ("USER_API_URL", "http://users:3000/"),
            ("SERVICE_NAME", "vendors"),
        ]))
        .unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.service_kind().unwrap(), ServiceKind::Vendor);
        assert_eq!(cfg.dynamodb.region, "us-east-2");
        assert_eq!(cfg.dynamodb.endpoint.as_deref(), Some("http://localhost:8000"));
        assert_eq!(cfg.dynamodb.tables.vendors, "VendorsTest");
        assert_eq!(cfg.services.user_api_url.as_deref(), Some("http://users:3000"));
    }

    #[test]
    fn rejects_unknown_service_and_bad_endpoint() {
        let mut cfg = AppConfig::default();
        assert!(cfg.normalize_with(env_of(&[("SERVICE_NAME", "billing")])).is_err());

        let mut cfg = AppConfig::default();
        assert!(cfg.normalize_with(env_of(&[("DYNAMODB_ENDPOINT", "localhost:8000")])).is_err());
    }

    #[test]
    fn in_memory_switch() {
        let mut cfg = AppConfig::default();
        cfg.normalize_with(env_of(&[("DYNAMODB_IN_MEMORY", "TRUE"), ("DYNAMODB_SNAPSHOT_DIR", "/tmp/medsupply")]))
            .unwrap();
        assert!(cfg.dynamodb.in_memory);
        assert_eq!(cfg.dynamodb.snapshot_dir.as_deref(), Some("/tmp/medsupply"));
        assert!(!cfg.dynamodb.auto_create_tables);
    }

    #[test]
    fn zero_worker_threads_fall_back() {
        let mut cfg = AppConfig::default();
        cfg.server.worker_threads = Some(0);
        cfg.normalize_with(env_of(&[])).unwrap();
        assert_eq!(cfg.server.worker_threads, Some(4));
    }
}
