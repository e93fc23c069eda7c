use anyhow::Context;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::types::{AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType};
use aws_sdk_dynamodb::Client;
use configs::{DynamoConfig, TableNames};
use tracing::info;

use crate::record::{Record, TableSpec};
use crate::{client, order, product, provider, sales_plan, user, vendor, visit, warehouse};

/// Build a DynamoDB client for the configured region. An endpoint override
/// (DynamoDB Local) gets static dummy credentials.
pub async fn connect(cfg: &DynamoConfig) -> anyhow::Result<Client> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(cfg.region.clone()));
    if let Some(endpoint) = &cfg.endpoint {
        loader = loader
            .endpoint_url(endpoint)
            .credentials_provider(Credentials::new("dummy", "dummy", None, None, "static"));
    }
    let sdk_config = loader.load().await;
    info!(region = %cfg.region, endpoint = cfg.endpoint.as_deref().unwrap_or("aws"), "dynamodb client ready");
    Ok(Client::new(&sdk_config))
}

/// Physical table name paired with its key layout, for every record type.
pub fn table_plan(names: &TableNames) -> Vec<(String, TableSpec)> {
    vec![
        (names.clients.clone(), client::Client::TABLE),
        (names.providers.clone(), provider::Provider::TABLE),
        (names.vendors.clone(), vendor::Vendor::TABLE),
        (names.products.clone(), product::Product::TABLE),
        (names.warehouses.clone(), warehouse::Warehouse::TABLE),
        (names.orders.clone(), order::Order::TABLE),
        (names.sales_plans.clone(), sales_plan::SalesPlan::TABLE),
        (names.visits.clone(), visit::Visit::TABLE),
        (names.users.clone(), user::User::TABLE),
    ]
}

async fn existing_tables(client: &Client) -> anyhow::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut start: Option<String> = None;
    loop {
        let resp = client
            .list_tables()
            .set_exclusive_start_table_name(start.take())
            .send()
            .await
            .context("list_tables")?;
        names.extend(resp.table_names().iter().cloned());
        match resp.last_evaluated_table_name() {
            Some(last) => start = Some(last.to_string()),
            None => break,
        }
    }
    Ok(names)
}

/// Create each missing table (pay per request, string keys). Returns the
/// names that were created.
pub async fn ensure_tables(client: &Client, plan: &[(String, TableSpec)]) -> anyhow::Result<Vec<String>> {
    let existing = existing_tables(client).await?;
    let mut created = Vec::new();
    for (name, spec) in plan {
        if existing.contains(name) {
            info!(table = %name, "table exists");
            continue;
        }

        let mut attribute_definitions = vec![AttributeDefinition::builder()
            .attribute_name(spec.partition_key)
            .attribute_type(ScalarAttributeType::S)
            .build()?];
        let mut key_schema =
            vec![KeySchemaElement::builder().attribute_name(spec.partition_key).key_type(KeyType::Hash).build()?];
        if let Some(sort_key) = spec.sort_key {
            attribute_definitions
                .push(AttributeDefinition::builder().attribute_name(sort_key).attribute_type(ScalarAttributeType::S).build()?);
            key_schema.push(KeySchemaElement::builder().attribute_name(sort_key).key_type(KeyType::Range).build()?);
        }

        client
            .create_table()
            .table_name(name)
            .billing_mode(BillingMode::PayPerRequest)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .send()
            .await
            .with_context(|| format!("create_table {name}"))?;
        info!(table = %name, logical = spec.logical, "table created");
        created.push(name.clone());
    }
    Ok(created)
}
