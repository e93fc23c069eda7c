use std::{collections::HashMap, marker::PhantomData, time::Duration};

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, ReturnValue, WriteRequest};
use aws_sdk_dynamodb::Client;
use models::{Record, RecordKey};
use serde_dynamo::{from_item, from_items, to_attribute_value, to_item};
use tracing::{debug, info, warn};

use super::{Condition, ScanFilter, StoreError, Table, Update};

type Item = HashMap<String, AttributeValue>;

/// DynamoDB allows at most 25 write requests per batch.
const BATCH_SIZE: usize = 25;
const BATCH_RETRIES: usize = 5;

/// A DynamoDB table holding records of type `T`.
pub struct DynamoTable<T> {
    client: Client,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> DynamoTable<T> {
    pub fn new(client: Client, name: impl Into<String>) -> Self {
        Self { client, name: name.into(), _marker: PhantomData }
    }

    fn key_item(&self, key: &RecordKey) -> Result<Item, StoreError> {
        let mut item = HashMap::new();
        item.insert(T::TABLE.partition_key.to_string(), AttributeValue::S(key.partition.clone()));
        match (T::TABLE.sort_key, &key.sort) {
            (Some(attr), Some(sort)) => {
                item.insert(attr.to_string(), AttributeValue::S(sort.clone()));
            }
            (None, None) => {}
            _ => return Err(StoreError::Codec(format!("key {key} does not match table {}", self.name))),
        }
        Ok(item)
    }
}

fn encode<T: Record>(record: &T) -> Result<Item, StoreError> {
    to_item(record).map_err(|e| StoreError::Codec(e.to_string()))
}

fn backend<E: std::fmt::Display>(op: &str) -> impl FnOnce(E) -> StoreError + '_ {
    move |e| StoreError::Backend(format!("{op}: {e}"))
}

/// `#attrN` / `:valN` placeholders for a scan filter.
fn filter_expression(filter: &ScanFilter) -> (String, HashMap<String, String>, HashMap<String, AttributeValue>) {
    let mut clauses = Vec::with_capacity(filter.conditions.len());
    let mut names = HashMap::new();
    let mut values = HashMap::new();
    for (i, condition) in filter.conditions.iter().enumerate() {
        let name = format!("#attr{i}");
        let value = format!(":val{i}");
        clauses.push(match condition {
            Condition::Eq(..) => format!("{name} = {value}"),
            Condition::Contains(..) => format!("contains({name}, {value})"),
        });
        names.insert(name, condition.attribute().to_string());
        values.insert(value, AttributeValue::S(condition.value().to_string()));
    }
    (clauses.join(" AND "), names, values)
}

/// `SET #u0 = #u0 + :u0, #u1 = :u1 ...`
fn update_expression(update: &Update) -> Result<(String, HashMap<String, String>, HashMap<String, AttributeValue>), StoreError> {
    let mut parts = Vec::new();
    let mut names = HashMap::new();
    let mut values = HashMap::new();
    let mut i = 0usize;
    for (attr, by) in &update.increments {
        let (n, v) = (format!("#u{i}"), format!(":u{i}"));
        parts.push(format!("{n} = {n} + {v}"));
        names.insert(n, attr.clone());
        values.insert(v, AttributeValue::N(by.to_string()));
        i += 1;
    }
    for (attr, value) in &update.sets {
        let (n, v) = (format!("#u{i}"), format!(":u{i}"));
        parts.push(format!("{n} = {v}"));
        names.insert(n, attr.clone());
        let av: AttributeValue = to_attribute_value(value).map_err(|e| StoreError::Codec(e.to_string()))?;
        values.insert(v, av);
        i += 1;
    }
    Ok((format!("SET {}", parts.join(", ")), names, values))
}

/// `attribute_exists(#pk) AND #g0 >= :g0 ...`; placeholders go into the
/// maps built by [`update_expression`].
fn guard_expression(
    update: &Update,
    names: &mut HashMap<String, String>,
    values: &mut HashMap<String, AttributeValue>,
) -> String {
    let mut clauses = vec!["attribute_exists(#pk)".to_string()];
    for (i, (attr, min)) in update.at_least.iter().enumerate() {
        let (n, v) = (format!("#g{i}"), format!(":g{i}"));
        clauses.push(format!("{n} >= {v}"));
        names.insert(n, attr.clone());
        values.insert(v, AttributeValue::N(min.to_string()));
    }
    clauses.join(" AND ")
}

#[async_trait]
impl<T: Record> Table<T> for DynamoTable<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<T>, StoreError> {
        let response = self
            .client
            .get_item()
            .table_name(&self.name)
            .set_key(Some(self.key_item(key)?))
            .send()
            .await
            .map_err(backend("get_item"))?;
        match response.item {
            Some(item) => Ok(Some(from_item(item).map_err(|e| StoreError::Codec(e.to_string()))?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, record: &T) -> Result<(), StoreError> {
        let result = self
            .client
            .put_item()
            .table_name(&self.name)
            .set_item(Some(encode(record)?))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", T::TABLE.partition_key)
            .send()
            .await;
        match result {
            Ok(_) => {
                debug!(table = %self.name, key = %record.key(), "item inserted");
                Ok(())
            }
            Err(e) if e.as_service_error().map(|se| se.is_conditional_check_failed_exception()).unwrap_or(false) => {
                Err(StoreError::Conflict(record.key().to_string()))
            }
            Err(e) => Err(backend("put_item")(e)),
        }
    }

    async fn put(&self, record: &T) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.name)
            .set_item(Some(encode(record)?))
            .send()
            .await
            .map_err(backend("put_item"))?;
        Ok(())
    }

    async fn put_batch(&self, records: &[T]) -> Result<usize, StoreError> {
        for chunk in records.chunks(BATCH_SIZE) {
            let mut pending = chunk
                .iter()
                .map(|r| {
                    let put = PutRequest::builder()
                        .set_item(Some(encode(r)?))
                        .build()
                        .map_err(|e| StoreError::Codec(e.to_string()))?;
                    Ok(WriteRequest::builder().put_request(put).build())
                })
                .collect::<Result<Vec<_>, StoreError>>()?;

            let mut attempt = 0;
            while !pending.is_empty() {
                if attempt == BATCH_RETRIES {
                    return Err(StoreError::Backend(format!(
                        "batch_write_item: {} items still unprocessed after {BATCH_RETRIES} attempts",
                        pending.len()
                    )));
                }
                if attempt > 0 {
                    warn!(table = %self.name, attempt, unprocessed = pending.len(), "retrying unprocessed batch items");
                    tokio::time::sleep(Duration::from_millis(50 << attempt)).await;
                }
                let response = self
                    .client
                    .batch_write_item()
                    .request_items(&self.name, pending)
                    .send()
                    .await
                    .map_err(backend("batch_write_item"))?;
                pending = response
                    .unprocessed_items
                    .and_then(|mut m| m.remove(&self.name))
                    .unwrap_or_default();
                attempt += 1;
            }
        }
        info!(table = %self.name, count = records.len(), "batch written");
        Ok(records.len())
    }

    async fn scan(&self, filter: &ScanFilter) -> Result<Vec<T>, StoreError> {
        let mut items: Vec<Item> = Vec::new();
        let mut last_evaluated_key = None;
        let expression = (!filter.is_empty()).then(|| filter_expression(filter));

        loop {
            let mut scan = self.client.scan().table_name(&self.name);

            if let Some((expr, names, values)) = &expression {
                scan = scan
                    .filter_expression(expr)
                    .set_expression_attribute_names(Some(names.clone()))
                    .set_expression_attribute_values(Some(values.clone()));
            }

            if let Some(key) = last_evaluated_key {
                scan = scan.set_exclusive_start_key(Some(key));
            }

            let response = scan.send().await.map_err(backend("scan"))?;

            if let Some(new_items) = response.items {
                items.extend(new_items);
            }

            last_evaluated_key = response.last_evaluated_key;

            if last_evaluated_key.is_none() {
                break;
            }
        }

        from_items(items).map_err(|e| StoreError::Codec(e.to_string()))
    }

    async fn update(&self, key: &RecordKey, update: &Update) -> Result<Option<T>, StoreError> {
        if update.is_empty() {
            return self.get(key).await;
        }
        let (expr, mut names, mut values) = update_expression(update)?;
        names.insert("#pk".to_string(), T::TABLE.partition_key.to_string());
        let condition = guard_expression(update, &mut names, &mut values);
        let result = self
            .client
            .update_item()
            .table_name(&self.name)
            .set_key(Some(self.key_item(key)?))
            .update_expression(expr)
            .condition_expression(condition)
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;
        match result {
            Ok(output) => match output.attributes {
                Some(item) => Ok(Some(from_item(item).map_err(|e| StoreError::Codec(e.to_string()))?)),
                None => Ok(None),
            },
            Err(e) if e.as_service_error().map(|se| se.is_conditional_check_failed_exception()).unwrap_or(false) => {
                // Either the item is missing or a guard failed.
                if update.at_least.is_empty() || self.get(key).await?.is_none() {
                    Ok(None)
                } else {
                    Err(StoreError::GuardFailed(format!("{key}: update guard not met")))
                }
            }
            Err(e) => Err(backend("update_item")(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scan_filter_placeholders() {
        let filter = ScanFilter::all().eq("provider_nit", "9001234567").contains("name", "Guantes");
        let (expr, names, values) = filter_expression(&filter);
        assert_eq!(expr, "#attr0 = :val0 AND contains(#attr1, :val1)");
        assert_eq!(names["#attr1"], "name");
        assert_eq!(values[":val0"], AttributeValue::S("9001234567".into()));
    }

    #[test]
    fn update_placeholders() {
        let update = Update::new().increment("stock", 5).set("status", json!("SHIPPED"));
        let (expr, names, values) = update_expression(&update).unwrap();
        assert_eq!(expr, "SET #u0 = #u0 + :u0, #u1 = :u1");
        assert_eq!(names["#u0"], "stock");
        assert_eq!(values[":u0"], AttributeValue::N("5".into()));
        assert_eq!(values[":u1"], AttributeValue::S("SHIPPED".into()));
    }

    #[test]
    fn guard_placeholders() {
        let update = Update::new().increment("stock", -4).at_least("stock", 4);
        let (_, mut names, mut values) = update_expression(&update).unwrap();
        let condition = guard_expression(&update, &mut names, &mut values);
        assert_eq!(condition, "attribute_exists(#pk) AND #g0 >= :g0");
        assert_eq!(names["#g0"], "stock");
        assert_eq!(values[":g0"], AttributeValue::N("4".into()));
    }
}
