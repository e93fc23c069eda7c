//! Record types stored in DynamoDB, their inbound payloads and validation.

pub mod client;
pub mod db;
pub mod errors;
pub mod order;
pub mod product;
pub mod provider;
pub mod record;
pub mod sales_plan;
pub mod user;
pub mod validate;
pub mod vendor;
pub mod visit;
pub mod warehouse;

pub use record::{Record, RecordKey, TableSpec};
