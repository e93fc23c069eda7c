use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use models::product::{NewProduct, Product};
use models::warehouse::{NewWarehouse, Warehouse};
use serde::Deserialize;
use service::bulk::BulkReport;
use service::products::ProductQuery;
use service::Created;

use crate::errors::ApiError;
use crate::extract::{read_upload, JsonBody};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/search", get(search))
        .route("/detail/:sku", get(detail))
        .route("/bulk", post(bulk))
        .route("/warehouses", get(list_warehouses).post(create_warehouse))
        .route("/:warehouse/:sku/stock", patch(adjust_stock))
}

#[derive(Debug, Deserialize)]
struct StockDelta {
    delta: Option<i64>,
}

async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewProduct>,
) -> Result<(StatusCode, Json<Created<Product>>), ApiError> {
    let created = state.products.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.products.list().await?))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.products.search(&query).await?))
}

async fn detail(State(state): State<AppState>, Path(sku): Path<String>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.products.detail(&sku).await?))
}

async fn adjust_stock(
    State(state): State<AppState>,
    Path((warehouse, sku)): Path<(String, String)>,
    JsonBody(body): JsonBody<StockDelta>,
) -> Result<Json<Product>, ApiError> {
    let delta = body.delta.ok_or_else(|| ApiError::bad_request("delta: is required"))?;
    Ok(Json(state.products.adjust_stock(&warehouse, &sku, delta).await?))
}

async fn bulk(State(state): State<AppState>, multipart: Multipart) -> Result<Json<BulkReport>, ApiError> {
    let upload = read_upload(multipart).await?;
    let warehouse = upload.field("warehouse");
    Ok(Json(state.products.bulk_upload(upload.file, warehouse).await?))
}

async fn create_warehouse(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewWarehouse>,
) -> Result<(StatusCode, Json<Created<Warehouse>>), ApiError> {
    let created = state.warehouses.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_warehouses(State(state): State<AppState>) -> Result<Json<Vec<Warehouse>>, ApiError> {
    Ok(Json(state.warehouses.list().await?))
}
