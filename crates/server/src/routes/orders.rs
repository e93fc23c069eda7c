use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use models::order::{NewOrder, Order};
use serde::Deserialize;
use service::Created;

use crate::errors::ApiError;
use crate::extract::{Authenticated, JsonBody};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one))
        .route("/:id/status", patch(update_status))
        .route("/client/:client_id", get(by_client))
        .route("/vendor/:vendor_id", get(by_vendor))
}

#[derive(Debug, Deserialize)]
struct StatusChange {
    status: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    JsonBody(input): JsonBody<NewOrder>,
) -> Result<(StatusCode, Json<Created<Order>>), ApiError> {
    let created = state.orders.create(input, &caller).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.list().await?))
}

async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.get(&id).await?))
}

async fn by_client(State(state): State<AppState>, Path(client_id): Path<String>) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.by_client(&client_id).await?))
}

async fn by_vendor(State(state): State<AppState>, Path(vendor_id): Path<String>) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.by_vendor(&vendor_id).await?))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StatusChange>,
) -> Result<Json<Order>, ApiError> {
    let status = body.status.ok_or_else(|| ApiError::bad_request("status: is required"))?;
    Ok(Json(state.orders.update_status(&id, &status).await?))
}
