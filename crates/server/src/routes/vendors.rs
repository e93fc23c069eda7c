use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use common::types::Pong;
use models::sales_plan::{NewSalesPlan, SalesPlan};
use models::vendor::{NewVendor, Vendor};
use models::visit::{NewVisit, Visit};
use service::report::VendorReport;
use service::vendors::VendorClients;
use service::Created;

use crate::errors::ApiError;
use crate::extract::{Authenticated, JsonBody};
use crate::state::AppState;

/// Vendors, their sales plans and their visits. Collection paths answer with
/// and without a trailing slash.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/vendor/ping", get(ping))
        .route("/:vendor_id/clients", get(clients_of))
        .route("/sales_plan", get(list_plans).post(create_plan))
        .route("/sales_plan/", get(list_plans).post(create_plan))
        .route("/sales_plan/:vendor_id", get(report))
        .route("/visits", get(my_visits).post(create_visit))
        .route("/visits/", get(my_visits).post(create_visit))
}

async fn ping() -> Json<Pong> {
    Json(Pong::default())
}

async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewVendor>,
) -> Result<(StatusCode, Json<Created<Vendor>>), ApiError> {
    let created = state.vendors.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Vendor>>, ApiError> {
    Ok(Json(state.vendors.list().await?))
}

async fn clients_of(
    State(state): State<AppState>,
    Path(vendor_id): Path<String>,
) -> Result<Json<VendorClients>, ApiError> {
    Ok(Json(state.vendors.clients_of(&vendor_id).await?))
}

async fn create_plan(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewSalesPlan>,
) -> Result<(StatusCode, Json<Created<SalesPlan>>), ApiError> {
    let created = state.sales_plans.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_plans(State(state): State<AppState>) -> Result<Json<Vec<SalesPlan>>, ApiError> {
    Ok(Json(state.sales_plans.list().await?))
}

async fn report(State(state): State<AppState>, Path(vendor_id): Path<String>) -> Result<Json<VendorReport>, ApiError> {
    Ok(Json(state.sales_plans.report(&vendor_id).await?))
}

async fn create_visit(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    JsonBody(input): JsonBody<NewVisit>,
) -> Result<(StatusCode, Json<Created<Visit>>), ApiError> {
    let created = state.visits.create(input, &caller.sub).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn my_visits(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> Result<Json<Vec<Visit>>, ApiError> {
    Ok(Json(state.visits.by_vendor(&caller.sub).await?))
}
