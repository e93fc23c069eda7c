use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use models::provider::{NewProvider, Provider};
use service::bulk::BulkReport;
use service::Created;

use crate::errors::ApiError;
use crate::extract::{read_upload, JsonBody};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list).post(create)).route("/bulk", post(bulk))
}

async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewProvider>,
) -> Result<(StatusCode, Json<Created<Provider>>), ApiError> {
    let created = state.providers.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Provider>>, ApiError> {
    Ok(Json(state.providers.list().await?))
}

async fn bulk(State(state): State<AppState>, multipart: Multipart) -> Result<Json<BulkReport>, ApiError> {
    let upload = read_upload(multipart).await?;
    Ok(Json(state.providers.bulk_upload(upload.file).await?))
}
