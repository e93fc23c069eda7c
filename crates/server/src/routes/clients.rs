use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use models::client::{Client, NewClient};
use service::Created;

use crate::errors::ApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list).post(create))
}

async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewClient>,
) -> Result<(StatusCode, Json<Created<Client>>), ApiError> {
    let created = state.clients.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Client>>, ApiError> {
    Ok(Json(state.clients.list().await?))
}
