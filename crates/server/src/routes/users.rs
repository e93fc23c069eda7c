use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use models::user::{NewUser, User};
use serde::Serialize;
use service::users::BulkUsers;
use service::Created;

use crate::errors::ApiError;
use crate::extract::{Authenticated, JsonBody};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create)).route("/bulk", post(bulk)).route("/me", get(me))
}

#[derive(Debug, Serialize)]
struct Me {
    sub: String,
    role: String,
    email: Option<String>,
    user: Option<User>,
}

async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewUser>,
) -> Result<(StatusCode, Json<Created<User>>), ApiError> {
    let created = state.users.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn bulk(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<serde_json::Value>,
) -> Result<(StatusCode, Json<BulkUsers>), ApiError> {
    let out = state.users.bulk_create(&payload).await?;
    Ok((StatusCode::CREATED, Json(out)))
}

/// Claims of the caller plus their stored user record, if any.
async fn me(State(state): State<AppState>, Authenticated(caller): Authenticated) -> Result<Json<Me>, ApiError> {
    let user = match caller.email.as_deref() {
        Some(email) => state.users.find(email).await?,
        None => None,
    };
    Ok(Json(Me { sub: caller.sub, role: caller.role, email: caller.email, user }))
}
