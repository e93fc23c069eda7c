use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use common::types::{Health, Pong};
use configs::ServiceKind;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod clients;
pub mod orders;
pub mod products;
pub mod providers;
pub mod users;
pub mod vendors;

pub async fn ping() -> Json<Pong> {
    Json(Pong::default())
}

pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health::up(&state.app_name))
}

fn service_router(kind: ServiceKind) -> Router<AppState> {
    match kind {
        ServiceKind::Client => clients::router(),
        ServiceKind::Provider => providers::router(),
        ServiceKind::Vendor => vendors::router(),
        ServiceKind::Product => products::router(),
        ServiceKind::Order => orders::router(),
        ServiceKind::User => users::router(),
        ServiceKind::All => Router::new()
            .nest("/clients", clients::router())
            .nest("/providers", providers::router())
            .nest("/vendors", vendors::router())
            .nest("/products", products::router())
            .nest("/orders", orders::router())
            .nest("/users", users::router()),
    }
}

/// Router for one service (mounted at the root) or for all of them, each
/// under its own prefix. `/ping` and `/health` are always at the root.
pub fn build_router(state: AppState, kind: ServiceKind, cors: CorsLayer) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/health", get(health))
        .merge(service_router(kind))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use service::identity::NoopIdentityRegistrar;
    use service::Tables;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(kind: ServiceKind) -> Router {
        let state = AppState::new("medsupply", Tables::memory(&Default::default()), Arc::new(NoopIdentityRegistrar));
        build_router(state, kind, CorsLayer::very_permissive())
    }

    async fn status_of(app: Router, method: &str, uri: &str, body: &str) -> StatusCode {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        app.oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn ping_and_health_exist_in_every_mode() {
        for kind in [ServiceKind::Client, ServiceKind::Order, ServiceKind::All] {
            assert_eq!(status_of(app(kind), "GET", "/ping", "").await, StatusCode::OK);
            assert_eq!(status_of(app(kind), "GET", "/health", "").await, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn all_mode_prefixes_each_service() {
        assert_eq!(status_of(app(ServiceKind::All), "GET", "/clients", "").await, StatusCode::OK);
        assert_eq!(status_of(app(ServiceKind::All), "GET", "/vendors/vendor/ping", "").await, StatusCode::OK);
        assert_eq!(status_of(app(ServiceKind::All), "GET", "/products/warehouses", "").await, StatusCode::OK);
        assert_eq!(status_of(app(ServiceKind::Client), "GET", "/orders", "").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        assert_eq!(status_of(app(ServiceKind::Client), "POST", "/", "{not json").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn caller_routes_need_a_token() {
        assert_eq!(status_of(app(ServiceKind::Order), "POST", "/", "{}").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(app(ServiceKind::User), "GET", "/me", "").await, StatusCode::UNAUTHORIZED);
    }
}
