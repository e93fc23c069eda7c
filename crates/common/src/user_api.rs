//! HTTP client for the user service.
//!
//! Provider and vendor registration create a login identity by posting to the
//! user service; anything but `201 Created` is reported as an error.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::CoreError;

#[derive(Debug, Clone, Serialize)]
pub struct NewIdentity<'a> {
    pub email: &'a str,
    pub role: &'a str,
}

#[derive(Clone)]
pub struct UserApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl UserApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CoreError::Network(e.to_string()))?;
        Ok(Self { http, base_url: base_url.into().trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST {base}/` with `{email, role}`.
    pub async fn create_identity(&self, email: &str, role: &str) -> Result<(), CoreError> {
        let url = format!("{}/", self.base_url);
        debug!(%url, %email, %role, "registering identity");
        let resp = self
            .http
            .post(&url)
            .json(&NewIdentity { email, role })
            .send()
            .await
            .map_err(|e| CoreError::Network(e.to_string()))?;
        let status = resp.status();
        if status != reqwest::StatusCode::CREATED {
            let body = resp.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "user service rejected identity");
            return Err(CoreError::Status { status: status.as_u16(), body });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};

    async fn spawn(status: StatusCode) -> String {
        let app = Router::new().route(
            "/",
            post(move |Json(body): Json<serde_json::Value>| async move {
                if body["email"].is_string() && body["role"].is_string() {
                    (status, "ok")
                } else {
                    (StatusCode::BAD_REQUEST, "bad")
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn created_is_success() {
        let base = spawn(StatusCode::CREATED).await;
        let client = UserApiClient::new(format!("{base}/")).unwrap();
        assert_eq!(client.base_url(), base);
        client.create_identity("p@acme.co", "provider").await.unwrap();
    }

    #[tokio::test]
    async fn other_status_is_error() {
        let base = spawn(StatusCode::OK).await;
        let client = UserApiClient::new(base).unwrap();
        let err = client.create_identity("p@acme.co", "provider").await.unwrap_err();
        assert!(matches!(err, CoreError::Status { status: 200, .. }));
    }
}
