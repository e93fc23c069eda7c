use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use common::user_api::UserApiClient;
use configs::AppConfig;
use service::identity::{HttpIdentityRegistrar, IdentityRegistrar, NoopIdentityRegistrar};
use service::Tables;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::{self, StartupError};
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

async fn open_tables(cfg: &AppConfig) -> Result<Tables, StartupError> {
    let db = &cfg.dynamodb;
    if db.in_memory {
        return match &db.snapshot_dir {
            Some(dir) => {
                info!(dir = %dir, "using in-memory tables with JSON snapshots");
                Tables::snapshots(&db.tables, Path::new(dir)).await.map_err(|e| StartupError::Storage(e.to_string()))
            }
            None => {
                info!("using in-memory tables");
                Ok(Tables::memory(&db.tables))
            }
        };
    }

    let client = models::db::connect(db).await?;
    if db.auto_create_tables {
        let created = models::db::ensure_tables(&client, &models::db::table_plan(&db.tables)).await?;
        info!(created = ?created, "dynamodb tables checked");
    }
    Ok(Tables::dynamo(client, &db.tables))
}

fn identities(cfg: &AppConfig) -> Result<Arc<dyn IdentityRegistrar>, StartupError> {
    match cfg.services.user_api_url.as_deref() {
        Some(url) => {
            let client = UserApiClient::new(url).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
            info!(user_api = %url, "identity registration enabled");
            Ok(Arc::new(HttpIdentityRegistrar::new(client)))
        }
        None => Ok(Arc::new(NoopIdentityRegistrar)),
    }
}

/// Build the application router for `cfg` without binding a socket.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let kind = cfg.service_kind().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    errors::set_version(cfg.app.version.clone());
    let tables = open_tables(cfg).await?;
    let state = AppState::new(format!("medsupply-{}", kind.as_str()), tables, identities(cfg)?);
    Ok(routes::build_router(state, kind, build_cors()))
}

/// Serve until `shutdown` resolves.
pub async fn run<F>(cfg: AppConfig, shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_app(&cfg).await?;
    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(anyhow::Error::from)?;
    info!(%addr, service = %cfg.server.service, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await.map_err(anyhow::Error::from)?;
    Ok(())
}
