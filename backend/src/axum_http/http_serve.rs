use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
};
use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::get,
};
use crates::{
    domain::value_objects::asset_naming::ASSETS_URL_PATH,
    infra::{
        db::postgres::postgres_connection::PgPoolSquad,
        storages::local_assets::{LocalAssetStorage, LocalAssetStorageConfig},
    },
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let asset_storage = LocalAssetStorage::new(LocalAssetStorageConfig {
        thumbnails_root: config.assets.thumbnails_root(),
        videos_root: config.assets.videos_root(),
    })
    .await?;
    info!(root = %config.assets.root.display(), "Asset directories are ready");

    let api = routers::videos::routes(db_pool, Arc::new(asset_storage), Arc::clone(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on {}", addr);
    axum::serve(listener, app(&config, api))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wraps the upload API with the health check, static assets and the shared
/// HTTP layers. Body limits are applied per upload route.
pub fn app(config: &DotEnvyConfig, api: Router) -> Router {
    let assets = Router::new()
        .fallback_service(ServeDir::new(&config.assets.root))
        .layer(middleware::from_fn(default_routers::published_assets_only));

    Router::new()
        .fallback(default_routers::not_found)
        .nest("/api", api)
        .route("/api/health-check", get(default_routers::health_check))
        .nest_service(ASSETS_URL_PATH, assets)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
