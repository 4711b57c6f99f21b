use axum::{
    extract::Request,
    http::{Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use crates::domain::value_objects::asset_naming::is_published_path;
use tracing::{debug, info};

use crate::axum_http::error_responses::AppError;

/// Fallback for anything no router claims. Answers with the usual error body.
pub async fn not_found(method: Method, uri: Uri) -> AppError {
    info!(%method, path = uri.path(), "router: no route matched");
    AppError::NotFound(format!("no route for {} {}", method, uri.path()))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Sits in front of the static asset service. Paths are relative to the
/// assets mount point.
pub async fn published_assets_only(request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if is_published_path(path) {
        return next.run(request).await;
    }

    debug!(path, "assets: unpublished path refused");
    AppError::NotFound(format!("asset {} not found", path)).into_response()
}
