use anyhow::anyhow;
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, FromRef, Path, Request, State,
        multipart::{Field, Multipart, MultipartError, MultipartRejection},
    },
    http::{StatusCode, header::CONTENT_LENGTH},
    middleware::{self, Next},
    response::Response,
    routing::post,
};
use crates::{
    domain::{
        repositories::{
            asset_storage::AssetStorage, transcoder::Transcoder, videos::VideoRepository,
        },
        value_objects::{
            asset_naming::PublicAssetUrls, enums::asset_classes::AssetClass, videos::VideoModel,
        },
    },
    infra::{
        db::{postgres::postgres_connection::PgPoolSquad, repositories::videos::VideoPostgres},
        storages::local_assets::LocalAssetStorage,
        transcoding::ffmpeg::FfmpegTranscoder,
    },
};
use futures_util::TryStreamExt;
use std::{io, sync::Arc};
use tokio_util::io::StreamReader;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::{AuthUser, JwtSecret},
    axum_http::error_responses::AppError,
    config::config_model::{DotEnvyConfig, UploadLimits},
    usecases::asset_ingestion::{AssetIngestionUseCase, IncomingAsset},
};

pub struct VideosState<V, S, T>
where
    V: VideoRepository + Send + Sync + 'static,
    S: AssetStorage + Send + Sync + 'static,
    T: Transcoder + Send + Sync + 'static,
{
    pub ingestion: Arc<AssetIngestionUseCase<V, S, T>>,
    pub jwt_secret: JwtSecret,
    /// Budget for non-file form fields, in bytes.
    pub form_field_limit: usize,
}

impl<V, S, T> Clone for VideosState<V, S, T>
where
    V: VideoRepository + Send + Sync + 'static,
    S: AssetStorage + Send + Sync + 'static,
    T: Transcoder + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            ingestion: Arc::clone(&self.ingestion),
            jwt_secret: self.jwt_secret.clone(),
            form_field_limit: self.form_field_limit,
        }
    }
}

impl<V, S, T> FromRef<VideosState<V, S, T>> for JwtSecret
where
    V: VideoRepository + Send + Sync + 'static,
    S: AssetStorage + Send + Sync + 'static,
    T: Transcoder + Send + Sync + 'static,
{
    fn from_ref(state: &VideosState<V, S, T>) -> Self {
        state.jwt_secret.clone()
    }
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    asset_storage: Arc<LocalAssetStorage>,
    config: Arc<DotEnvyConfig>,
) -> Router {
    let video_repository = VideoPostgres::new(Arc::clone(&db_pool));
    let transcoder = FfmpegTranscoder::new(config.transcoder.ffmpeg_config());
    let ingestion_usecase = AssetIngestionUseCase::new(
        Arc::new(video_repository),
        asset_storage,
        Arc::new(transcoder),
        PublicAssetUrls::new(&config.backend_server.host, config.backend_server.port),
    );

    let state = VideosState {
        ingestion: Arc::new(ingestion_usecase),
        jwt_secret: JwtSecret::new(&config.auth.jwt_secret),
        form_field_limit: config.upload_limits.multipart_field_bytes(),
    };

    router(state, &config.upload_limits)
}

/// Upload routes over any repository/storage/transcoder combination.
pub fn router<V, S, T>(state: VideosState<V, S, T>, limits: &UploadLimits) -> Router
where
    V: VideoRepository + Send + Sync + 'static,
    S: AssetStorage + Send + Sync + 'static,
    T: Transcoder + Send + Sync + 'static,
{
    let thumbnail_bytes = limits.thumbnail_bytes();
    let video_bytes = limits.video_bytes();

    Router::new()
        .route(
            "/thumbnail_upload/:video_id",
            post(upload_thumbnail::<V, S, T>)
                .layer::<_, std::convert::Infallible>(middleware::from_fn_with_state(thumbnail_bytes, reject_declared_oversize))
                .layer(DefaultBodyLimit::max(thumbnail_bytes)),
        )
        .route(
            "/video_upload/:video_id",
            post(upload_video::<V, S, T>)
                .layer::<_, std::convert::Infallible>(middleware::from_fn_with_state(video_bytes, reject_declared_oversize))
                .layer(DefaultBodyLimit::max(video_bytes)),
        )
        .with_state(state)
}

/// Refuses a body whose declared length is over the route ceiling before any
/// of it is read. Undeclared bodies are cut off by `DefaultBodyLimit` while
/// the multipart stream is consumed.
async fn reject_declared_oversize(
    State(limit): State<usize>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let declared = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    if let Some(length) = declared.filter(|length| *length > limit as u64) {
        warn!(
            uri = %request.uri(),
            length,
            limit,
            "videos router: declared body over ceiling"
        );
        return Err(AppError::PayloadTooLarge);
    }

    Ok(next.run(request).await)
}

pub async fn upload_thumbnail<V, S, T>(
    State(state): State<VideosState<V, S, T>>,
    Path(video_id): Path<String>,
    auth: Result<AuthUser, AppError>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VideoModel>, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
    S: AssetStorage + Send + Sync + 'static,
    T: Transcoder + Send + Sync + 'static,
{
    upload_asset(AssetClass::Thumbnail, state, video_id, auth, multipart).await
}

pub async fn upload_video<V, S, T>(
    State(state): State<VideosState<V, S, T>>,
    Path(video_id): Path<String>,
    auth: Result<AuthUser, AppError>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VideoModel>, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
    S: AssetStorage + Send + Sync + 'static,
    T: Transcoder + Send + Sync + 'static,
{
    upload_asset(AssetClass::Video, state, video_id, auth, multipart).await
}

async fn upload_asset<V, S, T>(
    class: AssetClass,
    state: VideosState<V, S, T>,
    raw_video_id: String,
    auth: Result<AuthUser, AppError>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VideoModel>, AppError>
where
    V: VideoRepository + Send + Sync + 'static,
    S: AssetStorage + Send + Sync + 'static,
    T: Transcoder + Send + Sync + 'static,
{
    let video_id = Uuid::parse_str(&raw_video_id)
        .map_err(|_| AppError::BadRequest(format!("invalid video id `{raw_video_id}`")))?;
    let mut multipart = multipart.map_err(|rejection| {
        warn!(%video_id, %class, error = %rejection, "videos router: unreadable multipart body");
        AppError::BadRequest(rejection.body_text())
    })?;

    let user = auth?;
    info!(%video_id, user_id = %user.user_id, %class, "videos router: upload started");

    let video = state.ingestion.authorize(video_id, user.user_id).await?;

    let field_name = class.form_field();
    let mut form_bytes = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(field_name) {
            if field.file_name().is_none() {
                buffer_form_field(field, state.form_field_limit, &mut form_bytes).await?;
            }
            continue;
        }

        let asset = IncomingAsset {
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().unwrap_or_default().to_string(),
            body: StreamReader::new(Box::pin(field.map_err(stream_error))),
        };

        let updated = state.ingestion.ingest(&video, class, asset).await?;

        return Ok(Json(VideoModel::from(updated)));
    }

    error!(%video_id, %class, "videos router: upload field missing");
    Err(AppError::Internal(anyhow!(
        "multipart body has no `{field_name}` field"
    )))
}

/// Consumes a non-file field, counting it against the form field budget.
async fn buffer_form_field(
    mut field: Field<'_>,
    limit: usize,
    used: &mut usize,
) -> Result<(), AppError> {
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        *used += chunk.len();
        if *used > limit {
            return Err(AppError::BadRequest(format!(
                "form fields exceed {limit} bytes"
            )));
        }
    }
    Ok(())
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// Keeps the size-limit cause visible through the byte stream.
fn stream_error(err: MultipartError) -> io::Error {
    let kind = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        io::ErrorKind::FileTooLarge
    } else {
        io::ErrorKind::InvalidData
    };
    io::Error::new(kind, err)
}
