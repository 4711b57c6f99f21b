use anyhow::Result;
use backend::axum_http::http_serve;
use backend::config::{config_loader, config_model::DotEnvyConfig};
use crates::infra::{db::postgres::postgres_connection, transcoding::ffmpeg::FfmpegTranscoder};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        let chain = format!("{err:#}");
        error!(error = %chain, "backend: exited with error");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("backend")?;

    let config = config_loader::load()?;
    info!(
        port = config.backend_server.port,
        public_host = %config.backend_server.host,
        assets_root = %config.assets.root.display(),
        thumbnail_mb = config.upload_limits.thumbnail_mb,
        video_mb = config.upload_limits.video_mb,
        "backend: configuration loaded"
    );

    check_transcoder(&config).await;

    let postgres_pool = postgres_connection::establish_connection(&config.database.url)?;
    info!("backend: postgres pool ready");

    http_serve::start(Arc::new(config), Arc::new(postgres_pool)).await?;

    Ok(())
}

/// Uploads still succeed without ffmpeg, they just never get a playable URL,
/// so a missing binary is reported but does not stop the server.
async fn check_transcoder(config: &DotEnvyConfig) {
    let transcoder = FfmpegTranscoder::new(config.transcoder.ffmpeg_config());
    match transcoder.version().await {
        Ok(version) => info!(
            ffmpeg = %config.transcoder.ffmpeg_path.display(),
            timeout_secs = config.transcoder.timeout.as_secs(),
            %version,
            "backend: transcoder available"
        ),
        Err(err) => warn!(
            ffmpeg = %config.transcoder.ffmpeg_path.display(),
            error = %err,
            "backend: transcoder unavailable, video uploads will fail to transcode"
        ),
    }
}
