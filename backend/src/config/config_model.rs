use crates::infra::transcoding::ffmpeg::FfmpegTranscoderConfig;
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub auth: Auth,
    pub assets: Assets,
    pub upload_limits: UploadLimits,
    pub transcoder: Transcoder,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    /// Host used when building public asset URLs.
    pub host: String,
    pub port: u16,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Assets {
    pub root: PathBuf,
}

impl Assets {
    pub fn thumbnails_root(&self) -> PathBuf {
        self.root.clone()
    }

    pub fn videos_root(&self) -> PathBuf {
        self.root.join(crates::domain::value_objects::asset_naming::VIDEOS_DIR)
    }
}

/// Limits in MiB.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub thumbnail_mb: u64,
    pub video_mb: u64,
    pub multipart_field_mb: u64,
}

impl UploadLimits {
    pub fn thumbnail_bytes(&self) -> usize {
        mib_to_bytes(self.thumbnail_mb)
    }

    pub fn video_bytes(&self) -> usize {
        mib_to_bytes(self.video_mb)
    }

    pub fn multipart_field_bytes(&self) -> usize {
        mib_to_bytes(self.multipart_field_mb)
    }
}

fn mib_to_bytes(mib: u64) -> usize {
    usize::try_from(mib.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
}

#[derive(Debug, Clone)]
pub struct Transcoder {
    pub ffmpeg_path: PathBuf,
    pub timeout: Duration,
}

impl Transcoder {
    pub fn ffmpeg_config(&self) -> FfmpegTranscoderConfig {
        FfmpegTranscoderConfig {
            ffmpeg_path: self.ffmpeg_path.clone(),
            timeout: self.timeout,
        }
    }
}
