use anyhow::{Context, Result};
use std::{path::PathBuf, str::FromStr, time::Duration};

use super::config_model::{
    Assets, Auth, BackendServer, Database, DotEnvyConfig, Transcoder, UploadLimits,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    load_from(|key| std::env::var(key).ok())
}

/// Builds the config from an arbitrary variable source.
pub fn load_from<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let backend_server = BackendServer {
        host: optional(&lookup, "SERVER_HOST").unwrap_or_else(|| "localhost".to_string()),
        port: parse_required(&lookup, "SERVER_PORT")?,
        timeout: parse_or(&lookup, "SERVER_TIMEOUT", 300)?,
    };

    let database = Database {
        url: required(&lookup, "DATABASE_URL")?,
    };

    let auth = Auth {
        jwt_secret: required(&lookup, "JWT_SECRET")?,
    };

    let assets = Assets {
        root: optional(&lookup, "ASSETS_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./assets")),
    };

    let upload_limits = UploadLimits {
        thumbnail_mb: parse_or(&lookup, "THUMBNAIL_UPLOAD_LIMIT_MB", 20)?,
        video_mb: parse_or(&lookup, "VIDEO_UPLOAD_LIMIT_MB", 30)?,
        multipart_field_mb: parse_or(&lookup, "MULTIPART_FIELD_LIMIT_MB", 10)?,
    };

    let transcoder = Transcoder {
        ffmpeg_path: optional(&lookup, "FFMPEG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("ffmpeg")),
        timeout: Duration::from_secs(parse_or(&lookup, "TRANSCODE_TIMEOUT_SECS", 120)?),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth,
        assets,
        upload_limits,
        transcoder,
    })
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).with_context(|| format!("{key} is missing"))
}

fn parse_required<F, T>(lookup: &F, key: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    required(lookup, key)?
        .parse()
        .with_context(|| format!("{key} is invalid"))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(lookup, key) {
        Some(raw) => raw.parse().with_context(|| format!("{key} is invalid")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SERVER_PORT", "8080"),
        ("DATABASE_URL", "postgres://localhost:5432/videos"),
        ("JWT_SECRET", "supersecretjwtsecretforunittesting123"),
    ];

    #[test]
    fn test_load_defaults() {
        let config = load_from(env(&REQUIRED)).unwrap();

        assert_eq!(config.backend_server.host, "localhost");
        assert_eq!(config.backend_server.port, 8080);
        assert_eq!(config.backend_server.timeout, 300);
        assert_eq!(config.assets.root, PathBuf::from("./assets"));
        assert_eq!(config.assets.videos_root(), PathBuf::from("./assets/videos"));
        assert_eq!(config.upload_limits.thumbnail_bytes(), 20 << 20);
        assert_eq!(config.upload_limits.video_bytes(), 30 << 20);
        assert_eq!(config.upload_limits.multipart_field_bytes(), 10 << 20);
        assert_eq!(config.transcoder.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.transcoder.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_load_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SERVER_HOST", "media.internal"),
            ("ASSETS_ROOT", "/srv/assets"),
            ("VIDEO_UPLOAD_LIMIT_MB", "64"),
            ("FFMPEG_PATH", "/usr/local/bin/ffmpeg"),
            ("TRANSCODE_TIMEOUT_SECS", "15"),
        ]);

        let config = load_from(env(&vars)).unwrap();

        assert_eq!(config.backend_server.host, "media.internal");
        assert_eq!(config.assets.thumbnails_root(), PathBuf::from("/srv/assets"));
        assert_eq!(config.upload_limits.video_mb, 64);
        assert_eq!(
            config.transcoder.ffmpeg_path,
            PathBuf::from("/usr/local/bin/ffmpeg")
        );
        assert_eq!(config.transcoder.timeout, Duration::from_secs(15));

        let ffmpeg = config.transcoder.ffmpeg_config();
        assert_eq!(ffmpeg.ffmpeg_path, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(ffmpeg.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_missing_required_variable() {
        let err = load_from(env(&REQUIRED[..2])).unwrap_err();

        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_invalid_number() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SERVER_TIMEOUT", "soon"));

        let err = load_from(env(&vars)).unwrap_err();

        assert!(err.to_string().contains("SERVER_TIMEOUT"));
    }
}
