//! Naming convention tying stored assets to their video record.
//!
//! A stored asset is associated with its record only through its file name
//! (`{video_id}.{ext}` for thumbnails, `{video_id}.mp4` /
//! `{video_id}_processed.mp4` for videos). Every path and URL derivation goes
//! through this module so the convention can later be replaced by an explicit
//! mapping without touching the pipeline.

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::domain::value_objects::enums::asset_classes::AssetClass;

pub const PROCESSED_SUFFIX: &str = "_processed";
pub const VIDEO_EXTENSION: &str = "mp4";
pub const ASSETS_URL_PATH: &str = "/assets";
pub const VIDEOS_DIR: &str = "videos";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetKey {
    pub video_id: Uuid,
    pub class: AssetClass,
    extension: String,
}

impl AssetKey {
    /// The extension is kept exactly as uploaded.
    pub fn thumbnail(video_id: Uuid, extension: impl Into<String>) -> Self {
        Self {
            video_id,
            class: AssetClass::Thumbnail,
            extension: extension.into(),
        }
    }

    pub fn video(video_id: Uuid) -> Self {
        Self {
            video_id,
            class: AssetClass::Video,
            extension: VIDEO_EXTENSION.to_string(),
        }
    }

    /// Name the upload is written under.
    pub fn stored_file_name(&self) -> String {
        format!("{}.{}", self.video_id, self.extension)
    }

    /// Name of the file the public URL points at.
    pub fn published_file_name(&self) -> String {
        match self.class {
            AssetClass::Thumbnail => self.stored_file_name(),
            AssetClass::Video => format!(
                "{}{}.{}",
                self.video_id, PROCESSED_SUFFIX, self.extension
            ),
        }
    }

    /// URL path below the server root, e.g. `/assets/videos/{id}_processed.mp4`.
    pub fn public_path(&self) -> String {
        match self.class {
            AssetClass::Thumbnail => {
                format!("{}/{}", ASSETS_URL_PATH, self.published_file_name())
            }
            AssetClass::Video => format!(
                "{}/{}/{}",
                ASSETS_URL_PATH,
                VIDEOS_DIR,
                self.published_file_name()
            ),
        }
    }
}

/// Whether `file_name` is a previously published asset of `class` for `video_id`.
///
/// Thumbnails match any extension; videos match only the processed output.
pub fn is_stale_asset(class: AssetClass, video_id: Uuid, file_name: &str) -> bool {
    match class {
        AssetClass::Thumbnail => file_name.starts_with(&format!("{}.", video_id)),
        AssetClass::Video => file_name == AssetKey::video(video_id).published_file_name(),
    }
}

/// Whether a request path below [`ASSETS_URL_PATH`] names a published asset.
///
/// Only `{name}.{ext}` at the top level and `videos/{name}_processed.mp4` are
/// public. In-flight `.part` files and untranscoded uploads never are.
pub fn is_published_path(path: &str) -> bool {
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let plain = |segment: &&str| {
        !segment.starts_with('.')
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    if !segments.iter().all(plain) {
        return false;
    }

    match segments.as_slice() {
        [name] => name.contains('.'),
        [dir, name] if *dir == VIDEOS_DIR => name
            .strip_suffix(&format!("{}.{}", PROCESSED_SUFFIX, VIDEO_EXTENSION))
            .is_some_and(|stem| !stem.is_empty()),
        _ => false,
    }
}

/// `dir/name.mp4` -> `dir/name_processed.mp4`
pub fn processed_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_name = match path.extension() {
        Some(extension) => format!(
            "{}{}.{}",
            stem,
            PROCESSED_SUFFIX,
            extension.to_string_lossy()
        ),
        None => format!("{}{}", stem, PROCESSED_SUFFIX),
    };

    path.with_file_name(file_name)
}

/// Builds externally reachable asset URLs from the configured host and port.
#[derive(Debug, Clone)]
pub struct PublicAssetUrls {
    base_url: String,
}

impl PublicAssetUrls {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            base_url: format!("http://{}:{}", host, port),
        }
    }

    pub fn url_for(&self, key: &AssetKey) -> String {
        format!("{}{}", self.base_url, key.public_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_id() -> Uuid {
        Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap()
    }

    #[test]
    fn thumbnail_names_embed_extension_as_uploaded() {
        let key = AssetKey::thumbnail(video_id(), "JPG");

        assert_eq!(
            key.stored_file_name(),
            "123e4567-e89b-12d3-a456-426614174000.JPG"
        );
        assert_eq!(key.published_file_name(), key.stored_file_name());
    }

    #[test]
    fn video_is_published_under_processed_name() {
        let key = AssetKey::video(video_id());

        assert_eq!(
            key.stored_file_name(),
            "123e4567-e89b-12d3-a456-426614174000.mp4"
        );
        assert_eq!(
            key.published_file_name(),
            "123e4567-e89b-12d3-a456-426614174000_processed.mp4"
        );
    }

    #[test]
    fn public_urls_follow_asset_layout() {
        let urls = PublicAssetUrls::new("localhost", 8080);

        assert_eq!(
            urls.url_for(&AssetKey::thumbnail(video_id(), "png")),
            "http://localhost:8080/assets/123e4567-e89b-12d3-a456-426614174000.png"
        );
        assert_eq!(
            urls.url_for(&AssetKey::video(video_id())),
            "http://localhost:8080/assets/videos/123e4567-e89b-12d3-a456-426614174000_processed.mp4"
        );
    }

    #[test]
    fn stale_thumbnail_matches_any_extension_for_same_video_only() {
        let id = video_id();

        assert!(is_stale_asset(AssetClass::Thumbnail, id, &format!("{id}.png")));
        assert!(is_stale_asset(AssetClass::Thumbnail, id, &format!("{id}.jpeg")));
        assert!(!is_stale_asset(
            AssetClass::Thumbnail,
            id,
            &format!("{}.png", Uuid::new_v4())
        ));
        assert!(!is_stale_asset(AssetClass::Thumbnail, id, &format!(".{id}.png.part")));
    }

    #[test]
    fn stale_video_matches_processed_output_only() {
        let id = video_id();

        assert!(is_stale_asset(
            AssetClass::Video,
            id,
            &format!("{id}_processed.mp4")
        ));
        assert!(!is_stale_asset(AssetClass::Video, id, &format!("{id}.mp4")));
    }

    #[test]
    fn only_published_files_are_public() {
        let id = video_id();

        assert!(is_published_path(&format!("/{id}.png")));
        assert!(is_published_path(&format!("/videos/{id}_processed.mp4")));

        assert!(!is_published_path(&format!("/.{id}.png.{}.part", Uuid::new_v4())));
        assert!(!is_published_path(&format!("/videos/.{id}.mp4.{}.part", Uuid::new_v4())));
        assert!(!is_published_path(&format!("/videos/{id}.mp4")));
        assert!(!is_published_path("/videos/_processed.mp4"));
        assert!(!is_published_path("/videos"));
        assert!(!is_published_path("/videos/nested/clip_processed.mp4"));
        assert!(!is_published_path("/%2E%2E/secret.txt"));
        assert!(!is_published_path("/"));
    }

    #[test]
    fn processed_sibling_inserts_suffix_before_extension() {
        assert_eq!(
            processed_sibling(Path::new("/srv/assets/videos/abc.mp4")),
            PathBuf::from("/srv/assets/videos/abc_processed.mp4")
        );
        assert_eq!(
            processed_sibling(Path::new("clip")),
            PathBuf::from("clip_processed")
        );
    }
}
