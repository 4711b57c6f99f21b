use std::path::Path;
use thiserror::Error;

use crate::domain::value_objects::enums::asset_classes::AssetClass;

pub const IMAGE_TYPE_PREFIX: &str = "image/";
pub const ANIMATED_IMAGE_SUFFIX: &str = "gif";
pub const CANONICAL_VIDEO_TYPE: &str = "video/mp4";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("invalid media type `{content_type}` for {class} upload")]
    InvalidMediaType {
        class: AssetClass,
        content_type: String,
    },

    #[error("cannot determine a file extension for `{file_name}` ({content_type})")]
    UnusableExtension {
        file_name: String,
        content_type: String,
    },
}

/// Checks the declared content type of an upload against its class allow-list.
///
/// Thumbnails accept any `image/*` type except animated gifs; videos accept
/// only the canonical mp4 container type.
pub fn validate_media_type(class: AssetClass, content_type: &str) -> Result<(), UploadRejection> {
    let accepted = match class {
        AssetClass::Thumbnail => {
            content_type.starts_with(IMAGE_TYPE_PREFIX)
                && !content_type.ends_with(ANIMATED_IMAGE_SUFFIX)
        }
        AssetClass::Video => content_type == CANONICAL_VIDEO_TYPE,
    };

    if accepted {
        Ok(())
    } else {
        Err(UploadRejection::InvalidMediaType {
            class,
            content_type: content_type.to_string(),
        })
    }
}

/// Extension a thumbnail is stored and published under.
///
/// The uploaded filename's extension wins and is kept verbatim. Without one,
/// an extension is guessed from the declared type.
pub fn thumbnail_extension(
    file_name: Option<&str>,
    content_type: &str,
) -> Result<String, UploadRejection> {
    let from_file_name = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|extension| extension.to_str())
        .map(str::to_string);

    let extension = from_file_name.or_else(|| extension_for_media_type(content_type));

    match extension {
        Some(extension) if is_safe_extension(&extension) => Ok(extension),
        _ => Err(UploadRejection::UnusableExtension {
            file_name: file_name.unwrap_or_default().to_string(),
            content_type: content_type.to_string(),
        }),
    }
}

fn extension_for_media_type(content_type: &str) -> Option<String> {
    let candidates = mime_guess::get_mime_extensions_str(content_type)?;
    let subtype = content_type.rsplit('/').next().unwrap_or_default();

    candidates
        .iter()
        .find(|candidate| **candidate == subtype)
        .or_else(|| candidates.first())
        .map(|candidate| candidate.to_string())
}

fn is_safe_extension(extension: &str) -> bool {
    !extension.is_empty() && extension.chars().all(|c| c.is_ascii_alphanumeric())
}
