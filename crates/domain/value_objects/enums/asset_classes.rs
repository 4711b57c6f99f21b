use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Category of an uploaded asset. Governs validation, storage root, naming and
/// whether the upload goes through the transcoder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Thumbnail,
    Video,
}

impl AssetClass {
    /// Multipart field carrying the file for this class.
    pub fn form_field(&self) -> &'static str {
        match self {
            AssetClass::Thumbnail => "thumbnail",
            AssetClass::Video => "video",
        }
    }

    pub fn requires_transcode(&self) -> bool {
        matches!(self, AssetClass::Video)
    }
}

impl Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.form_field())
    }
}
