use async_trait::async_trait;
use mockall::automock;
use std::path::PathBuf;

use crate::domain::value_objects::transcoding::TranscodeError;

#[async_trait]
#[automock]
pub trait Transcoder {
    /// Remuxes `input` into a fast-start sibling (`name_processed.mp4`) and
    /// returns its path. Returns only after the external process has exited.
    async fn remux_fast_start(&self, input: PathBuf) -> Result<PathBuf, TranscodeError>;
}
