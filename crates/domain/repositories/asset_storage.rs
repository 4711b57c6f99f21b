use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncRead;
use uuid::Uuid;

use crate::domain::value_objects::enums::asset_classes::AssetClass;

#[async_trait]
pub trait AssetStorage {
    /// Streams `body` into `file_name` under the root of `class`. Nothing is
    /// visible under `file_name` unless the whole stream was written.
    async fn create<R>(&self, class: AssetClass, file_name: &str, body: R) -> Result<PathBuf>
    where
        R: AsyncRead + Unpin + Send;

    /// Removes the first (by name) previously published asset of `class` for
    /// `video_id`. Returns the removed path, `None` when nothing matched.
    async fn delete_stale(&self, class: AssetClass, video_id: Uuid) -> Result<Option<PathBuf>>;

    /// Removes a single file. A missing file is not an error.
    async fn remove(&self, path: PathBuf) -> Result<()>;
}
