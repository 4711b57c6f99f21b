use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::videos::VideoEntity, value_objects::enums::asset_classes::AssetClass,
};

#[async_trait]
#[automock]
pub trait VideoRepository {
    async fn find_by_id(&self, video_id: Uuid) -> Result<Option<VideoEntity>>;

    /// Sets the URL column belonging to `class` and returns the updated record.
    /// Only that column (and `updated_at`) is written.
    async fn update_asset_url(
        &self,
        video_id: Uuid,
        class: AssetClass,
        url: String,
    ) -> Result<VideoEntity>;
}
