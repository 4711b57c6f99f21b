use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use diesel::{OptionalExtension, RunQueryDsl, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::videos},
};
use domain::{
    entities::videos::VideoEntity, repositories::videos::VideoRepository,
    value_objects::enums::asset_classes::AssetClass,
};

pub struct VideoPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl VideoPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl VideoRepository for VideoPostgres {
    async fn find_by_id(&self, video_id: Uuid) -> Result<Option<VideoEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = videos::table
            .find(video_id)
            .select(VideoEntity::as_select())
            .first::<VideoEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn update_asset_url(
        &self,
        video_id: Uuid,
        class: AssetClass,
        url: String,
    ) -> Result<VideoEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();
        let target = videos::table.filter(videos::id.eq(video_id));

        let result = match class {
            AssetClass::Thumbnail => update(target)
                .set((videos::thumbnail_url.eq(Some(url)), videos::updated_at.eq(now)))
                .returning(VideoEntity::as_returning())
                .get_result::<VideoEntity>(&mut conn),
            AssetClass::Video => update(target)
                .set((videos::video_url.eq(Some(url)), videos::updated_at.eq(now)))
                .returning(VideoEntity::as_returning())
                .get_result::<VideoEntity>(&mut conn),
        }
        .with_context(|| format!("failed to update {} url of video {}", class, video_id))?;

        Ok(result)
    }
}
