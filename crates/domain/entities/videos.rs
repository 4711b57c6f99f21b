use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::asset_classes::AssetClass,
    infra::db::postgres::schema::videos,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = videos)]
pub struct VideoEntity {
    pub id: Uuid,
    pub user_id: Uuid, // owner; the only user allowed to replace this video's assets
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoEntity {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    pub fn asset_url(&self, class: AssetClass) -> Option<&str> {
        match class {
            AssetClass::Thumbnail => self.thumbnail_url.as_deref(),
            AssetClass::Video => self.video_url.as_deref(),
        }
    }
}
