use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::videos::VideoEntity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VideoEntity> for VideoModel {
    fn from(entity: VideoEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            title: entity.title,
            description: entity.description,
            thumbnail_url: entity.thumbnail_url,
            video_url: entity.video_url,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_carries_record_and_asset_urls() {
        let now = Utc::now();
        let entity = VideoEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Boots".to_string(),
            description: None,
            thumbnail_url: Some("http://localhost:8080/assets/v.png".to_string()),
            video_url: None,
            created_at: now,
            updated_at: now,
        };

        let model = VideoModel::from(entity.clone());

        assert_eq!(model.id, entity.id);
        assert_eq!(model.user_id, entity.user_id);
        assert_eq!(model.title, "Boots");
        assert_eq!(model.description, None);
        assert_eq!(model.thumbnail_url, entity.thumbnail_url);
        assert_eq!(model.video_url, None);
        assert_eq!(model.updated_at, now);
    }
}
