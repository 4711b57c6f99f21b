use crates::domain::{
    entities::videos::VideoEntity,
    repositories::{asset_storage::AssetStorage, transcoder::Transcoder, videos::VideoRepository},
    value_objects::{
        asset_naming::{AssetKey, PublicAssetUrls},
        enums::asset_classes::AssetClass,
        transcoding::TranscodeError,
        upload_validation::{UploadRejection, thumbnail_extension, validate_media_type},
    },
};
use std::{io, sync::Arc};
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::upload_locks::UploadLocks;

/// One uploaded file as read from the request.
pub struct IncomingAsset<R> {
    pub file_name: Option<String>,
    pub content_type: String,
    pub body: R,
}

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("video {0} not found")]
    VideoNotFound(Uuid),

    #[error("user {user_id} does not own video {video_id}")]
    NotOwner { video_id: Uuid, user_id: Uuid },

    #[error(transparent)]
    Rejected(#[from] UploadRejection),

    #[error("failed to look up video {video_id}")]
    Lookup {
        video_id: Uuid,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to store {class} asset")]
    Storage {
        class: AssetClass,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to transcode video")]
    Transcode(#[from] TranscodeError),

    #[error("failed to update video {video_id}")]
    RecordUpdate {
        video_id: Uuid,
        #[source]
        source: anyhow::Error,
    },
}

impl IngestionError {
    /// True when the upload stream was cut off by the request size ceiling.
    pub fn is_payload_too_large(&self) -> bool {
        match self {
            IngestionError::Storage { source, .. } => source.chain().any(|cause| {
                cause
                    .downcast_ref::<io::Error>()
                    .is_some_and(|err| err.kind() == io::ErrorKind::FileTooLarge)
            }),
            _ => false,
        }
    }
}

pub struct AssetIngestionUseCase<V, S, T>
where
    V: VideoRepository + Send + Sync + 'static,
    S: AssetStorage + Send + Sync + 'static,
    T: Transcoder + Send + Sync + 'static,
{
    video_repository: Arc<V>,
    asset_storage: Arc<S>,
    transcoder: Arc<T>,
    public_urls: PublicAssetUrls,
    locks: UploadLocks,
}

impl<V, S, T> AssetIngestionUseCase<V, S, T>
where
    V: VideoRepository + Send + Sync + 'static,
    S: AssetStorage + Send + Sync + 'static,
    T: Transcoder + Send + Sync + 'static,
{
    pub fn new(
        video_repository: Arc<V>,
        asset_storage: Arc<S>,
        transcoder: Arc<T>,
        public_urls: PublicAssetUrls,
    ) -> Self {
        Self {
            video_repository,
            asset_storage,
            transcoder,
            public_urls,
            locks: UploadLocks::new(),
        }
    }

    /// Loads the record and checks that `user_id` owns it. Nothing is read
    /// from the upload before this succeeds.
    pub async fn authorize(
        &self,
        video_id: Uuid,
        user_id: Uuid,
    ) -> Result<VideoEntity, IngestionError> {
        let video = self
            .video_repository
            .find_by_id(video_id)
            .await
            .map_err(|source| IngestionError::Lookup { video_id, source })?
            .ok_or(IngestionError::VideoNotFound(video_id))?;

        if !video.is_owned_by(user_id) {
            warn!(%video_id, %user_id, "asset_ingestion: caller does not own video");
            return Err(IngestionError::NotOwner { video_id, user_id });
        }

        Ok(video)
    }

    /// Validates the upload, replaces the stored asset of `class`, remuxes
    /// videos and publishes the new URL on the record.
    ///
    /// Steps after validation run under the per-(video, class) lock. A failure
    /// leaves whatever was already written on disk in place.
    pub async fn ingest<R>(
        &self,
        video: &VideoEntity,
        class: AssetClass,
        asset: IncomingAsset<R>,
    ) -> Result<VideoEntity, IngestionError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let video_id = video.id;

        if let Err(rejection) = validate_media_type(class, &asset.content_type) {
            warn!(%video_id, %class, content_type = %asset.content_type, "asset_ingestion: media type rejected");
            return Err(rejection.into());
        }

        let key = match class {
            AssetClass::Thumbnail => AssetKey::thumbnail(
                video_id,
                thumbnail_extension(asset.file_name.as_deref(), &asset.content_type)?,
            ),
            AssetClass::Video => AssetKey::video(video_id),
        };

        let _guard = self.locks.acquire(video_id, class).await;

        self.asset_storage
            .delete_stale(class, video_id)
            .await
            .map_err(|source| IngestionError::Storage { class, source })?;

        let stored = self
            .asset_storage
            .create(class, &key.stored_file_name(), asset.body)
            .await
            .map_err(|source| IngestionError::Storage { class, source })?;

        if class.requires_transcode() {
            let processed = self.transcoder.remux_fast_start(stored.clone()).await?;
            info!(%video_id, output = %processed.display(), "asset_ingestion: video remuxed");

            if let Err(err) = self.asset_storage.remove(stored.clone()).await {
                warn!(
                    %video_id,
                    path = %stored.display(),
                    error = ?err,
                    "asset_ingestion: failed to remove pre-transcode upload"
                );
            }
        }

        let url = self.public_urls.url_for(&key);
        let updated = self
            .video_repository
            .update_asset_url(video_id, class, url.clone())
            .await
            .map_err(|source| {
                error!(%video_id, %class, %url, "asset_ingestion: asset stored but record update failed");
                IngestionError::RecordUpdate { video_id, source }
            })?;

        info!(
            %video_id,
            %class,
            %url,
            previous_url = video.asset_url(class).unwrap_or("none"),
            "asset_ingestion: asset published"
        );

        Ok(updated)
    }
}
