use anyhow::{Context, Result};
use async_trait::async_trait;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{fs, io::AsyncRead};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    repositories::asset_storage::AssetStorage,
    value_objects::{asset_naming::is_stale_asset, enums::asset_classes::AssetClass},
};

#[derive(Clone, Debug)]
pub struct LocalAssetStorageConfig {
    pub thumbnails_root: PathBuf,
    pub videos_root: PathBuf,
}

/// Asset store on the local filesystem, one root directory per asset class.
#[derive(Clone, Debug)]
pub struct LocalAssetStorage {
    thumbnails_root: PathBuf,
    videos_root: PathBuf,
}

impl LocalAssetStorage {
    /// Creates both roots if they do not exist yet.
    pub async fn new(config: LocalAssetStorageConfig) -> Result<Self> {
        for root in [&config.thumbnails_root, &config.videos_root] {
            fs::create_dir_all(root)
                .await
                .with_context(|| format!("failed to create asset root {}", root.display()))?;
        }

        Ok(Self {
            thumbnails_root: config.thumbnails_root,
            videos_root: config.videos_root,
        })
    }

    pub fn root_for(&self, class: AssetClass) -> &Path {
        match class {
            AssetClass::Thumbnail => &self.thumbnails_root,
            AssetClass::Video => &self.videos_root,
        }
    }

    async fn stale_candidates(&self, class: AssetClass, video_id: Uuid) -> Result<Vec<String>> {
        let root = self.root_for(class);
        let mut entries = match fs::read_dir(root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to list {}", root.display()));
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("failed to list {}", root.display()))?
        {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_stale_asset(class, video_id, &name) && entry.file_type().await?.is_file() {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl AssetStorage for LocalAssetStorage {
    async fn create<R>(&self, class: AssetClass, file_name: &str, mut body: R) -> Result<PathBuf>
    where
        R: AsyncRead + Unpin + Send,
    {
        let root = self.root_for(class);
        let final_path = root.join(file_name);
        let temp_path = root.join(format!(".{}.{}.part", file_name, Uuid::new_v4()));

        let written = async {
            let mut file = fs::File::create(&temp_path)
                .await
                .with_context(|| format!("failed to create {}", temp_path.display()))?;
            let bytes = tokio::io::copy(&mut body, &mut file)
                .await
                .with_context(|| format!("failed to write {}", temp_path.display()))?;
            file.sync_all()
                .await
                .with_context(|| format!("failed to sync {}", temp_path.display()))?;
            fs::rename(&temp_path, &final_path).await.with_context(|| {
                format!(
                    "failed to move {} to {}",
                    temp_path.display(),
                    final_path.display()
                )
            })?;
            Ok::<u64, anyhow::Error>(bytes)
        }
        .await;

        match written {
            Ok(size_bytes) => {
                info!(
                    path = %final_path.display(),
                    %class,
                    size_bytes,
                    "local_assets: asset stored"
                );
                Ok(final_path)
            }
            Err(err) => {
                if let Err(cleanup_err) = fs::remove_file(&temp_path).await {
                    if cleanup_err.kind() != ErrorKind::NotFound {
                        warn!(
                            path = %temp_path.display(),
                            error = %cleanup_err,
                            "local_assets: failed to remove partial upload"
                        );
                    }
                }
                Err(err)
            }
        }
    }

    async fn delete_stale(&self, class: AssetClass, video_id: Uuid) -> Result<Option<PathBuf>> {
        let candidates = self.stale_candidates(class, video_id).await?;
        let Some(first) = candidates.first() else {
            debug!(%video_id, %class, "local_assets: no previous asset to delete");
            return Ok(None);
        };

        if candidates.len() > 1 {
            warn!(
                %video_id,
                %class,
                count = candidates.len(),
                "local_assets: more than one previous asset found, deleting the first"
            );
        }

        let path = self.root_for(class).join(first);
        self.remove(path.clone()).await?;
        info!(%video_id, %class, path = %path.display(), "local_assets: previous asset deleted");

        Ok(Some(path))
    }

    async fn remove(&self, path: PathBuf) -> Result<()> {
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
        }
    }
}
