use crates::domain::value_objects::enums::asset_classes::AssetClass;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

type LockKey = (Uuid, AssetClass);

/// Per-(video, asset class) mutual exclusion for the replace-and-publish
/// sequence. Entries live only while someone holds or waits for them.
#[derive(Clone, Default)]
pub struct UploadLocks {
    table: Arc<Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>>,
}

pub struct UploadGuard {
    key: LockKey,
    locks: UploadLocks,
    held: Option<OwnedMutexGuard<()>>,
}

impl UploadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, video_id: Uuid, class: AssetClass) -> UploadGuard {
        let key = (video_id, class);
        let mutex = Arc::clone(self.lock_table().entry(key).or_default());

        // Built before waiting so a cancelled waiter still cleans its entry up.
        let mut guard = UploadGuard {
            key,
            locks: self.clone(),
            held: None,
        };
        guard.held = Some(mutex.lock_owned().await);
        guard
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.lock_table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_table(&self) -> MutexGuard<'_, HashMap<LockKey, Arc<AsyncMutex<()>>>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        drop(self.held.take());

        let mut table = self.locks.lock_table();
        let unused = table
            .get(&self.key)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1);
        if unused {
            table.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };
    use tokio::time::{sleep, timeout};

    #[tokio::test]
    async fn same_key_is_serialized() {
        let locks = UploadLocks::new();
        let video_id = Uuid::new_v4();
        let entered = Arc::new(AtomicBool::new(false));

        let first = locks.acquire(video_id, AssetClass::Thumbnail).await;

        let waiter = {
            let locks = locks.clone();
            let entered = Arc::clone(&entered);
            tokio::spawn(async move {
                let _guard = locks.acquire(video_id, AssetClass::Thumbnail).await;
                entered.store(true, Ordering::SeqCst);
            })
        };

        sleep(Duration::from_millis(50)).await;
        assert!(!entered.load(Ordering::SeqCst));

        drop(first);
        waiter.await.unwrap();
        assert!(entered.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn different_classes_do_not_block_each_other() {
        let locks = UploadLocks::new();
        let video_id = Uuid::new_v4();

        let _thumbnail = locks.acquire(video_id, AssetClass::Thumbnail).await;
        let video = timeout(
            Duration::from_secs(1),
            locks.acquire(video_id, AssetClass::Video),
        )
        .await;

        assert!(video.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn entries_are_removed_after_release() {
        let locks = UploadLocks::new();
        let video_id = Uuid::new_v4();

        {
            let _guard = locks.acquire(video_id, AssetClass::Video).await;
            assert_eq!(locks.len(), 1);
        }

        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn cancelled_waiter_does_not_leak_entry() {
        let locks = UploadLocks::new();
        let video_id = Uuid::new_v4();

        let holder = locks.acquire(video_id, AssetClass::Video).await;
        let waited = timeout(
            Duration::from_millis(20),
            locks.acquire(video_id, AssetClass::Video),
        )
        .await;
        assert!(waited.is_err());

        drop(holder);
        assert!(locks.is_empty());
    }
}
