//! In-memory screenshot slot.

use async_trait::async_trait;
use tokio::sync::RwLock;

use tabsnip_core::error::{Result, SnipError};
use tabsnip_core::frame::Artifact;
use tabsnip_core::slot::{SlotStore, StoredScreenshot};

/// A [`SlotStore`] held entirely in memory.
///
/// The default store for a single process run; contents vanish with the
/// process.
#[derive(Default)]
pub struct MemorySlotStore {
    slot: RwLock<Option<StoredScreenshot>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn put(&self, artifact: Artifact) -> Result<()> {
        let mut slot = self.slot.write().await;
        *slot = Some(StoredScreenshot::new(artifact));
        Ok(())
    }

    async fn get(&self) -> Result<Option<StoredScreenshot>> {
        Ok(self.slot.read().await.clone())
    }

    async fn set_remote_id(&self, remote_id: String) -> Result<()> {
        let mut slot = self.slot.write().await;
        match slot.as_mut() {
            Some(stored) => {
                stored.remote_id = Some(remote_id);
                Ok(())
            }
            None => Err(SnipError::storage(
                "cannot attach a remote id to an empty slot",
            )),
        }
    }

    async fn clear(&self) -> Result<()> {
        let mut slot = self.slot.write().await;
        *slot = None;
        Ok(())
    }
}
