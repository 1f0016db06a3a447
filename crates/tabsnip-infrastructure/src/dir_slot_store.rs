//! Durable screenshot slot backed by a directory.
//!
//! Layout:
//!
//! ```text
//! <dir>/
//! ├── screenshot.png    # the artifact bytes
//! └── screenshot.toml   # dimensions, timestamp, optional remote id
//! ```
//!
//! Both files are written via tmp file + fsync + atomic rename, with the
//! metadata renamed last. A reader therefore sees either the previous
//! complete capture or the new one, never a torn mix.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use tabsnip_core::error::{Result, SnipError};
use tabsnip_core::frame::Artifact;
use tabsnip_core::slot::{SlotStore, StoredScreenshot};

const PNG_FILE: &str = "screenshot.png";
const META_FILE: &str = "screenshot.toml";

/// Sidecar metadata stored next to the PNG.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotMeta {
    width: u32,
    height: u32,
    captured_at: String,
    #[serde(default)]
    remote_id: Option<String>,
}

/// A [`SlotStore`] persisted under a directory, surviving restarts.
pub struct DirSlotStore {
    dir: PathBuf,
}

impl DirSlotStore {
    /// Creates a store rooted at `dir`. The directory is created lazily on
    /// the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn png_path(&self) -> PathBuf {
        self.dir.join(PNG_FILE)
    }

    fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE)
    }

    /// Writes `bytes` to `path` atomically: tmp file in the same directory,
    /// fsync, then rename over the destination.
    async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            SnipError::storage(format!("slot path {} has no parent", path.display()))
        })?;
        let file_name = path.file_name().ok_or_else(|| {
            SnipError::storage(format!("slot path {} has no file name", path.display()))
        })?;

        let tmp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));
        let mut tmp_file = tokio::fs::File::create(&tmp_path).await?;
        tmp_file.write_all(bytes).await?;

        // Ensure data is on disk before the rename makes it visible
        tmp_file.sync_all().await?;
        drop(tmp_file);

        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }

    async fn load_meta(&self) -> Result<Option<SlotMeta>> {
        let content = match tokio::fs::read_to_string(self.meta_path()).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(toml::from_str(&content)?))
    }

    async fn save_meta(&self, meta: &SlotMeta) -> Result<()> {
        let toml_string = toml::to_string_pretty(meta)?;
        Self::write_atomic(&self.meta_path(), toml_string.as_bytes()).await
    }

    async fn remove_if_present(path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SlotStore for DirSlotStore {
    async fn put(&self, artifact: Artifact) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // PNG first, metadata last: the metadata rename is the commit point.
        Self::write_atomic(&self.png_path(), &artifact.png).await?;
        self.save_meta(&SlotMeta {
            width: artifact.width,
            height: artifact.height,
            captured_at: artifact.captured_at.clone(),
            remote_id: None,
        })
        .await?;

        tracing::debug!(
            "[DirSlotStore] stored {}x{} artifact under {}",
            artifact.width,
            artifact.height,
            self.dir.display()
        );
        Ok(())
    }

    async fn get(&self) -> Result<Option<StoredScreenshot>> {
        let Some(meta) = self.load_meta().await? else {
            return Ok(None);
        };

        let png = match tokio::fs::read(self.png_path()).await {
            Ok(png) => png,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SnipError::storage(format!(
                    "slot metadata present but {} is missing",
                    self.png_path().display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Some(StoredScreenshot {
            artifact: Artifact {
                png,
                width: meta.width,
                height: meta.height,
                captured_at: meta.captured_at,
            },
            remote_id: meta.remote_id,
        }))
    }

    async fn set_remote_id(&self, remote_id: String) -> Result<()> {
        let mut meta = self.load_meta().await?.ok_or_else(|| {
            SnipError::storage("cannot attach a remote id to an empty slot")
        })?;
        meta.remote_id = Some(remote_id);
        self.save_meta(&meta).await
    }

    async fn clear(&self) -> Result<()> {
        // Metadata first so a crash between the two deletes cannot leave a
        // slot that claims an image it no longer has.
        Self::remove_if_present(&self.meta_path()).await?;
        Self::remove_if_present(&self.png_path()).await?;
        tracing::debug!("[DirSlotStore] cleared slot under {}", self.dir.display());
        Ok(())
    }
}
