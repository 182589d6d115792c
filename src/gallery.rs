//! Concurrent resolution of a suggestion's photo paths into download URLs.

use futures::future::try_join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::DownloadUrl;
use crate::storage::{StorageError, StorageState};

/// GalleryState
///
/// What the gallery section shows. Leaves `Loading` exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum GalleryState {
    Loading,
    Ready(Vec<DownloadUrl>),
    Failed(String),
}

impl GalleryState {
    pub fn is_loading(&self) -> bool {
        matches!(self, GalleryState::Loading)
    }
}

/// ImageResolver
///
/// Turns storage paths into download URLs through the injected `StorageService`.
#[derive(Clone)]
pub struct ImageResolver {
    storage: StorageState,
}

impl ImageResolver {
    pub fn new(storage: StorageState) -> Self {
        Self { storage }
    }

    /// resolve_all
    ///
    /// Issues every request at once. The output is in input order no matter
    /// which request finishes first; the first failure fails the whole batch.
    pub async fn resolve_all(&self, paths: &[String]) -> Result<Vec<DownloadUrl>, StorageError> {
        try_join_all(paths.iter().map(|path| self.storage.get_download_url(path))).await
    }

    /// spawn
    ///
    /// Runs `resolve_all` on its own task and publishes the outcome to the
    /// returned handle. Dropping the handle cancels the batch.
    pub fn spawn(&self, paths: Vec<String>) -> GalleryHandle {
        let (tx, rx) = watch::channel(GalleryState::Loading);
        let resolver = self.clone();

        let task = tokio::spawn(async move {
            let next = match resolver.resolve_all(&paths).await {
                Ok(urls) => GalleryState::Ready(urls),
                Err(e) => {
                    tracing::warn!(photos = paths.len(), error = %e, "image resolution failed");
                    GalleryState::Failed(e.to_string())
                }
            };

            // No receiver left means the page that asked is gone.
            if tx.send(next).is_err() {
                tracing::debug!("gallery result discarded, no observer");
            }
        });

        GalleryHandle { state: rx, task }
    }
}

/// GalleryHandle
///
/// Observer side of a spawned resolution batch, owned by one rendering.
pub struct GalleryHandle {
    state: watch::Receiver<GalleryState>,
    task: JoinHandle<()>,
}

impl GalleryHandle {
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn current(&self) -> GalleryState {
        self.state.borrow().clone()
    }

    /// Waits until the batch leaves `Loading`.
    pub async fn settled(&mut self) -> GalleryState {
        match self.state.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            // The task ended without publishing (panicked or was aborted).
            Err(_) => GalleryState::Failed("image resolution stopped".to_string()),
        }
    }
}

impl Drop for GalleryHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
