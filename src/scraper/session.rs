//! State shared between the observers of one browser session.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::fetcher::filename::{split_name, FilenameAllocator};

#[derive(Default)]
struct SessionState {
    /// Response URLs whose bodies were already saved (or are being saved)
    captured_urls: HashSet<String>,
    /// In-flight browser downloads: guid -> suggested filename
    downloads: HashMap<String, String>,
    saved: Vec<PathBuf>,
}

/// Lives for one browser session and is dropped when it closes.
///
/// Response captures are named after the reference being fetched; browser
/// downloads keep the name the site suggested. Every write claims its
/// filename with exclusive creation since observers run concurrently.
pub struct SessionContext {
    output_dir: PathBuf,
    staging_dir: PathBuf,
    base_name: String,
    extension: String,
    allocator: FilenameAllocator,
    state: Mutex<SessionState>,
}

impl SessionContext {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        staging_dir: impl Into<PathBuf>,
        base_name: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            staging_dir: staging_dir.into(),
            base_name: base_name.into(),
            extension: extension.into(),
            allocator: FilenameAllocator::new(),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Where the browser is told to put downloads before they are moved.
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub async fn is_captured(&self, url: &str) -> bool {
        self.state.lock().await.captured_urls.contains(url)
    }

    /// Save an intercepted response body. Returns `None` when `url` was
    /// already captured in this session.
    pub async fn save_capture(&self, url: &str, body: &[u8]) -> io::Result<Option<PathBuf>> {
        if url.is_empty() || !self.state.lock().await.captured_urls.insert(url.to_string()) {
            return Ok(None);
        }

        let written = async {
            let (path, mut file) = self
                .allocator
                .create_unique(&self.output_dir, &self.base_name, &self.extension)
                .await?;
            file.write_all(body).await?;
            file.flush().await?;
            Ok::<_, io::Error>(path)
        }
        .await;

        let mut state = self.state.lock().await;
        match written {
            Ok(path) => {
                state.saved.push(path.clone());
                Ok(Some(path))
            }
            Err(e) => {
                // Let a later response for the same URL try again
                state.captured_urls.remove(url);
                Err(e)
            }
        }
    }

    pub async fn begin_download(&self, guid: &str, suggested_name: &str) {
        self.state
            .lock()
            .await
            .downloads
            .insert(guid.to_string(), suggested_name.to_string());
    }

    /// Move a finished download out of staging into the output directory.
    pub async fn complete_download(&self, guid: &str) -> io::Result<Option<PathBuf>> {
        let Some(suggested) = self.state.lock().await.downloads.remove(guid) else {
            return Ok(None);
        };

        let (stem, ext) = match split_name(&suggested) {
            (stem, _) if stem.trim().is_empty() => (self.base_name.as_str(), None),
            split => split,
        };
        let ext = ext.unwrap_or("");

        let staged = self.staging_dir.join(guid);
        let (target, placeholder) = self
            .allocator
            .create_unique(&self.output_dir, stem, ext)
            .await?;
        drop(placeholder);

        if let Err(e) = move_file(&staged, &target).await {
            let _ = tokio::fs::remove_file(&target).await;
            return Err(e);
        }

        self.state.lock().await.saved.push(target.clone());
        Ok(Some(target))
    }

    pub async fn cancel_download(&self, guid: &str) {
        self.state.lock().await.downloads.remove(guid);
        let _ = tokio::fs::remove_file(self.staging_dir.join(guid)).await;
    }

    pub async fn in_flight(&self) -> usize {
        self.state.lock().await.downloads.len()
    }

    pub async fn saved(&self) -> Vec<PathBuf> {
        self.state.lock().await.saved.clone()
    }
}

/// Rename, falling back to copy + delete across filesystems.
async fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await
}
