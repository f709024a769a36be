//! Collision-free output names.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use url::Url;

/// Characters that are stripped from titles before they become filenames.
const FORBIDDEN: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

const MAX_NAME_CHARS: usize = 100;

/// Produces filenames that do not collide with anything already in a
/// directory.
#[derive(Debug, Clone, Default)]
pub struct FilenameAllocator;

impl FilenameAllocator {
    pub fn new() -> Self {
        Self
    }

    /// First free path among `base.ext`, `base_1.ext`, `base_2.ext`, ...
    ///
    /// A query only: nothing is claimed, so the name may be taken before the
    /// caller writes. Writers use [`create_unique`](Self::create_unique).
    pub fn allocate(&self, dir: &Path, base: &str, ext: &str) -> PathBuf {
        (0..)
            .map(|counter| dir.join(candidate_name(base, ext, counter)))
            .find(|path| !path.exists())
            .unwrap_or_else(|| dir.join(candidate_name(base, ext, 0)))
    }

    /// Like [`allocate`](Self::allocate) but claims the name by creating the
    /// file exclusively, so two writers can never be handed the same path.
    pub async fn create_unique(
        &self,
        dir: &Path,
        base: &str,
        ext: &str,
    ) -> std::io::Result<(PathBuf, File)> {
        let mut counter = 0;
        loop {
            let path = dir.join(candidate_name(base, ext, counter));
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => counter += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

fn candidate_name(base: &str, ext: &str, counter: usize) -> String {
    let stem = if counter == 0 {
        base.to_string()
    } else {
        format!("{}_{}", base, counter)
    };
    if ext.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, ext)
    }
}

/// Strip characters that are invalid in filenames and cap the length.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !FORBIDDEN.contains(c))
        .take(MAX_NAME_CHARS)
        .collect()
}

/// Sanitized last path segment of a URL, if it has one.
pub fn name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let name = sanitize(segment);
    if name.trim().is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Split `paper.pdf` into `("paper", Some("pdf"))`. Dotfiles keep their dot.
pub fn split_name(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    }
}
