//! Filesystem-backed static assets for the browser terminal.
//!
//! Request paths are reduced to a bare file name (only `[A-Za-z0-9_.-]`
//! survive), so nothing outside the two configured directories is reachable.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::ports::{Asset, AssetError, AssetResolver};

/// Suffix → content type for everything the terminal serves.
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("gif", "image/gif"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("html", "text/html"),
    ("ico", "image/x-icon"),
];

/// Suffixes served from the image directory.
const IMAGE_SUFFIXES: &[&str] = &["png", "jpg", "jpeg", "gif"];

const INDEX_FILE: &str = "index.html";

/// Serves files from a static directory and an image directory.
#[derive(Debug, Clone)]
pub struct FilesystemAssets {
    static_dir: PathBuf,
    image_dir: PathBuf,
}

impl FilesystemAssets {
    pub fn new(static_dir: impl Into<PathBuf>, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            static_dir: static_dir.into(),
            image_dir: image_dir.into(),
        }
    }

    /// Map a request path to the file it may serve, with its content type.
    fn locate(&self, path: &str) -> Option<(PathBuf, &'static str)> {
        let file_name = sanitize(path);
        if file_name.is_empty() || file_name.contains("..") {
            return None;
        }

        let suffix = file_name.rsplit('.').next()?;
        let content_type = content_type_for(suffix)?;
        let dir: &Path = if IMAGE_SUFFIXES.contains(&suffix) {
            &self.image_dir
        } else {
            &self.static_dir
        };
        Some((dir.join(file_name), content_type))
    }
}

#[async_trait]
impl AssetResolver for FilesystemAssets {
    async fn resolve(&self, path: &str) -> Result<Asset, AssetError> {
        let Some((file, content_type)) = self.locate(path) else {
            return Err(AssetError::NotFound(path.to_string()));
        };

        match tokio::fs::read(&file).await {
            Ok(body) => Ok(Asset { content_type, body }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetError::NotFound(file.display().to_string()))
            }
            Err(e) => Err(AssetError::Io(e)),
        }
    }
}

/// Reduce a request path to a bare file name; `/` means the index page.
fn sanitize(path: &str) -> String {
    if path == "/" || path.is_empty() {
        return INDEX_FILE.to_string();
    }
    path.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect()
}

fn content_type_for(suffix: &str) -> Option<&'static str> {
    CONTENT_TYPES
        .iter()
        .find(|(known, _)| *known == suffix)
        .map(|(_, content_type)| *content_type)
}
