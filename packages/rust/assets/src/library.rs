//! Content-addressed media directory.

use std::path::{Path, PathBuf};

use newsroom_shared::{NewsroomError, Result};
use sha2::{Digest, Sha256};

/// A file written to the media library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Hex SHA-256 of the bytes.
    pub hash: String,
    pub path: PathBuf,
    /// `false` when identical bytes were already on disk.
    pub written: bool,
}

/// Stores asset bytes as `<dir>/<sha256>.<ext>`.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    dir: PathBuf,
}

impl MediaLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under their content hash. Identical content is stored once.
    pub fn store(&self, bytes: &[u8], extension: &str) -> Result<StoredFile> {
        let hash = compute_hash(bytes);
        let target = self.dir.join(format!("{hash}.{extension}"));
        if target.exists() {
            return Ok(StoredFile {
                hash,
                path: target,
                written: false,
            });
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| NewsroomError::io(&self.dir, e))?;
        // Write then rename so a crash never leaves a truncated file under the final name.
        let temp = target.with_extension(format!("{extension}.tmp"));
        std::fs::write(&temp, bytes).map_err(|e| NewsroomError::io(&temp, e))?;
        std::fs::rename(&temp, &target).map_err(|e| NewsroomError::io(&target, e))?;

        Ok(StoredFile {
            hash,
            path: target,
            written: true,
        })
    }
}

/// Compute SHA-256 hash of content.
pub fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// File extension for an asset, from its URL path or else its content type.
pub fn extension_for(url: &str, content_type: Option<&str>) -> &'static str {
    const KNOWN: [&str; 7] = ["jpg", "jpeg", "png", "gif", "webp", "svg", "avif"];

    let from_path = url::Url::parse(url).ok().and_then(|u| {
        let path = u.path().to_ascii_lowercase();
        let ext = path.rsplit_once('.')?.1.to_string();
        KNOWN.into_iter().find(|k| *k == ext)
    });
    if let Some(ext) = from_path {
        return if ext == "jpeg" { "jpg" } else { ext };
    }

    match content_type {
        Some("image/jpeg") => "jpg",
        Some("image/png") => "png",
        Some("image/gif") => "gif",
        Some("image/webp") => "webp",
        Some("image/svg+xml") => "svg",
        Some("image/avif") => "avif",
        _ => "bin",
    }
}
