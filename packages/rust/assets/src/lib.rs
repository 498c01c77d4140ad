//! Asset store collaborator: download remote images into the local media
//! library and register them in the image table.
//!
//! Downloads are sequential with a fixed timeout and no retry; a failed item
//! is logged and skipped. Titles already registered are not fetched again.

mod fetch;
mod library;
mod manifest;

use newsroom_shared::{ImageRef, Result};
use newsroom_storage::{NewImage, Storage};
use serde::Serialize;
use tracing::{info, instrument, warn};

pub use fetch::{AssetFetcher, FetchedAsset};
pub use library::{MediaLibrary, StoredFile, compute_hash, extension_for};
pub use manifest::{ImageManifest, ManifestEntry};

/// Outcome of [`import_images`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Newly registered images.
    pub imported: Vec<(String, ImageRef)>,
    /// Titles already in the registry, with their existing id.
    pub existing: Vec<(String, ImageRef)>,
    /// Titles that could not be imported, with the reason.
    pub failed: Vec<(String, String)>,
}

impl ImportReport {
    /// Ids of every image the manifest now resolves to.
    pub fn resolved_ids(&self) -> Vec<ImageRef> {
        self.imported
            .iter()
            .chain(&self.existing)
            .map(|(_, id)| *id)
            .collect()
    }
}

/// Import every manifest entry that is not registered yet.
#[instrument(skip_all, fields(entries = entries.len()))]
pub async fn import_images(
    storage: &Storage,
    fetcher: &AssetFetcher,
    library: &MediaLibrary,
    entries: &[ManifestEntry],
) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for entry in entries {
        if let Some(existing) = storage.find_image_by_title(&entry.title).await? {
            info!(title = %entry.title, id = %existing.id, "image already registered");
            report.existing.push((entry.title.clone(), existing.id));
            continue;
        }

        match import_one(storage, fetcher, library, entry).await {
            Ok(id) => {
                info!(title = %entry.title, %id, "image imported");
                report.imported.push((entry.title.clone(), id));
            }
            Err(e) => {
                warn!(title = %entry.title, url = %entry.url, error = %e, "image import failed");
                report.failed.push((entry.title.clone(), e.to_string()));
            }
        }
    }

    info!(
        imported = report.imported.len(),
        existing = report.existing.len(),
        failed = report.failed.len(),
        "image import finished"
    );
    Ok(report)
}

async fn import_one(
    storage: &Storage,
    fetcher: &AssetFetcher,
    library: &MediaLibrary,
    entry: &ManifestEntry,
) -> Result<ImageRef> {
    let asset = fetcher.fetch(&entry.url).await?;
    let extension = extension_for(&entry.url, asset.content_type.as_deref());
    let stored = library.store(&asset.bytes, extension)?;
    let file_path = stored.path.to_string_lossy();
    storage
        .insert_image(&NewImage {
            title: &entry.title,
            source_url: Some(&entry.url),
            content_hash: &stored.hash,
            file_path: &file_path,
        })
        .await
}
