//! TOML manifest of images to import.
//!
//! ```toml
//! [[image]]
//! title = "Marketing dashboard"
//! url = "https://images.example.com/dashboard.jpg"
//! ```

use std::path::Path;

use newsroom_shared::{NewsroomError, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    /// Unique title in the image registry.
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageManifest {
    #[serde(default, rename = "image")]
    pub images: Vec<ManifestEntry>,
}

impl ImageManifest {
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(content)
            .map_err(|e| NewsroomError::parse(format!("invalid image manifest: {e}")))?;
        for entry in &manifest.images {
            if entry.title.trim().is_empty() {
                return Err(NewsroomError::validation(format!(
                    "image manifest entry for {} has an empty title",
                    entry.url
                )));
            }
        }
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| NewsroomError::io(path, e))?;
        Self::parse(&content)
    }
}
