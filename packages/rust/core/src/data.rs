//! Versioned data files that drive batch runs: phrase tables, editorial
//! content, per-article image assignments and per-category image sets.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use newsroom_content::ImageValue;
use newsroom_content::ops::{MatchMode, TranslationTable};
use newsroom_shared::{ImageRef, NewsroomError, Result};
use serde::Deserialize;
use tracing::debug;

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| NewsroomError::io(path, e))
}

fn parse_toml<T: for<'de> Deserialize<'de>>(content: &str, what: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| NewsroomError::parse(format!("invalid {what}: {e}")))
}

// ---------------------------------------------------------------------------
// Translation tables
// ---------------------------------------------------------------------------

/// ```toml
/// mode = "auto"
///
/// [phrases]
/// "Step 1:" = "Trin 1:"
/// "Key Takeaways" = "Vigtigste pointer"
/// ```
#[derive(Debug, Deserialize)]
struct TranslationFile {
    #[serde(default)]
    mode: MatchMode,
    #[serde(default)]
    phrases: BTreeMap<String, String>,
}

pub fn parse_translation_table(content: &str) -> Result<TranslationTable> {
    let file: TranslationFile = parse_toml(content, "translation table")?;
    if file.phrases.is_empty() {
        return Err(NewsroomError::validation("translation table has no phrases"));
    }
    TranslationTable::new(file.phrases, file.mode)
}

pub fn load_translation_table(path: &Path) -> Result<TranslationTable> {
    let table = parse_translation_table(&read(path)?)?;
    debug!(path = %path.display(), phrases = table.len(), "loaded translation table");
    Ok(table)
}

// ---------------------------------------------------------------------------
// Editorial content
// ---------------------------------------------------------------------------

/// Read every `<slug>.html` file of `dir` into a slug → HTML map.
pub fn load_editorial_content(dir: &Path) -> Result<HashMap<String, String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| NewsroomError::io(dir, e))?;
    let mut content = HashMap::new();
    for entry in entries {
        let path = entry.map_err(|e| NewsroomError::io(dir, e))?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("html") {
            continue;
        }
        let Some(slug) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let html = read(&path)?;
        if html.trim().is_empty() {
            return Err(NewsroomError::validation(format!(
                "editorial content {} is empty",
                path.display()
            )));
        }
        content.insert(slug.to_string(), html);
    }
    debug!(dir = %dir.display(), articles = content.len(), "loaded editorial content");
    Ok(content)
}

// ---------------------------------------------------------------------------
// Image assignments
// ---------------------------------------------------------------------------

/// ```toml
/// [assignments]
/// "seo-guide-2024" = [12, 31]
/// ```
#[derive(Debug, Deserialize)]
struct AssignmentFile {
    #[serde(default)]
    assignments: BTreeMap<String, Vec<ImageRef>>,
}

pub type ImageAssignments = HashMap<String, (ImageRef, ImageRef)>;

pub fn parse_image_assignments(content: &str) -> Result<ImageAssignments> {
    let file: AssignmentFile = parse_toml(content, "image assignments")?;
    file.assignments
        .into_iter()
        .map(|(slug, ids)| match ids.as_slice() {
            [a, b] if a != b => Ok((slug, (*a, *b))),
            _ => Err(NewsroomError::validation(format!(
                "assignment for `{slug}` must be two different image ids, got {ids:?}"
            ))),
        })
        .collect()
}

pub fn load_image_assignments(path: &Path) -> Result<ImageAssignments> {
    parse_image_assignments(&read(path)?)
}

// ---------------------------------------------------------------------------
// Category image sets
// ---------------------------------------------------------------------------

/// An image of a category set: a bare id, or an id with texts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SetImage {
    Id(ImageRef),
    Detailed {
        image: ImageRef,
        #[serde(default)]
        alt_text: String,
        #[serde(default)]
        caption: String,
    },
}

impl From<SetImage> for ImageValue {
    fn from(image: SetImage) -> Self {
        match image {
            SetImage::Id(id) => ImageValue::new(id, ""),
            SetImage::Detailed {
                image,
                alt_text,
                caption,
            } => ImageValue::new(image, alt_text).with_caption(caption),
        }
    }
}

/// ```toml
/// [categories]
/// seo = [12, 31]
/// email = [{ image = 40, alt_text = "Nyhedsbrev" }, 41]
/// ```
#[derive(Debug, Deserialize)]
struct CategorySetFile {
    #[serde(default)]
    categories: BTreeMap<String, Vec<SetImage>>,
}

pub type CategoryImageSets = HashMap<String, Vec<ImageValue>>;

pub fn parse_category_sets(content: &str) -> Result<CategoryImageSets> {
    let file: CategorySetFile = parse_toml(content, "category image sets")?;
    Ok(file
        .categories
        .into_iter()
        .map(|(category, images)| (category, images.into_iter().map(ImageValue::from).collect()))
        .collect())
}

pub fn load_category_sets(path: &Path) -> Result<CategoryImageSets> {
    parse_category_sets(&read(path)?)
}
