//! Core domain types shared by every Newsroom crate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::BatchConfig;

// ---------------------------------------------------------------------------
// BlockId
// ---------------------------------------------------------------------------

/// Stable identifier of a content block, kept across edits for client-side diffing.
///
/// Existing ids are arbitrary strings; newly created blocks get a random UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl BlockId {
    /// Generate a fresh random block identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// ImageRef
// ---------------------------------------------------------------------------

/// Opaque identifier of an image in the asset store. Only identity matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(pub i64);

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ImageRef {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

// ---------------------------------------------------------------------------
// ArticleMeta
// ---------------------------------------------------------------------------

/// Metadata the batch tooling needs about an article, besides its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMeta {
    /// Stable document key.
    pub slug: String,
    /// Display title (used for logging).
    pub title: String,
    /// Category slug, if the article is categorized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Whether the article is published.
    #[serde(default = "default_live")]
    pub live: bool,
}

fn default_live() -> bool {
    true
}

impl ArticleMeta {
    /// Title cut to `max` characters for one-line console output.
    pub fn short_title(&self, max: usize) -> String {
        if self.title.chars().count() <= max {
            self.title.clone()
        } else {
            let cut: String = self.title.chars().take(max).collect();
            format!("{cut}...")
        }
    }
}

// ---------------------------------------------------------------------------
// ArticleFilter
// ---------------------------------------------------------------------------

/// Selection criteria for batch runs ("published, not in an excluded category").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    /// Only published articles.
    pub live_only: bool,
    /// Category slugs to leave out.
    pub excluded_categories: Vec<String>,
    /// If non-empty, only these slugs.
    pub only_slugs: Vec<String>,
}

impl ArticleFilter {
    /// Whether an article is selected by this filter.
    pub fn matches(&self, meta: &ArticleMeta) -> bool {
        if self.live_only && !meta.live {
            return false;
        }
        if let Some(category) = &meta.category {
            if self.excluded_categories.iter().any(|c| c == category) {
                return false;
            }
        }
        self.only_slugs.is_empty() || self.only_slugs.iter().any(|s| s == &meta.slug)
    }
}

impl From<&BatchConfig> for ArticleFilter {
    fn from(config: &BatchConfig) -> Self {
        Self {
            live_only: config.live_only,
            excluded_categories: config.excluded_categories.clone(),
            only_slugs: config.only_slugs.clone(),
        }
    }
}
