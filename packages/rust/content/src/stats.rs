//! Read-only per-document statistics for audit reports.

use serde::Serialize;

use crate::block::ContentBlock;
use crate::document::ArticleDocument;
use crate::html::{paragraph_count, strip_tags};
use crate::ops::needs_expansion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    pub blocks: usize,
    /// Sum of rich text HTML lengths in characters.
    pub rich_text_chars: usize,
    /// Rich text length with tags stripped.
    pub visible_chars: usize,
    pub paragraphs: usize,
    pub images: usize,
    pub duplicate_images: usize,
    pub needs_expansion: bool,
}

impl DocumentStats {
    pub fn of(doc: &ArticleDocument, short_article_chars: usize) -> Self {
        let html = || doc.iter().filter_map(ContentBlock::as_rich_text);
        Self {
            blocks: doc.len(),
            rich_text_chars: doc.rich_text_len(),
            visible_chars: html().map(|h| strip_tags(h).chars().count()).sum(),
            paragraphs: html().map(paragraph_count).sum(),
            images: doc.image_count(),
            duplicate_images: doc.duplicate_image_count(),
            needs_expansion: needs_expansion(doc, short_article_chars),
        }
    }
}
