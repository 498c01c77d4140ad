//! Short-article detection and editorial text replacement.

use newsroom_shared::BlockId;

use crate::block::ContentBlock;
use crate::document::ArticleDocument;

/// Rich text length below which an article counts as short.
pub const DEFAULT_SHORT_ARTICLE_CHARS: usize = 3000;

/// Whether the document's rich text totals fewer than `threshold` characters.
///
/// Empty documents always need expansion (for any non-zero threshold).
pub fn needs_expansion(doc: &ArticleDocument, threshold: usize) -> bool {
    doc.rich_text_len() < threshold
}

/// Replace all rich text with a single block holding `html`.
///
/// The new block sits where the first rich text block was and keeps its id;
/// a document without rich text gets the block prepended with a fresh id.
/// Every other block keeps its relative order.
pub fn replace_rich_text(doc: &ArticleDocument, html: &str) -> ArticleDocument {
    let mut placed = false;
    let mut blocks = Vec::with_capacity(doc.len() + 1);
    for block in doc {
        match block {
            ContentBlock::RichText { id, .. } => {
                if !placed {
                    blocks.push(ContentBlock::RichText {
                        id: id.clone(),
                        html: html.to_string(),
                    });
                    placed = true;
                }
            }
            other => blocks.push(other.clone()),
        }
    }
    if !placed {
        blocks.insert(
            0,
            ContentBlock::RichText {
                id: BlockId::generate(),
                html: html.to_string(),
            },
        );
    }
    ArticleDocument::new(blocks)
}

/// [`replace_rich_text`] when the document is short, `None` otherwise.
pub fn expand_if_short(
    doc: &ArticleDocument,
    html: &str,
    threshold: usize,
) -> Option<ArticleDocument> {
    if !needs_expansion(doc, threshold) {
        return None;
    }
    Some(replace_rich_text(doc, html))
}
