//! Restructure a text-heavy body into alternating text sections and images.
//!
//! All rich text is cut into paragraphs and regrouped into `sections`
//! contiguous, non-empty sections of roughly equal paragraph count
//! (boundary `k` at `max(k, ⌊k·n/sections⌋)`). Images go between sections in
//! their original order; any images left over follow the last section.
//!
//! Headings, quotes, callouts, FAQ lists and opaque blocks are not dropped:
//! each stays attached to the section holding the last paragraph that came
//! before it, or at the top if no text preceded it.

use newsroom_shared::BlockId;

use crate::block::ContentBlock;
use crate::document::ArticleDocument;
use crate::html::split_paragraphs;

/// Default number of text sections.
pub const DEFAULT_SECTIONS: usize = 3;

/// Result of [`split_and_interleave`].
#[derive(Debug, Clone, PartialEq)]
pub struct Interleaved {
    pub document: ArticleDocument,
    /// Number of rich text sections in the output (0 when there was no text).
    pub sections: usize,
    /// Number of paragraphs found in the input.
    pub paragraphs: usize,
}

/// Regroup the document's rich text into `sections` sections separated by its images.
///
/// Section `k` reuses the id of the `k`-th rich text block of the input;
/// sections beyond the input's block count get fresh ids. Running the
/// operation on its own output is a no-op.
pub fn split_and_interleave(doc: &ArticleDocument, sections: usize) -> Interleaved {
    let sections = sections.max(1);

    let mut text_ids: Vec<BlockId> = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut images: Vec<ContentBlock> = Vec::new();
    // (paragraphs seen before the block, block)
    let mut anchored: Vec<(usize, ContentBlock)> = Vec::new();

    for block in doc {
        match block {
            ContentBlock::RichText { id, html } => {
                text_ids.push(id.clone());
                paragraphs.extend(split_paragraphs(html));
            }
            ContentBlock::Image { .. } => images.push(block.clone()),
            other => anchored.push((paragraphs.len(), other.clone())),
        }
    }

    let n = paragraphs.len();
    if n == 0 {
        return Interleaved {
            document: doc.clone(),
            sections: 0,
            paragraphs: 0,
        };
    }

    let bounds = section_bounds(n, sections);
    let section_count = bounds.len() - 1;
    let section_of = |paragraph: usize| bounds.windows(2).position(|w| paragraph < w[1]);

    let mut top: Vec<ContentBlock> = Vec::new();
    let mut per_section: Vec<Vec<ContentBlock>> = vec![Vec::new(); section_count];
    for (seen, block) in anchored {
        match seen.checked_sub(1).and_then(section_of) {
            Some(section) => per_section[section].push(block),
            None => top.push(block),
        }
    }

    let mut images = images.into_iter();
    let mut blocks = top;
    for (k, window) in bounds.windows(2).enumerate() {
        let id = text_ids.get(k).cloned().unwrap_or_else(BlockId::generate);
        blocks.push(ContentBlock::RichText {
            id,
            html: paragraphs[window[0]..window[1]].concat(),
        });
        blocks.append(&mut per_section[k]);
        if k + 1 < section_count {
            if let Some(image) = images.next() {
                blocks.push(image);
            }
        }
    }
    blocks.extend(images);

    tracing::debug!(
        paragraphs = n,
        sections = section_count,
        blocks = blocks.len(),
        "interleaved text sections"
    );

    Interleaved {
        document: ArticleDocument::new(blocks),
        sections: section_count,
        paragraphs: n,
    }
}

/// Paragraph index boundaries `[0, b1, .., n]` for up to `sections` sections.
fn section_bounds(n: usize, sections: usize) -> Vec<usize> {
    let count = sections.min(n);
    let mut bounds = Vec::with_capacity(count + 1);
    bounds.push(0);
    for k in 1..count {
        let cut = if n >= sections { (k * n / sections).max(k) } else { k };
        bounds.push(cut);
    }
    bounds.push(n);
    bounds
}
