//! Drop image blocks that repeat an image already shown earlier in the body.

use std::collections::HashSet;

use crate::block::ContentBlock;
use crate::document::ArticleDocument;

/// Result of [`deduplicate_images`].
#[derive(Debug, Clone, PartialEq)]
pub struct Deduplicated {
    pub document: ArticleDocument,
    /// Number of image blocks removed.
    pub removed: usize,
}

/// Keep the first image block per image reference and drop later repeats.
///
/// Non-image blocks are untouched and the relative order of everything kept
/// is preserved. Idempotent.
pub fn deduplicate_images(doc: &ArticleDocument) -> Deduplicated {
    if doc.image_count() < 2 {
        return Deduplicated {
            document: doc.clone(),
            removed: 0,
        };
    }

    let mut seen = HashSet::new();
    let mut removed = 0;
    let blocks: Vec<ContentBlock> = doc
        .iter()
        .filter(|block| match block.image_ref() {
            Some(image) if !seen.insert(image) => {
                removed += 1;
                false
            }
            _ => true,
        })
        .cloned()
        .collect();

    Deduplicated {
        document: ArticleDocument::new(blocks),
        removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ImageValue;
    use newsroom_shared::ImageRef;

    fn image(id: i64) -> ContentBlock {
        ContentBlock::image(ImageValue::new(ImageRef(id), format!("img {id}")))
    }

    #[test]
    fn removes_repeated_image() {
        let doc = ArticleDocument::new(vec![
            ContentBlock::rich_text("<p>Tekst</p>"),
            image(5),
            image(5),
            image(7),
        ]);
        let out = deduplicate_images(&doc);
        assert_eq!(out.removed, 1);
        assert_eq!(out.document.image_refs(), vec![ImageRef(5), ImageRef(7)]);
        assert_eq!(out.document.len(), 3);
        assert_eq!(out.document.blocks()[0], doc.blocks()[0]);
        // The first occurrence is the one kept.
        assert_eq!(out.document.blocks()[1], doc.blocks()[1]);
    }

    #[test]
    fn idempotent() {
        let doc = ArticleDocument::new(vec![
            image(1),
            ContentBlock::rich_text("<p>a</p>"),
            image(2),
            image(1),
            ContentBlock::rich_text("<p>b</p>"),
            image(2),
            image(3),
        ]);
        let once = deduplicate_images(&doc);
        let twice = deduplicate_images(&once.document);
        assert_eq!(once.removed, 2);
        assert_eq!(twice.removed, 0);
        assert_eq!(once.document, twice.document);
    }

    #[test]
    fn keeps_one_block_per_distinct_image_in_order() {
        let doc = ArticleDocument::new(vec![image(9), image(3), image(9), image(4), image(3)]);
        let out = deduplicate_images(&doc);
        assert_eq!(
            out.document.image_refs(),
            vec![ImageRef(9), ImageRef(3), ImageRef(4)]
        );
        assert_eq!(out.document.duplicate_image_count(), 0);
    }

    #[test]
    fn rich_text_length_unchanged() {
        let doc = ArticleDocument::new(vec![
            ContentBlock::rich_text("<p>Lang tekst her</p>"),
            image(1),
            image(1),
        ]);
        let out = deduplicate_images(&doc);
        assert_eq!(out.document.rich_text_len(), doc.rich_text_len());
    }

    #[test]
    fn zero_or_one_image_is_noop() {
        let empty = ArticleDocument::default();
        assert_eq!(deduplicate_images(&empty).document, empty);

        let single = ArticleDocument::new(vec![ContentBlock::rich_text("<p>x</p>"), image(1)]);
        let out = deduplicate_images(&single);
        assert_eq!(out.removed, 0);
        assert_eq!(out.document, single);
    }
}
