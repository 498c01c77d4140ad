//! Insert new image blocks at one-third and two-thirds of a body.

use crate::block::{ContentBlock, ImageValue};
use crate::document::ArticleDocument;

/// Result of [`insert_images`].
#[derive(Debug, Clone, PartialEq)]
pub struct Inserted {
    pub document: ArticleDocument,
    /// Number of image blocks added.
    pub inserted: usize,
}

/// Insert up to two images as new blocks.
///
/// With `n` blocks the images land at positions `max(1, n/3)` and
/// `max(2, 2n/3)`; bodies of fewer than three blocks get them appended.
/// Images the document already shows, and repeats within `images`, are
/// skipped so no image appears twice.
pub fn insert_images(doc: &ArticleDocument, images: &[ImageValue]) -> Inserted {
    let mut fresh: Vec<&ImageValue> = Vec::new();
    for value in images {
        if doc.references_image(value.image) || fresh.iter().any(|v| v.image == value.image) {
            continue;
        }
        fresh.push(value);
        if fresh.len() == 2 {
            break;
        }
    }

    if fresh.is_empty() {
        return Inserted {
            document: doc.clone(),
            inserted: 0,
        };
    }

    let mut blocks = doc.blocks().to_vec();
    let n = blocks.len();
    if n < 3 {
        blocks.extend(fresh.iter().map(|v| ContentBlock::image((*v).clone())));
    } else {
        let positions = [(n / 3).max(1), (2 * n / 3).max(2)];
        // Later position first so the earlier index stays valid.
        for (value, at) in fresh.iter().zip(positions).rev() {
            blocks.insert(at, ContentBlock::image((*value).clone()));
        }
    }

    Inserted {
        document: ArticleDocument::new(blocks),
        inserted: fresh.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsroom_shared::ImageRef;

    fn value(id: i64) -> ImageValue {
        ImageValue::new(ImageRef(id), format!("Billede {id}"))
    }

    fn text(n: usize) -> Vec<ContentBlock> {
        (0..n).map(|i| ContentBlock::rich_text(format!("<p>{i}</p>"))).collect()
    }

    #[test]
    fn inserts_at_thirds() {
        let doc = ArticleDocument::new(text(6));
        let out = insert_images(&doc, &[value(1), value(2)]);
        assert_eq!(out.inserted, 2);
        let types: Vec<&str> = out.document.iter().map(ContentBlock::type_name).collect();
        // Positions 2 and 4 in the original sequence.
        assert_eq!(
            types,
            ["rich_text", "rich_text", "image", "rich_text", "rich_text", "image", "rich_text", "rich_text"]
        );
        assert_eq!(out.document.image_refs(), vec![ImageRef(1), ImageRef(2)]);
    }

    #[test]
    fn short_bodies_get_images_appended() {
        let doc = ArticleDocument::new(text(2));
        let out = insert_images(&doc, &[value(1), value(2)]);
        let types: Vec<&str> = out.document.iter().map(ContentBlock::type_name).collect();
        assert_eq!(types, ["rich_text", "rich_text", "image", "image"]);
    }

    #[test]
    fn three_blocks_use_minimum_positions() {
        let doc = ArticleDocument::new(text(3));
        let out = insert_images(&doc, &[value(1), value(2)]);
        let types: Vec<&str> = out.document.iter().map(ContentBlock::type_name).collect();
        assert_eq!(types, ["rich_text", "image", "rich_text", "image", "rich_text"]);
    }

    #[test]
    fn skips_images_already_present() {
        let mut blocks = text(5);
        blocks.push(ContentBlock::image(value(1)));
        let doc = ArticleDocument::new(blocks);
        let out = insert_images(&doc, &[value(1), value(2), value(2), value(3)]);
        assert_eq!(out.inserted, 2);
        assert_eq!(out.document.duplicate_image_count(), 0);
        let mut refs = out.document.image_refs();
        refs.sort();
        assert_eq!(refs, vec![ImageRef(1), ImageRef(2), ImageRef(3)]);
    }

    #[test]
    fn nothing_new_is_noop() {
        let doc = ArticleDocument::new(vec![ContentBlock::image(value(1))]);
        let out = insert_images(&doc, &[value(1)]);
        assert_eq!(out.inserted, 0);
        assert_eq!(out.document, doc);
    }

    #[test]
    fn single_image_goes_to_first_position() {
        let doc = ArticleDocument::new(text(9));
        let out = insert_images(&doc, &[value(8)]);
        assert_eq!(out.document.blocks()[3].image_ref(), Some(ImageRef(8)));
    }
}
