//! Give the first two image blocks of a document two distinct images.

use std::collections::HashSet;

use newsroom_shared::{ImageRef, NewsroomError, Result};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::block::ContentBlock;
use crate::document::ArticleDocument;

/// Result of [`redistribute_images`].
#[derive(Debug, Clone, PartialEq)]
pub enum Redistributed {
    /// The first two image blocks now point at the given pair.
    Replaced {
        document: ArticleDocument,
        /// Images the two blocks referenced before.
        previous: (ImageRef, ImageRef),
    },
    /// The document has fewer than two image blocks; nothing was changed.
    InsufficientImages { found: usize },
}

/// Point the first two image blocks at `pair`, leaving order and every other
/// field as it was. The two images of the pair must differ, and neither may
/// already be shown by a later image block of the document.
pub fn redistribute_images(
    doc: &ArticleDocument,
    pair: (ImageRef, ImageRef),
) -> Result<Redistributed> {
    if pair.0 == pair.1 {
        return Err(NewsroomError::validation(format!(
            "replacement images must differ, got {} twice",
            pair.0
        )));
    }

    let found = doc.image_count();
    if found < 2 {
        return Ok(Redistributed::InsufficientImages { found });
    }

    let refs = doc.image_refs();
    if let Some(taken) = [pair.0, pair.1].into_iter().find(|image| refs[2..].contains(image)) {
        return Err(NewsroomError::validation(format!(
            "replacement image {taken} is already used further down the article"
        )));
    }

    let mut previous = Vec::with_capacity(2);
    let mut replacements = [pair.0, pair.1].into_iter();
    let blocks = doc
        .iter()
        .map(|block| match block {
            ContentBlock::Image { id, value } if previous.len() < 2 => {
                previous.push(value.image);
                let mut value = value.clone();
                if let Some(image) = replacements.next() {
                    value.image = image;
                }
                ContentBlock::Image {
                    id: id.clone(),
                    value,
                }
            }
            other => other.clone(),
        })
        .collect();

    Ok(Redistributed::Replaced {
        document: ArticleDocument::new(blocks),
        previous: (previous[0], previous[1]),
    })
}

// ---------------------------------------------------------------------------
// ImagePool
// ---------------------------------------------------------------------------

/// Shuffled pool of images handed out in pairs across one batch run.
///
/// While the pool holds at least two images per document, no image is
/// handed out twice. A smaller pool wraps around, so different documents may
/// share images; the two images of one pair always differ.
#[derive(Debug, Clone)]
pub struct ImagePool {
    images: Vec<ImageRef>,
    cursor: usize,
    documents: usize,
}

impl ImagePool {
    /// Build a pool for a batch of `documents` documents.
    pub fn new<R: Rng + ?Sized>(
        images: impl IntoIterator<Item = ImageRef>,
        documents: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut images: Vec<ImageRef> =
            images.into_iter().filter(|image| seen.insert(*image)).collect();
        if images.len() < 2 {
            return Err(NewsroomError::validation(format!(
                "image pool needs at least 2 distinct images, has {}",
                images.len()
            )));
        }
        images.shuffle(rng);
        Ok(Self {
            images,
            cursor: 0,
            documents,
        })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Whether the pool is too small to keep images unique across documents.
    pub fn is_shared(&self) -> bool {
        self.images.len() < 2 * self.documents
    }

    /// Hand out the next image not in `skip`. The chosen image is swapped into
    /// the cursor's slot, so skipped images stay ahead of the cursor.
    fn draw(&mut self, skip: &[ImageRef]) -> Option<ImageRef> {
        let len = self.images.len();
        let slot = self.cursor % len;
        let found = (0..len)
            .map(|offset| (slot + offset) % len)
            .find(|&i| !skip.contains(&self.images[i]))?;
        self.images.swap(slot, found);
        self.cursor += 1;
        Some(self.images[slot])
    }

    /// Next pair of distinct images, avoiding `in_use` (the images a document
    /// keeps besides the two being replaced). `None` when the pool has no two
    /// such images.
    pub fn next_pair(&mut self, in_use: &[ImageRef]) -> Option<(ImageRef, ImageRef)> {
        let mut skip = in_use.to_vec();
        let first = self.draw(&skip)?;
        skip.push(first);
        let second = self.draw(&skip)?;
        Some((first, second))
    }
}
