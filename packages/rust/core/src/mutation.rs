//! Mutation adapters: each wraps one content operation together with the
//! per-run state it needs (image pool, phrase table, editorial content).

use std::collections::HashMap;

use newsroom_content::ops::{
    self, ImagePool, Redistributed, TranslationTable, deduplicate_images, insert_images,
    split_and_interleave, translate_text,
};
use newsroom_content::{ArticleDocument, ImageValue};
use newsroom_shared::{ArticleMeta, ImageRef, NewsroomError, Result};
use tracing::{debug, warn};

/// One step of a batch run, applied to each selected document in turn.
pub trait Mutation {
    /// Operation name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Produce the next version of `doc`. Returning the input unchanged means
    /// "nothing to do"; an error fails this document only.
    fn apply(&mut self, meta: &ArticleMeta, doc: ArticleDocument) -> Result<ArticleDocument>;
}

// ---------------------------------------------------------------------------
// Deduplicate
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DeduplicateImages;

impl Mutation for DeduplicateImages {
    fn name(&self) -> &'static str {
        "dedupe-images"
    }

    fn apply(&mut self, meta: &ArticleMeta, doc: ArticleDocument) -> Result<ArticleDocument> {
        let out = deduplicate_images(&doc);
        if out.removed > 0 {
            debug!(slug = %meta.slug, removed = out.removed, "removed duplicate images");
        }
        Ok(out.document)
    }
}

// ---------------------------------------------------------------------------
// Redistribute
// ---------------------------------------------------------------------------

/// Gives each document's first two image blocks a fresh pair of images.
///
/// Explicit per-slug assignments win; every other document draws from the pool.
#[derive(Debug)]
pub struct RedistributeImages {
    pool: Option<ImagePool>,
    assignments: HashMap<String, (ImageRef, ImageRef)>,
}

impl RedistributeImages {
    pub fn new(pool: Option<ImagePool>, assignments: HashMap<String, (ImageRef, ImageRef)>) -> Self {
        if pool.as_ref().is_some_and(ImagePool::is_shared) {
            warn!("image pool is smaller than two images per document; documents will share images");
        }
        Self { pool, assignments }
    }
}

impl Mutation for RedistributeImages {
    fn name(&self) -> &'static str {
        "redistribute-images"
    }

    fn apply(&mut self, meta: &ArticleMeta, doc: ArticleDocument) -> Result<ArticleDocument> {
        // Don't spend pool images on documents that cannot take them.
        if doc.image_count() < 2 {
            warn!(slug = %meta.slug, images = doc.image_count(), "insufficient images, skipping");
            return Ok(doc);
        }

        // Images the document keeps past the two being replaced.
        let refs = doc.image_refs();
        let kept = &refs[2..];
        let pair = match (self.assignments.get(&meta.slug), self.pool.as_mut()) {
            (Some(pair), _) => *pair,
            (None, Some(pool)) => pool.next_pair(kept).ok_or_else(|| {
                NewsroomError::mutation(
                    "redistribute-images",
                    format!("image pool has no two images unused by `{}`", meta.slug),
                )
            })?,
            (None, None) => {
                return Err(NewsroomError::mutation(
                    "redistribute-images",
                    format!("no image assignment for `{}` and no image pool", meta.slug),
                ));
            }
        };

        match ops::redistribute_images(&doc, pair)? {
            Redistributed::Replaced { document, previous } => {
                debug!(
                    slug = %meta.slug,
                    from = ?previous,
                    to = ?pair,
                    "replaced first two images"
                );
                Ok(document)
            }
            Redistributed::InsufficientImages { .. } => Ok(doc),
        }
    }
}

// ---------------------------------------------------------------------------
// Split and interleave
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SplitAndInterleave {
    sections: usize,
}

impl SplitAndInterleave {
    pub fn new(sections: usize) -> Self {
        Self { sections }
    }
}

impl Mutation for SplitAndInterleave {
    fn name(&self) -> &'static str {
        "restructure"
    }

    fn apply(&mut self, meta: &ArticleMeta, doc: ArticleDocument) -> Result<ArticleDocument> {
        let out = split_and_interleave(&doc, self.sections);
        debug!(
            slug = %meta.slug,
            paragraphs = out.paragraphs,
            sections = out.sections,
            "restructured body"
        );
        Ok(out.document)
    }
}

// ---------------------------------------------------------------------------
// Translate
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct TranslateText {
    table: TranslationTable,
}

impl TranslateText {
    pub fn new(table: TranslationTable) -> Self {
        Self { table }
    }
}

impl Mutation for TranslateText {
    fn name(&self) -> &'static str {
        "translate"
    }

    fn apply(&mut self, meta: &ArticleMeta, doc: ArticleDocument) -> Result<ArticleDocument> {
        let out = translate_text(&doc, &self.table);
        if out.changed() {
            debug!(slug = %meta.slug, blocks = out.changed_blocks, "translated text blocks");
        }
        Ok(out.document)
    }
}

// ---------------------------------------------------------------------------
// Expand
// ---------------------------------------------------------------------------

/// Replaces the text of short articles with editorial content keyed by slug.
#[derive(Debug)]
pub struct ExpandShort {
    threshold: usize,
    content: HashMap<String, String>,
}

impl ExpandShort {
    pub fn new(threshold: usize, content: HashMap<String, String>) -> Self {
        Self { threshold, content }
    }
}

impl Mutation for ExpandShort {
    fn name(&self) -> &'static str {
        "expand"
    }

    fn apply(&mut self, meta: &ArticleMeta, doc: ArticleDocument) -> Result<ArticleDocument> {
        if !ops::needs_expansion(&doc, self.threshold) {
            return Ok(doc);
        }
        let Some(html) = self.content.get(&meta.slug) else {
            warn!(
                slug = %meta.slug,
                chars = doc.rich_text_len(),
                "short article has no editorial content"
            );
            return Ok(doc);
        };
        debug!(slug = %meta.slug, before = doc.rich_text_len(), "expanding short article");
        Ok(ops::replace_rich_text(&doc, html))
    }
}

// ---------------------------------------------------------------------------
// Insert
// ---------------------------------------------------------------------------

/// Inserts a category's image set into each article of that category.
#[derive(Debug)]
pub struct InsertImages {
    by_category: HashMap<String, Vec<ImageValue>>,
}

impl InsertImages {
    pub fn new(by_category: HashMap<String, Vec<ImageValue>>) -> Self {
        Self { by_category }
    }
}

impl Mutation for InsertImages {
    fn name(&self) -> &'static str {
        "insert-images"
    }

    fn apply(&mut self, meta: &ArticleMeta, doc: ArticleDocument) -> Result<ArticleDocument> {
        let Some(images) = meta
            .category
            .as_ref()
            .and_then(|category| self.by_category.get(category))
        else {
            debug!(slug = %meta.slug, category = ?meta.category, "no image set for category");
            return Ok(doc);
        };
        let out = insert_images(&doc, images);
        debug!(slug = %meta.slug, inserted = out.inserted, "inserted images");
        Ok(out.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsroom_content::ContentBlock;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn meta(slug: &str, category: Option<&str>) -> ArticleMeta {
        ArticleMeta {
            slug: slug.into(),
            title: slug.into(),
            category: category.map(String::from),
            live: true,
        }
    }

    fn image(id: i64) -> ContentBlock {
        ContentBlock::image(ImageValue::new(ImageRef(id), "alt"))
    }

    #[test]
    fn redistribute_prefers_assignment() {
        let mut rng = StdRng::seed_from_u64(9);
        let pool = ImagePool::new((100..110).map(ImageRef), 2, &mut rng).unwrap();
        let assignments = HashMap::from([("fast".to_string(), (ImageRef(1), ImageRef(2)))]);
        let mut op = RedistributeImages::new(Some(pool), assignments);

        let doc = ArticleDocument::new(vec![image(5), image(6)]);
        let out = op.apply(&meta("fast", None), doc.clone()).unwrap();
        assert_eq!(out.image_refs(), vec![ImageRef(1), ImageRef(2)]);

        let out = op.apply(&meta("pool", None), doc).unwrap();
        let refs = out.image_refs();
        assert!(refs.iter().all(|r| r.0 >= 100));
        assert_ne!(refs[0], refs[1]);
    }

    #[test]
    fn redistribute_never_duplicates_kept_images() {
        let mut rng = StdRng::seed_from_u64(2);
        let pool = ImagePool::new((1..=4).map(ImageRef), 1, &mut rng).unwrap();
        let mut op = RedistributeImages::new(Some(pool), HashMap::new());

        let doc = ArticleDocument::new(vec![image(9), image(8), image(1), image(2)]);
        let out = op.apply(&meta("x", None), doc).unwrap();
        assert_eq!(out.duplicate_image_count(), 0);
        assert_eq!(&out.image_refs()[2..], &[ImageRef(1), ImageRef(2)]);
    }

    #[test]
    fn conflicting_assignment_fails_document() {
        let assignments = HashMap::from([("x".to_string(), (ImageRef(3), ImageRef(4)))]);
        let mut op = RedistributeImages::new(None, assignments);
        let doc = ArticleDocument::new(vec![image(1), image(2), image(3)]);
        assert!(op.apply(&meta("x", None), doc).is_err());
    }

    #[test]
    fn redistribute_without_source_fails_document() {
        let mut op = RedistributeImages::new(None, HashMap::new());
        let doc = ArticleDocument::new(vec![image(5), image(6)]);
        let err = op.apply(&meta("x", None), doc).unwrap_err();
        assert!(err.to_string().contains("redistribute-images"));
    }

    #[test]
    fn redistribute_skips_single_image_documents() {
        let mut op = RedistributeImages::new(None, HashMap::new());
        let doc = ArticleDocument::new(vec![image(5)]);
        assert_eq!(op.apply(&meta("x", None), doc.clone()).unwrap(), doc);
    }

    #[test]
    fn expand_only_short_with_content() {
        let content = HashMap::from([("kort".to_string(), "<p>Ny tekst</p>".to_string())]);
        let mut op = ExpandShort::new(3000, content);
        let short = ArticleDocument::new(vec![ContentBlock::rich_text("<p>x</p>")]);

        let out = op.apply(&meta("kort", None), short.clone()).unwrap();
        assert_eq!(out.blocks()[0].as_rich_text(), Some("<p>Ny tekst</p>"));

        // Short but no editorial content: unchanged.
        assert_eq!(op.apply(&meta("andet", None), short.clone()).unwrap(), short);

        let long = ArticleDocument::new(vec![ContentBlock::rich_text("a".repeat(3000))]);
        assert_eq!(op.apply(&meta("kort", None), long.clone()).unwrap(), long);
    }

    #[test]
    fn insert_by_category() {
        let sets = HashMap::from([(
            "seo".to_string(),
            vec![ImageValue::new(ImageRef(40), "a"), ImageValue::new(ImageRef(41), "b")],
        )]);
        let mut op = InsertImages::new(sets);
        let doc = ArticleDocument::new(vec![
            ContentBlock::rich_text("<p>1</p>"),
            ContentBlock::rich_text("<p>2</p>"),
            ContentBlock::rich_text("<p>3</p>"),
        ]);
        let out = op.apply(&meta("a", Some("seo")), doc.clone()).unwrap();
        assert_eq!(out.image_count(), 2);
        let untouched = op.apply(&meta("b", Some("ads")), doc.clone()).unwrap();
        assert_eq!(untouched, doc);
        assert_eq!(op.apply(&meta("c", None), doc.clone()).unwrap(), doc);
    }
}
