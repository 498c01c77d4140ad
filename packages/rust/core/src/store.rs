//! The content store seam the batch runner works against.

use newsroom_content::ArticleDocument;
use newsroom_shared::{ArticleFilter, ArticleMeta, Result};
use newsroom_storage::Storage;

/// List, read and publish article bodies, keyed by slug.
#[allow(async_fn_in_trait)]
pub trait ContentStore {
    /// Metadata of every article selected by `filter`.
    async fn list_documents(&self, filter: &ArticleFilter) -> Result<Vec<ArticleMeta>>;

    /// Current published body.
    async fn read_body(&self, slug: &str) -> Result<ArticleDocument>;

    /// Persist `body` as a new revision and publish it. Returns the revision id.
    async fn publish_body(&self, slug: &str, body: &ArticleDocument) -> Result<String>;
}

impl ContentStore for Storage {
    async fn list_documents(&self, filter: &ArticleFilter) -> Result<Vec<ArticleMeta>> {
        self.list_articles(filter).await
    }

    async fn read_body(&self, slug: &str) -> Result<ArticleDocument> {
        Storage::read_body(self, slug).await
    }

    async fn publish_body(&self, slug: &str, body: &ArticleDocument) -> Result<String> {
        self.publish_revision(slug, body).await
    }
}

/// In-memory store for runner tests.
#[cfg(test)]
pub(crate) mod memory {
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Mutex;

    use super::*;
    use newsroom_shared::NewsroomError;

    #[derive(Default)]
    pub(crate) struct MemoryStore {
        articles: Mutex<BTreeMap<String, (ArticleMeta, ArticleDocument)>>,
        revisions: Mutex<Vec<(String, ArticleDocument)>>,
        /// Slugs whose body fails to read.
        pub broken: HashSet<String>,
        /// Slugs whose publish fails.
        pub read_only: HashSet<String>,
    }

    impl MemoryStore {
        pub(crate) fn insert(&self, meta: ArticleMeta, body: ArticleDocument) {
            self.articles
                .lock()
                .unwrap()
                .insert(meta.slug.clone(), (meta, body));
        }

        pub(crate) fn body(&self, slug: &str) -> Option<ArticleDocument> {
            self.articles
                .lock()
                .unwrap()
                .get(slug)
                .map(|(_, body)| body.clone())
        }

        pub(crate) fn revision_count(&self) -> usize {
            self.revisions.lock().unwrap().len()
        }
    }

    impl ContentStore for MemoryStore {
        async fn list_documents(&self, filter: &ArticleFilter) -> Result<Vec<ArticleMeta>> {
            Ok(self
                .articles
                .lock()
                .unwrap()
                .values()
                .filter(|(meta, _)| filter.matches(meta))
                .map(|(meta, _)| meta.clone())
                .collect())
        }

        async fn read_body(&self, slug: &str) -> Result<ArticleDocument> {
            if self.broken.contains(slug) {
                return Err(NewsroomError::parse(format!("body of `{slug}` is corrupt")));
            }
            self.body(slug)
                .ok_or_else(|| NewsroomError::not_found(format!("article `{slug}`")))
        }

        async fn publish_body(&self, slug: &str, body: &ArticleDocument) -> Result<String> {
            if self.read_only.contains(slug) {
                return Err(NewsroomError::Storage(format!("cannot write `{slug}`")));
            }
            let mut articles = self.articles.lock().unwrap();
            let entry = articles
                .get_mut(slug)
                .ok_or_else(|| NewsroomError::not_found(format!("article `{slug}`")))?;
            entry.1 = body.clone();
            let mut revisions = self.revisions.lock().unwrap();
            revisions.push((slug.to_string(), body.clone()));
            Ok(format!("rev-{}", revisions.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::{DeduplicateImages, Mutation};
    use crate::runner::{BatchRunner, SilentProgress};
    use newsroom_content::{ContentBlock, ImageValue};
    use newsroom_shared::{BatchConfig, ImageRef};

    #[tokio::test]
    async fn runner_publishes_through_libsql_storage() {
        let path = std::env::temp_dir().join(format!("newsroom_core_{}.db", uuid::Uuid::now_v7()));
        let storage = Storage::open(&path).await.unwrap();
        let meta = ArticleMeta {
            slug: "guide".into(),
            title: "Guide".into(),
            category: Some("seo".into()),
            live: true,
        };
        let image = ContentBlock::image(ImageValue::new(ImageRef(3), "alt"));
        storage
            .upsert_article(
                &meta,
                &ArticleDocument::new(vec![
                    ContentBlock::rich_text("<p>x</p>"),
                    image.clone(),
                    image,
                ]),
            )
            .await
            .unwrap();

        let config = BatchConfig {
            excluded_categories: vec![],
            live_only: true,
            dry_run: false,
            only_slugs: vec![],
        };
        let mut ops: Vec<Box<dyn Mutation>> = vec![Box::new(DeduplicateImages)];
        let report = BatchRunner::new(&storage, config)
            .run(&mut ops, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(report.mutated(), 1);

        assert_eq!(ContentStore::read_body(&storage, "guide").await.unwrap().image_count(), 1);
        assert_eq!(storage.list_revisions("guide").await.unwrap().len(), 1);
    }
}
