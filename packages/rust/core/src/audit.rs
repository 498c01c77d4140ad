//! Read-only audit of article bodies.

use newsroom_content::DocumentStats;
use newsroom_shared::{ArticleFilter, Result};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::store::ContentStore;

#[derive(Debug, Clone, Serialize)]
pub struct AuditRow {
    pub slug: String,
    pub title: String,
    pub category: Option<String>,
    #[serde(flatten)]
    pub stats: DocumentStats,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub rows: Vec<AuditRow>,
    /// Articles whose body could not be read: `(slug, error)`.
    pub failed: Vec<(String, String)>,
}

impl AuditReport {
    /// Rows of articles below the short-article threshold.
    pub fn short(&self) -> impl Iterator<Item = &AuditRow> {
        self.rows.iter().filter(|r| r.stats.needs_expansion)
    }
}

/// Collect [`DocumentStats`] for every article selected by `filter`.
#[instrument(skip_all)]
pub async fn audit<S: ContentStore>(
    store: &S,
    filter: &ArticleFilter,
    short_article_chars: usize,
) -> Result<AuditReport> {
    let mut report = AuditReport::default();
    for meta in store.list_documents(filter).await? {
        match store.read_body(&meta.slug).await {
            Ok(body) => report.rows.push(AuditRow {
                stats: DocumentStats::of(&body, short_article_chars),
                slug: meta.slug,
                title: meta.title,
                category: meta.category,
            }),
            Err(e) => {
                warn!(slug = %meta.slug, error = %e, "cannot audit article");
                report.failed.push((meta.slug, e.to_string()));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use newsroom_content::{ArticleDocument, ContentBlock, ImageValue};
    use newsroom_shared::{ArticleMeta, ImageRef};

    fn meta(slug: &str) -> ArticleMeta {
        ArticleMeta {
            slug: slug.into(),
            title: slug.into(),
            category: None,
            live: true,
        }
    }

    #[tokio::test]
    async fn audits_every_article() {
        let mut store = MemoryStore::default();
        store.insert(
            meta("kort"),
            ArticleDocument::new(vec![
                ContentBlock::rich_text("<p>kort</p>"),
                ContentBlock::image(ImageValue::new(ImageRef(1), "a")),
                ContentBlock::image(ImageValue::new(ImageRef(1), "b")),
            ]),
        );
        store.insert(
            meta("lang"),
            ArticleDocument::new(vec![ContentBlock::rich_text("a".repeat(3500))]),
        );
        store.insert(meta("brudt"), ArticleDocument::default());
        store.broken.insert("brudt".into());

        let report = audit(&store, &ArticleFilter::default(), 3000).await.unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.failed.len(), 1);

        let short: Vec<&str> = report.short().map(|r| r.slug.as_str()).collect();
        assert_eq!(short, ["kort"]);
        let kort = &report.rows[0];
        assert_eq!(kort.stats.duplicate_images, 1);
    }
}
