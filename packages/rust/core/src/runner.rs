//! Batch runner: apply a sequence of mutations to every selected article and
//! publish a new revision only where the body actually changed.
//!
//! A failure while reading, mutating or publishing one article is recorded
//! in its [`DocumentOutcome`] and the run moves on. Only failing to list the
//! articles aborts the batch.

use std::time::{Duration, Instant};

use newsroom_content::ArticleDocument;
use newsroom_shared::{ArticleFilter, ArticleMeta, BatchConfig, Result};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::mutation::Mutation;
use crate::store::ContentStore;

/// What happened to one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DocumentOutcome {
    /// Every operation left the body as it was.
    Unchanged,
    /// The body changed. `revision_id` is `None` in dry-run mode.
    Mutated {
        revision_id: Option<String>,
        /// Operations that changed the body, in order.
        operations: Vec<String>,
    },
    /// Reading, mutating or publishing failed; nothing was persisted.
    Failed { error: String },
}

/// Outcome for one article of a run.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub slug: String,
    pub title: String,
    #[serde(flatten)]
    pub outcome: DocumentOutcome,
}

/// Result of [`BatchRunner::run`].
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub operations: Vec<String>,
    pub dry_run: bool,
    pub documents: Vec<DocumentReport>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn mutated(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Mutated { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Unchanged))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&DocumentOutcome) -> bool) -> usize {
        self.documents.iter().filter(|d| pred(&d.outcome)).count()
    }
}

/// Progress callback for reporting batch status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each article has been processed.
    fn document_done(&self, report: &DocumentReport, current: usize, total: usize);
    /// Called when the batch completes.
    fn done(&self, report: &BatchReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_done(&self, _report: &DocumentReport, _current: usize, _total: usize) {}
    fn done(&self, _report: &BatchReport) {}
}

/// Drives mutations over the articles of a [`ContentStore`].
pub struct BatchRunner<'a, S: ContentStore> {
    store: &'a S,
    config: BatchConfig,
}

impl<'a, S: ContentStore> BatchRunner<'a, S> {
    pub fn new(store: &'a S, config: BatchConfig) -> Self {
        Self { store, config }
    }

    /// Articles this runner would process.
    pub async fn select(&self) -> Result<Vec<ArticleMeta>> {
        let filter = ArticleFilter::from(&self.config);
        self.store.list_documents(&filter).await
    }

    /// Apply `mutations`, in order, to every selected article.
    #[instrument(skip_all, fields(dry_run = self.config.dry_run))]
    pub async fn run(
        &self,
        mutations: &mut [Box<dyn Mutation>],
        progress: &dyn ProgressReporter,
    ) -> Result<BatchReport> {
        let start = Instant::now();
        let operations: Vec<String> = mutations.iter().map(|m| m.name().to_string()).collect();

        progress.phase("Selecting articles");
        let articles = self.select().await?;
        let total = articles.len();
        info!(articles = total, operations = ?operations, "starting batch");

        progress.phase("Applying operations");
        let mut documents = Vec::with_capacity(total);
        for (i, meta) in articles.into_iter().enumerate() {
            let outcome = self.process(&meta, mutations).await;
            match &outcome {
                DocumentOutcome::Mutated { revision_id, operations } => info!(
                    slug = %meta.slug,
                    revision = revision_id.as_deref().unwrap_or("dry-run"),
                    operations = ?operations,
                    "article mutated"
                ),
                DocumentOutcome::Failed { error } => {
                    warn!(slug = %meta.slug, %error, "article failed")
                }
                DocumentOutcome::Unchanged => {}
            }
            let report = DocumentReport {
                slug: meta.slug,
                title: meta.title,
                outcome,
            };
            progress.document_done(&report, i + 1, total);
            documents.push(report);
        }

        let report = BatchReport {
            operations,
            dry_run: self.config.dry_run,
            documents,
            elapsed: start.elapsed(),
        };
        info!(
            mutated = report.mutated(),
            unchanged = report.unchanged(),
            failed = report.failed(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "batch finished"
        );
        progress.done(&report);
        Ok(report)
    }

    async fn process(
        &self,
        meta: &ArticleMeta,
        mutations: &mut [Box<dyn Mutation>],
    ) -> DocumentOutcome {
        let original = match self.store.read_body(&meta.slug).await {
            Ok(body) => body,
            Err(e) => return DocumentOutcome::Failed { error: e.to_string() },
        };

        let (body, changed_by) = match apply_all(meta, &original, mutations) {
            Ok(result) => result,
            Err(e) => return DocumentOutcome::Failed { error: e.to_string() },
        };

        if body == original {
            return DocumentOutcome::Unchanged;
        }

        if self.config.dry_run {
            return DocumentOutcome::Mutated {
                revision_id: None,
                operations: changed_by,
            };
        }

        match self.store.publish_body(&meta.slug, &body).await {
            Ok(revision_id) => DocumentOutcome::Mutated {
                revision_id: Some(revision_id),
                operations: changed_by,
            },
            Err(e) => DocumentOutcome::Failed { error: e.to_string() },
        }
    }
}

/// Run every mutation over `original`, returning the final body and the
/// names of the mutations that changed it.
fn apply_all(
    meta: &ArticleMeta,
    original: &ArticleDocument,
    mutations: &mut [Box<dyn Mutation>],
) -> Result<(ArticleDocument, Vec<String>)> {
    let mut body = original.clone();
    let mut changed_by = Vec::new();
    for mutation in mutations.iter_mut() {
        let next = mutation.apply(meta, body.clone())?;
        if next != body {
            changed_by.push(mutation.name().to_string());
        }
        body = next;
    }
    Ok((body, changed_by))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::{DeduplicateImages, SplitAndInterleave};
    use crate::store::memory::MemoryStore;
    use newsroom_content::{ContentBlock, ImageValue};
    use newsroom_shared::{ImageRef, NewsroomError};
    use std::sync::Mutex;

    fn meta(slug: &str, category: Option<&str>) -> ArticleMeta {
        ArticleMeta {
            slug: slug.into(),
            title: format!("Artikel {slug}"),
            category: category.map(String::from),
            live: true,
        }
    }

    fn image(id: i64) -> ContentBlock {
        ContentBlock::image(ImageValue::new(ImageRef(id), "alt"))
    }

    fn config(dry_run: bool) -> BatchConfig {
        BatchConfig {
            excluded_categories: vec!["podcasts".into()],
            live_only: true,
            dry_run,
            only_slugs: vec![],
        }
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::default();
        store.insert(
            meta("dubletter", Some("seo")),
            ArticleDocument::new(vec![
                ContentBlock::rich_text("<p>Tekst</p>"),
                image(5),
                image(5),
                image(7),
            ]),
        );
        store.insert(
            meta("ren", Some("seo")),
            ArticleDocument::new(vec![ContentBlock::rich_text("<p>Tekst</p>"), image(1)]),
        );
        store.insert(
            meta("podcast", Some("podcasts")),
            ArticleDocument::new(vec![image(2), image(2)]),
        );
        store
    }

    fn dedupe() -> Vec<Box<dyn Mutation>> {
        vec![Box::new(DeduplicateImages)]
    }

    #[tokio::test]
    async fn publishes_only_changed_documents() {
        let store = seeded_store();
        let runner = BatchRunner::new(&store, config(false));
        let report = runner.run(&mut dedupe(), &SilentProgress).await.unwrap();

        assert_eq!(report.documents.len(), 2, "podcasts are excluded");
        assert_eq!(report.mutated(), 1);
        assert_eq!(report.unchanged(), 1);
        assert_eq!(store.revision_count(), 1);
        assert_eq!(
            store.body("dubletter").unwrap().image_refs(),
            vec![ImageRef(5), ImageRef(7)]
        );
        // The excluded article is untouched.
        assert_eq!(store.body("podcast").unwrap().image_count(), 2);

        let dubletter = &report.documents[0];
        assert_eq!(dubletter.slug, "dubletter");
        assert_eq!(
            dubletter.outcome,
            DocumentOutcome::Mutated {
                revision_id: Some("rev-1".into()),
                operations: vec!["dedupe-images".into()],
            }
        );
    }

    #[tokio::test]
    async fn second_run_is_a_noop() {
        let store = seeded_store();
        let runner = BatchRunner::new(&store, config(false));
        runner.run(&mut dedupe(), &SilentProgress).await.unwrap();
        let again = runner.run(&mut dedupe(), &SilentProgress).await.unwrap();
        assert_eq!(again.mutated(), 0);
        assert_eq!(store.revision_count(), 1);
    }

    #[tokio::test]
    async fn dry_run_persists_nothing() {
        let store = seeded_store();
        let runner = BatchRunner::new(&store, config(true));
        let report = runner.run(&mut dedupe(), &SilentProgress).await.unwrap();
        assert_eq!(report.mutated(), 1);
        assert!(report.dry_run);
        assert_eq!(store.revision_count(), 0);
        assert_eq!(store.body("dubletter").unwrap().image_count(), 3);
    }

    #[tokio::test]
    async fn failures_are_isolated() {
        let mut store = seeded_store();
        store.insert(meta("brudt", None), ArticleDocument::default());
        store.broken.insert("brudt".into());
        store.read_only.insert("dubletter".into());

        let runner = BatchRunner::new(&store, config(false));
        let report = runner.run(&mut dedupe(), &SilentProgress).await.unwrap();
        assert_eq!(report.documents.len(), 3);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.unchanged(), 1);
        // A failed publish leaves the stored body as it was.
        assert_eq!(store.body("dubletter").unwrap().image_count(), 3);
    }

    struct Refuse;

    impl Mutation for Refuse {
        fn name(&self) -> &'static str {
            "refuse"
        }

        fn apply(&mut self, meta: &ArticleMeta, _doc: ArticleDocument) -> Result<ArticleDocument> {
            Err(NewsroomError::mutation("refuse", format!("will not touch {}", meta.slug)))
        }
    }

    #[tokio::test]
    async fn mutation_error_fails_document_without_partial_publish() {
        let store = seeded_store();
        let runner = BatchRunner::new(&store, config(false));
        let mut ops: Vec<Box<dyn Mutation>> = vec![Box::new(DeduplicateImages), Box::new(Refuse)];
        let report = runner.run(&mut ops, &SilentProgress).await.unwrap();
        assert_eq!(report.failed(), 2);
        assert_eq!(store.revision_count(), 0);
        assert!(matches!(
            &report.documents[0].outcome,
            DocumentOutcome::Failed { error } if error.contains("will not touch dubletter")
        ));
    }

    #[tokio::test]
    async fn operations_apply_in_order_and_are_reported() {
        let store = MemoryStore::default();
        let paragraphs: String = (0..6).map(|i| format!("<p>{i}</p>")).collect();
        store.insert(
            meta("lang", None),
            ArticleDocument::new(vec![
                ContentBlock::rich_text(paragraphs),
                image(1),
                image(1),
                image(2),
            ]),
        );
        let runner = BatchRunner::new(&store, config(false));
        let mut ops: Vec<Box<dyn Mutation>> =
            vec![Box::new(DeduplicateImages), Box::new(SplitAndInterleave::new(3))];
        let report = runner.run(&mut ops, &SilentProgress).await.unwrap();

        let types: Vec<String> = store
            .body("lang")
            .unwrap()
            .iter()
            .map(|b| b.type_name().to_string())
            .collect();
        assert_eq!(types, ["rich_text", "image", "rich_text", "image", "rich_text"]);
        assert_eq!(
            report.documents[0].outcome,
            DocumentOutcome::Mutated {
                revision_id: Some("rev-1".into()),
                operations: vec!["dedupe-images".into(), "restructure".into()],
            }
        );
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ProgressReporter for Recorder {
        fn phase(&self, name: &str) {
            self.events.lock().unwrap().push(format!("phase:{name}"));
        }
        fn document_done(&self, report: &DocumentReport, current: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("doc:{}:{current}/{total}", report.slug));
        }
        fn done(&self, report: &BatchReport) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done:{}", report.documents.len()));
        }
    }

    #[tokio::test]
    async fn reports_progress() {
        let store = seeded_store();
        let recorder = Recorder::default();
        BatchRunner::new(&store, config(true))
            .run(&mut dedupe(), &recorder)
            .await
            .unwrap();
        let events = recorder.events.lock().unwrap().clone();
        assert_eq!(
            events,
            [
                "phase:Selecting articles",
                "phase:Applying operations",
                "doc:dubletter:1/2",
                "doc:ren:2/2",
                "done:2",
            ]
        );
    }

    #[test]
    fn report_serializes_outcome_tag() {
        let report = DocumentReport {
            slug: "a".into(),
            title: "A".into(),
            outcome: DocumentOutcome::Failed {
                error: "boom".into(),
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["error"], "boom");
    }
}
