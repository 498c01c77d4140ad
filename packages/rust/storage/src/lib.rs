//! libSQL storage layer for articles, revisions and the image registry.
//!
//! The [`Storage`] struct wraps a local libSQL database. Each article row
//! holds the currently published body; every publish also appends a row to
//! `revisions`, in the same transaction, so history and current state never
//! disagree.
//!
//! **Access rules:**
//! - batch commands: read-write via [`Storage::open`]
//! - audit / export / history: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use newsroom_content::ArticleDocument;
use newsroom_shared::{ArticleFilter, ArticleMeta, ImageRef, NewsroomError, Result};
use serde::Serialize;
use uuid::Uuid;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// An article with its current body.
#[derive(Debug, Clone)]
pub struct StoredArticle {
    pub meta: ArticleMeta,
    pub body: ArticleDocument,
    pub updated_at: DateTime<Utc>,
}

/// One entry of an article's revision history.
#[derive(Debug, Clone, Serialize)]
pub struct RevisionMeta {
    pub id: String,
    pub article_slug: String,
    pub created_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
    /// Number of blocks in the revision's body.
    pub blocks: usize,
}

/// A registered image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRecord {
    pub id: ImageRef,
    pub title: String,
    pub source_url: Option<String>,
    pub content_hash: String,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}

/// Fields of an image to register.
#[derive(Debug, Clone)]
pub struct NewImage<'a> {
    pub title: &'a str,
    pub source_url: Option<&'a str>,
    pub content_hash: &'a str,
    pub file_path: &'a str,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| NewsroomError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| NewsroomError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| NewsroomError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` for reading only.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NewsroomError::not_found(format!(
                "database {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| NewsroomError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| NewsroomError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        NewsroomError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(NewsroomError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Article operations
    // -----------------------------------------------------------------------

    /// Insert or overwrite an article's metadata and current body.
    ///
    /// This is a seeding operation and records no revision.
    pub async fn upsert_article(&self, meta: &ArticleMeta, body: &ArticleDocument) -> Result<()> {
        self.check_writable()?;
        let body_json = body.to_json()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO articles (slug, title, category, live, body_json, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(slug) DO UPDATE SET
                   title = excluded.title,
                   category = excluded.category,
                   live = excluded.live,
                   body_json = excluded.body_json,
                   updated_at = excluded.updated_at",
                params![
                    meta.slug.as_str(),
                    meta.title.as_str(),
                    meta.category.as_deref(),
                    i64::from(meta.live),
                    body_json.as_str(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| NewsroomError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get an article and its current body.
    pub async fn get_article(&self, slug: &str) -> Result<Option<StoredArticle>> {
        let mut rows = self
            .conn
            .query(
                "SELECT slug, title, category, live, body_json, updated_at
                 FROM articles WHERE slug = ?1",
                params![slug],
            )
            .await
            .map_err(|e| NewsroomError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let meta = row_to_article_meta(&row)?;
                let body_json: String = row
                    .get(4)
                    .map_err(|e| NewsroomError::Storage(e.to_string()))?;
                let body = ArticleDocument::parse_str(&body_json)?;
                let updated_at = parse_timestamp(&row, 5)?;
                Ok(Some(StoredArticle {
                    meta,
                    body,
                    updated_at,
                }))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(NewsroomError::Storage(e.to_string())),
        }
    }

    /// Current body of an article; [`NewsroomError::NotFound`] if it does not exist.
    pub async fn read_body(&self, slug: &str) -> Result<ArticleDocument> {
        self.get_article(slug)
            .await?
            .map(|article| article.body)
            .ok_or_else(|| NewsroomError::not_found(format!("article `{slug}`")))
    }

    /// List article metadata matching `filter`, ordered by slug.
    pub async fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<ArticleMeta>> {
        let mut rows = self
            .conn
            .query(
                "SELECT slug, title, category, live FROM articles
                 WHERE (?1 = 0 OR live = 1)
                 ORDER BY slug",
                params![i64::from(filter.live_only)],
            )
            .await
            .map_err(|e| NewsroomError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let meta = row_to_article_meta(&row)?;
            if filter.matches(&meta) {
                results.push(meta);
            }
        }
        Ok(results)
    }

    /// Store `body` as a new revision and make it the published body.
    ///
    /// Both writes happen in one transaction. Returns the revision id.
    pub async fn publish_revision(&self, slug: &str, body: &ArticleDocument) -> Result<String> {
        self.check_writable()?;
        let body_json = body.to_json()?;
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();

        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| NewsroomError::Storage(e.to_string()))?;

        let updated = tx
            .execute(
                "UPDATE articles SET body_json = ?1, updated_at = ?2 WHERE slug = ?3",
                params![body_json.as_str(), now.as_str(), slug],
            )
            .await
            .map_err(|e| NewsroomError::Storage(e.to_string()))?;
        if updated == 0 {
            tx.rollback()
                .await
                .map_err(|e| NewsroomError::Storage(e.to_string()))?;
            return Err(NewsroomError::not_found(format!("article `{slug}`")));
        }

        tx.execute(
            "INSERT INTO revisions (id, article_slug, body_json, created_at, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id.as_str(), slug, body_json.as_str(), now.as_str(), now.as_str()],
        )
        .await
        .map_err(|e| NewsroomError::Storage(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| NewsroomError::Storage(e.to_string()))?;

        tracing::debug!(slug, revision = %id, "published revision");
        Ok(id)
    }

    /// Revisions of an article, newest first.
    pub async fn list_revisions(&self, slug: &str) -> Result<Vec<RevisionMeta>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, article_slug, created_at, published_at, body_json
                 FROM revisions WHERE article_slug = ?1
                 ORDER BY created_at DESC, id DESC",
                params![slug],
            )
            .await
            .map_err(|e| NewsroomError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let body_json: String = row
                .get(4)
                .map_err(|e| NewsroomError::Storage(e.to_string()))?;
            results.push(RevisionMeta {
                id: row
                    .get::<String>(0)
                    .map_err(|e| NewsroomError::Storage(e.to_string()))?,
                article_slug: row
                    .get::<String>(1)
                    .map_err(|e| NewsroomError::Storage(e.to_string()))?,
                created_at: parse_timestamp(&row, 2)?,
                published_at: parse_timestamp(&row, 3)?,
                blocks: ArticleDocument::parse_str(&body_json)?.len(),
            });
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Image registry
    // -----------------------------------------------------------------------

    /// Register an image. Returns its new reference id.
    pub async fn insert_image(&self, image: &NewImage<'_>) -> Result<ImageRef> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO images (title, source_url, content_hash, file_path, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    image.title,
                    image.source_url,
                    image.content_hash,
                    image.file_path,
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| NewsroomError::Storage(e.to_string()))?;
        Ok(ImageRef(self.conn.last_insert_rowid()))
    }

    /// Look up an image by its title.
    pub async fn find_image_by_title(&self, title: &str) -> Result<Option<ImageRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, title, source_url, content_hash, file_path, created_at
                 FROM images WHERE title = ?1",
                params![title],
            )
            .await
            .map_err(|e| NewsroomError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_image(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(NewsroomError::Storage(e.to_string())),
        }
    }

    /// Ids of every registered image, ascending.
    pub async fn list_image_ids(&self) -> Result<Vec<ImageRef>> {
        let mut rows = self
            .conn
            .query("SELECT id FROM images ORDER BY id", params![])
            .await
            .map_err(|e| NewsroomError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(ImageRef(
                row.get::<i64>(0)
                    .map_err(|e| NewsroomError::Storage(e.to_string()))?,
            ));
        }
        Ok(results)
    }
}

/// Read `slug, title, category, live` from the first four columns.
fn row_to_article_meta(row: &libsql::Row) -> Result<ArticleMeta> {
    Ok(ArticleMeta {
        slug: row
            .get::<String>(0)
            .map_err(|e| NewsroomError::Storage(e.to_string()))?,
        title: row
            .get::<String>(1)
            .map_err(|e| NewsroomError::Storage(e.to_string()))?,
        category: row.get::<String>(2).ok(),
        live: row.get::<i64>(3).map(|v| v != 0).unwrap_or(true),
    })
}

fn row_to_image(row: &libsql::Row) -> Result<ImageRecord> {
    Ok(ImageRecord {
        id: ImageRef(
            row.get::<i64>(0)
                .map_err(|e| NewsroomError::Storage(e.to_string()))?,
        ),
        title: row
            .get::<String>(1)
            .map_err(|e| NewsroomError::Storage(e.to_string()))?,
        source_url: row.get::<String>(2).ok(),
        content_hash: row
            .get::<String>(3)
            .map_err(|e| NewsroomError::Storage(e.to_string()))?,
        file_path: row
            .get::<String>(4)
            .map_err(|e| NewsroomError::Storage(e.to_string()))?,
        created_at: parse_timestamp(row, 5)?,
    })
}

fn parse_timestamp(row: &libsql::Row, idx: i32) -> Result<DateTime<Utc>> {
    let s: String = row
        .get(idx)
        .map_err(|e| NewsroomError::Storage(e.to_string()))?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| NewsroomError::Storage(format!("invalid date: {e}")))
}
