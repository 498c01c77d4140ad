//! SQL migration definitions for the Newsroom database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: articles, revisions",
            sql: r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Current state of each article; body_json is the published body
CREATE TABLE IF NOT EXISTS articles (
    slug        TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    category    TEXT,
    live        INTEGER NOT NULL DEFAULT 1,
    body_json   TEXT NOT NULL DEFAULT '[]',
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_articles_category ON articles(category);

-- Every published body, newest last
CREATE TABLE IF NOT EXISTS revisions (
    id            TEXT PRIMARY KEY,
    article_slug  TEXT NOT NULL REFERENCES articles(slug) ON DELETE CASCADE,
    body_json     TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    published_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_revisions_article ON revisions(article_slug);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Image registry",
            sql: r#"
CREATE TABLE IF NOT EXISTS images (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    title        TEXT NOT NULL UNIQUE,
    source_url   TEXT,
    content_hash TEXT NOT NULL,
    file_path    TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_images_hash ON images(content_hash);

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
