//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use newsroom_assets::{AssetFetcher, ImageManifest, MediaLibrary, import_images};
use newsroom_content::ArticleDocument;
use newsroom_content::ops::ImagePool;
use newsroom_core::data::{
    load_category_sets, load_editorial_content, load_image_assignments, load_translation_table,
};
use newsroom_core::{
    BatchReport, BatchRunner, DeduplicateImages, DocumentOutcome, DocumentReport, ExpandShort,
    InsertImages, Mutation, ProgressReporter, RedistributeImages, SplitAndInterleave,
    TranslateText, audit,
};
use newsroom_shared::{
    AppConfig, ArticleFilter, ArticleMeta, AssetConfig, BatchConfig, init_config, load_config,
    load_config_from,
};
use newsroom_storage::Storage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Newsroom: batch maintenance for article bodies.
#[derive(Parser)]
#[command(
    name = "newsroom",
    version,
    about = "Batch maintenance of structured article bodies: dedupe, restructure, translate, expand.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.newsroom/newsroom.toml).
    #[arg(long, global = true, env = "NEWSROOM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Run operations and report outcomes without persisting anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Restrict batch commands to these slugs (repeatable).
    #[arg(long = "only", global = true)]
    pub only: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Remove image blocks repeating an image shown earlier in the article.
    DedupeImages,

    /// Give the first two images of each article a distinct pair of images.
    RedistributeImages {
        /// TOML file with explicit per-article pairs.
        #[arg(long)]
        assignments: Option<PathBuf>,

        /// Seed for the image pool shuffle, for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Split rich text into sections alternating with the article's images.
    Restructure,

    /// Replace phrases in rich text using a translation table.
    Translate {
        /// TOML translation table.
        #[arg(long)]
        table: PathBuf,
    },

    /// Replace the text of short articles with editorial content.
    Expand {
        /// Directory of `<slug>.html` files.
        #[arg(long)]
        content: PathBuf,

        /// Restructure expanded articles in the same run.
        #[arg(long)]
        restructure: bool,
    },

    /// Insert each category's image set into its articles.
    InsertImages {
        /// TOML file mapping categories to image ids.
        #[arg(long)]
        sets: PathBuf,
    },

    /// Print per-article body statistics.
    Audit {
        /// Only list articles below the short-article threshold.
        #[arg(long)]
        short_only: bool,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Seed or overwrite articles from a JSON file.
    ImportArticles {
        /// JSON list of `{slug, title, category, live, body}`.
        file: PathBuf,
    },

    /// Print an article's current body as JSON.
    Export {
        slug: String,
    },

    /// List an article's revisions, newest first.
    History {
        slug: String,
    },

    /// Download and register the images of a manifest.
    ImportImages {
        /// TOML manifest of `[[image]]` entries.
        file: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "newsroom=info",
        1 => "newsroom=debug",
        _ => "newsroom=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Resolved configuration for one invocation.
struct Context {
    config: AppConfig,
    batch: BatchConfig,
}

impl Context {
    fn load(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => load_config_from(path)?,
            None => load_config()?,
        };
        let mut batch = BatchConfig::from(&config);
        batch.dry_run |= cli.dry_run;
        batch.only_slugs = cli.only.clone();
        Ok(Self { config, batch })
    }

    fn database_path(&self) -> &Path {
        Path::new(&self.config.store.database_path)
    }

    async fn open_store(&self) -> Result<Storage> {
        Ok(Storage::open(self.database_path()).await?)
    }

    async fn open_store_readonly(&self) -> Result<Storage> {
        Ok(Storage::open_readonly(self.database_path()).await?)
    }
}

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&Context::load(&cli)?),
        };
    }

    let ctx = Context::load(&cli)?;
    match cli.command {
        Command::DedupeImages => {
            let storage = ctx.open_store().await?;
            execute_batch(&storage, &ctx, vec![Box::new(DeduplicateImages)]).await
        }
        Command::RedistributeImages { assignments, seed } => {
            cmd_redistribute(&ctx, assignments.as_deref(), seed).await
        }
        Command::Restructure => {
            let storage = ctx.open_store().await?;
            let sections = ctx.config.thresholds.split_sections;
            execute_batch(&storage, &ctx, vec![Box::new(SplitAndInterleave::new(sections))]).await
        }
        Command::Translate { table } => {
            let table = load_translation_table(&table)?;
            let storage = ctx.open_store().await?;
            execute_batch(&storage, &ctx, vec![Box::new(TranslateText::new(table))]).await
        }
        Command::Expand {
            content,
            restructure,
        } => {
            let content = load_editorial_content(&content)?;
            let threshold = ctx.config.thresholds.short_article_chars;
            let mut ops: Vec<Box<dyn Mutation>> = vec![Box::new(ExpandShort::new(threshold, content))];
            if restructure {
                ops.push(Box::new(SplitAndInterleave::new(
                    ctx.config.thresholds.split_sections,
                )));
            }
            let storage = ctx.open_store().await?;
            execute_batch(&storage, &ctx, ops).await
        }
        Command::InsertImages { sets } => {
            let sets = load_category_sets(&sets)?;
            let storage = ctx.open_store().await?;
            execute_batch(&storage, &ctx, vec![Box::new(InsertImages::new(sets))]).await
        }
        Command::Audit { short_only, json } => cmd_audit(&ctx, short_only, json).await,
        Command::ImportArticles { file } => cmd_import_articles(&ctx, &file).await,
        Command::Export { slug } => cmd_export(&ctx, &slug).await,
        Command::History { slug } => cmd_history(&ctx, &slug).await,
        Command::ImportImages { file } => cmd_import_images(&ctx, &file).await,
        Command::Config { .. } => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Batch commands
// ---------------------------------------------------------------------------

async fn execute_batch(
    storage: &Storage,
    ctx: &Context,
    mut mutations: Vec<Box<dyn Mutation>>,
) -> Result<()> {
    let runner = BatchRunner::new(storage, ctx.batch.clone());
    let reporter = CliProgress::new();
    let report = runner.run(&mut mutations, &reporter).await?;
    print_batch_report(&report);
    Ok(())
}

async fn cmd_redistribute(ctx: &Context, assignments: Option<&Path>, seed: Option<u64>) -> Result<()> {
    let storage = ctx.open_store().await?;
    let assignments = match assignments {
        Some(path) => load_image_assignments(path)?,
        None => Default::default(),
    };

    let documents = BatchRunner::new(&storage, ctx.batch.clone()).select().await?.len();
    let images = storage.list_image_ids().await?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let pool = match ImagePool::new(images, documents, &mut rng) {
        Ok(pool) => Some(pool),
        Err(e) if !assignments.is_empty() => {
            info!(error = %e, "no usable image pool, using explicit assignments only");
            None
        }
        Err(e) => return Err(eyre!("cannot redistribute images: {e}")),
    };

    info!(
        pool = pool.as_ref().map_or(0, ImagePool::len),
        assignments = assignments.len(),
        documents,
        "redistributing images"
    );
    execute_batch(
        &storage,
        ctx,
        vec![Box::new(RedistributeImages::new(pool, assignments))],
    )
    .await
}

fn print_batch_report(report: &BatchReport) {
    println!();
    for doc in &report.documents {
        match &doc.outcome {
            DocumentOutcome::Unchanged => {}
            DocumentOutcome::Mutated {
                revision_id,
                operations,
            } => println!(
                "  ✓ {:<40} {} [{}]",
                doc.slug,
                revision_id.as_deref().unwrap_or("(dry run)"),
                operations.join(", ")
            ),
            DocumentOutcome::Failed { error } => println!("  ✗ {:<40} {error}", doc.slug),
        }
    }
    println!();
    println!("  Operations: {}", report.operations.join(" → "));
    if report.dry_run {
        println!("  Mode:       dry run (nothing persisted)");
    }
    println!("  Mutated:    {}", report.mutated());
    println!("  Unchanged:  {}", report.unchanged());
    println!("  Failed:     {}", report.failed());
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_done(&self, report: &DocumentReport, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] {}", report.slug));
    }

    fn done(&self, _report: &BatchReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Read-only commands
// ---------------------------------------------------------------------------

async fn cmd_audit(ctx: &Context, short_only: bool, json: bool) -> Result<()> {
    let storage = ctx.open_store_readonly().await?;
    let filter = ArticleFilter::from(&ctx.batch);
    let threshold = ctx.config.thresholds.short_article_chars;
    let report = audit(&storage, &filter, threshold).await?;

    let rows: Vec<_> = if short_only {
        report.short().collect()
    } else {
        report.rows.iter().collect()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:<40} {:>8} {:>8} {:>6} {:>5} {:>6}",
        "slug", "chars", "visible", "images", "dupes", "short"
    );
    for row in &rows {
        println!(
            "{:<40} {:>8} {:>8} {:>6} {:>5} {:>6}",
            row.slug,
            row.stats.rich_text_chars,
            row.stats.visible_chars,
            row.stats.images,
            row.stats.duplicate_images,
            if row.stats.needs_expansion { "yes" } else { "" }
        );
    }
    for (slug, error) in &report.failed {
        println!("{slug:<40} error: {error}");
    }
    println!();
    println!(
        "  {} articles, {} below {threshold} characters",
        report.rows.len(),
        report.short().count()
    );
    Ok(())
}

async fn cmd_export(ctx: &Context, slug: &str) -> Result<()> {
    let storage = ctx.open_store_readonly().await?;
    let body = storage.read_body(slug).await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

async fn cmd_history(ctx: &Context, slug: &str) -> Result<()> {
    let storage = ctx.open_store_readonly().await?;
    let Some(article) = storage.get_article(slug).await? else {
        return Err(eyre!("article '{slug}' not found"));
    };
    println!("  {slug}: {}", article.meta.short_title(60));
    let revisions = storage.list_revisions(slug).await?;
    if revisions.is_empty() {
        println!("  No revisions published for '{slug}'.");
        return Ok(());
    }
    for rev in revisions {
        println!(
            "  {}  {}  {} blocks",
            rev.published_at.format("%Y-%m-%d %H:%M:%S"),
            rev.id,
            rev.blocks
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Import commands
// ---------------------------------------------------------------------------

/// One record of an article import file.
#[derive(Deserialize)]
struct ArticleRecord {
    #[serde(flatten)]
    meta: ArticleMeta,
    #[serde(default)]
    body: ArticleDocument,
}

async fn cmd_import_articles(ctx: &Context, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;
    let records: Vec<ArticleRecord> = serde_json::from_str(&content)
        .map_err(|e| eyre!("invalid article file '{}': {e}", file.display()))?;

    if ctx.batch.dry_run {
        println!("  {} articles parsed (dry run, nothing imported)", records.len());
        return Ok(());
    }

    let storage = ctx.open_store().await?;
    for record in &records {
        storage.upsert_article(&record.meta, &record.body).await?;
        info!(slug = %record.meta.slug, blocks = record.body.len(), "article imported");
    }
    println!("  Imported {} articles", records.len());
    Ok(())
}

async fn cmd_import_images(ctx: &Context, file: &Path) -> Result<()> {
    let manifest = ImageManifest::load(file)?;
    if ctx.batch.dry_run {
        println!("  {} images in manifest (dry run, nothing imported)", manifest.images.len());
        return Ok(());
    }

    let asset_config = AssetConfig::from(&ctx.config);
    let fetcher = AssetFetcher::new(&asset_config)?;
    let library = MediaLibrary::new(asset_config.media_dir.clone());
    let storage = ctx.open_store().await?;

    let spinner = CliProgress::new();
    spinner.phase(&format!("Importing {} images", manifest.images.len()));
    let report = import_images(&storage, &fetcher, &library, &manifest.images).await?;
    spinner.spinner.finish_and_clear();

    for (title, id) in &report.imported {
        println!("  ✓ {title:<40} {id}");
    }
    for (title, id) in &report.existing {
        println!("  = {title:<40} {id} (exists)");
    }
    for (title, error) in &report.failed {
        println!("  ✗ {title:<40} {error}");
    }
    println!();
    println!(
        "  Imported: {}  Existing: {}  Failed: {}",
        report.imported.len(),
        report.existing.len(),
        report.failed.len()
    );
    let ids: Vec<String> = report.resolved_ids().iter().map(ToString::to_string).collect();
    if !ids.is_empty() {
        println!("  Image ids:  [{}]", ids.join(", "));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(ctx: &Context) -> Result<()> {
    let toml_str = toml::to_string_pretty(&ctx.config)?;
    println!("{toml_str}");
    Ok(())
}
