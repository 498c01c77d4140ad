//! Shared types, error model, and configuration for Newsroom.
//!
//! This crate is the foundation depended on by all other Newsroom crates.
//! It provides:
//! - [`NewsroomError`]: the unified error type
//! - Domain types ([`ArticleMeta`], [`ArticleFilter`], [`BlockId`], [`ImageRef`])
//! - Configuration ([`AppConfig`], [`BatchConfig`], [`AssetConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AssetConfig, AssetSection, BatchConfig, BatchSection, StoreConfig,
    ThresholdConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
    validate_config,
};
pub use error::{NewsroomError, Result};
pub use types::{ArticleFilter, ArticleMeta, BlockId, ImageRef};
