//! Batch orchestration for Newsroom.
//!
//! This crate ties the content operations to a [`ContentStore`]: the
//! [`BatchRunner`] applies a sequence of [`Mutation`]s to every selected
//! article and publishes only real changes. Data files (phrase tables,
//! editorial content, image assignments) are loaded by [`data`].

pub mod audit;
pub mod data;
pub mod mutation;
pub mod runner;
pub mod store;

pub use audit::{AuditReport, AuditRow, audit};
pub use mutation::{
    DeduplicateImages, ExpandShort, InsertImages, Mutation, RedistributeImages,
    SplitAndInterleave, TranslateText,
};
pub use runner::{
    BatchReport, BatchRunner, DocumentOutcome, DocumentReport, ProgressReporter, SilentProgress,
};
pub use store::ContentStore;
