//! Article body model and mutation operations for Newsroom.
//!
//! - [`ContentBlock`] / [`ArticleDocument`]: the typed block sequence
//! - [`ops`]: pure operations (dedupe, redistribute, split, translate, expand, insert)
//! - [`DocumentStats`]: audit figures for one body

pub mod block;
pub mod document;
pub mod html;
pub mod ops;
pub mod stats;

pub use block::{
    CalloutStyle, CalloutValue, ContentBlock, FaqItem, FaqListValue, HeadingLevel, HeadingValue,
    ImageValue, QuoteValue,
};
pub use document::ArticleDocument;
pub use stats::DocumentStats;
