//! Mutation operations over an [`ArticleDocument`](crate::ArticleDocument).
//!
//! Every operation is a pure function: it borrows the input document and
//! returns a new one plus a small report of what it did.

pub mod dedupe;
pub mod expand;
pub mod insert;
pub mod redistribute;
pub mod split;
pub mod translate;

pub use dedupe::{Deduplicated, deduplicate_images};
pub use expand::{DEFAULT_SHORT_ARTICLE_CHARS, expand_if_short, needs_expansion, replace_rich_text};
pub use insert::{Inserted, insert_images};
pub use redistribute::{ImagePool, Redistributed, redistribute_images};
pub use split::{DEFAULT_SECTIONS, Interleaved, split_and_interleave};
pub use translate::{MatchMode, Translated, TranslationTable, translate_text};
