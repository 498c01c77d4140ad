//! Phrase-table replacement inside rich text.

use std::cmp::Reverse;

use newsroom_shared::{NewsroomError, Result};
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::block::ContentBlock;
use crate::document::ArticleDocument;

/// How the phrases of a [`TranslationTable`] are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-sensitive substring replacement.
    #[default]
    Literal,
    /// Case-insensitive, anchored on word boundaries.
    WholeWord,
    /// Whole-word for single capitalized words, literal for everything else.
    Auto,
}

#[derive(Debug, Clone)]
struct Rule {
    from: String,
    to: String,
    /// Set for whole-word rules.
    pattern: Option<Regex>,
}

impl Rule {
    fn apply(&self, text: &str) -> String {
        match &self.pattern {
            Some(re) => re.replace_all(text, NoExpand(&self.to)).into_owned(),
            None => text.replace(&self.from, &self.to),
        }
    }
}

/// Source phrase to replacement mapping, applied longest key first.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    rules: Vec<Rule>,
}

impl TranslationTable {
    /// Build a table. Empty source phrases are rejected.
    pub fn new(
        phrases: impl IntoIterator<Item = (String, String)>,
        mode: MatchMode,
    ) -> Result<Self> {
        let mut rules = Vec::new();
        for (from, to) in phrases {
            if from.is_empty() {
                return Err(NewsroomError::validation(
                    "translation table contains an empty source phrase",
                ));
            }
            let pattern = if uses_whole_word(&from, mode) {
                Some(whole_word_pattern(&from)?)
            } else {
                None
            };
            rules.push(Rule { from, to, pattern });
        }
        // Longest first, so "Step 10:" is handled before "Step 1:".
        rules.sort_by(|a, b| {
            Reverse(a.from.chars().count())
                .cmp(&Reverse(b.from.chars().count()))
                .then_with(|| a.from.cmp(&b.from))
        });
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Source phrases in application order.
    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.from.as_str())
    }

    /// Apply every rule once, in order.
    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc))
    }
}

fn uses_whole_word(phrase: &str, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Literal => false,
        MatchMode::WholeWord => true,
        MatchMode::Auto => {
            !phrase.chars().any(char::is_whitespace)
                && phrase.chars().next().is_some_and(char::is_uppercase)
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `\b` is only meaningful next to a word character, so phrases like
/// "Step 1:" get a boundary on the left only.
fn whole_word_pattern(phrase: &str) -> Result<Regex> {
    let left = phrase.chars().next().is_some_and(is_word_char);
    let right = phrase.chars().last().is_some_and(is_word_char);
    let source = format!(
        "(?i){}{}{}",
        if left { r"\b" } else { "" },
        regex::escape(phrase),
        if right { r"\b" } else { "" },
    );
    Regex::new(&source)
        .map_err(|e| NewsroomError::validation(format!("bad phrase `{phrase}`: {e}")))
}

/// Result of [`translate_text`].
#[derive(Debug, Clone, PartialEq)]
pub struct Translated {
    pub document: ArticleDocument,
    /// Number of rich text blocks whose HTML changed.
    pub changed_blocks: usize,
}

impl Translated {
    pub fn changed(&self) -> bool {
        self.changed_blocks > 0
    }
}

/// Apply `table` to the HTML of every rich text block. Other blocks and all
/// ids are left as they are.
pub fn translate_text(doc: &ArticleDocument, table: &TranslationTable) -> Translated {
    let mut changed_blocks = 0;
    let blocks = doc
        .iter()
        .map(|block| match block {
            ContentBlock::RichText { id, html } => {
                let translated = table.apply(html);
                if translated != *html {
                    changed_blocks += 1;
                }
                ContentBlock::RichText {
                    id: id.clone(),
                    html: translated,
                }
            }
            other => other.clone(),
        })
        .collect();

    Translated {
        document: ArticleDocument::new(blocks),
        changed_blocks,
    }
}
