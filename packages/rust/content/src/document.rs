//! The article document: an ordered sequence of content blocks.

use std::collections::HashSet;

use newsroom_shared::{ImageRef, NewsroomError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::ContentBlock;

/// The structured body of one article, in top-to-bottom reading order.
///
/// Deserializes from either a list of block records or a JSON-encoded
/// string holding such a list; `null` and empty strings mean an empty body.
/// Always serializes as a list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Vec<ContentBlock>")]
pub struct ArticleDocument {
    blocks: Vec<ContentBlock>,
}

impl ArticleDocument {
    pub fn new(blocks: Vec<ContentBlock>) -> Self {
        Self { blocks }
    }

    /// Normalize a raw stored body into a document.
    pub fn from_value(raw: Value) -> Result<Self> {
        match raw {
            Value::Null => Ok(Self::default()),
            Value::Array(records) => Ok(Self::new(
                records.into_iter().map(ContentBlock::from).collect(),
            )),
            Value::String(encoded) => {
                if encoded.trim().is_empty() {
                    return Ok(Self::default());
                }
                match serde_json::from_str::<Value>(&encoded) {
                    Ok(Value::Array(records)) => Ok(Self::new(
                        records.into_iter().map(ContentBlock::from).collect(),
                    )),
                    Ok(other) => Err(NewsroomError::parse(format!(
                        "encoded body must be a list of blocks, got {}",
                        json_kind(&other)
                    ))),
                    Err(e) => Err(NewsroomError::parse(format!("invalid encoded body: {e}"))),
                }
            }
            other => Err(NewsroomError::parse(format!(
                "body must be a list of blocks or an encoded list, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Parse a body from JSON text (a list, or a string containing a list).
    pub fn parse_str(json: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(json)
            .map_err(|e| NewsroomError::parse(format!("invalid body JSON: {e}")))?;
        Self::from_value(raw)
    }

    /// Serialize to the stored JSON list form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| NewsroomError::parse(format!("failed to encode body: {e}")))
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<ContentBlock> {
        self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContentBlock> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Sum of the character lengths of all rich text values.
    pub fn rich_text_len(&self) -> usize {
        self.blocks
            .iter()
            .filter_map(ContentBlock::as_rich_text)
            .map(|html| html.chars().count())
            .sum()
    }

    /// Image references of all image blocks, in order.
    pub fn image_refs(&self) -> Vec<ImageRef> {
        self.blocks.iter().filter_map(ContentBlock::image_ref).collect()
    }

    pub fn image_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_image()).count()
    }

    pub fn rich_text_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_rich_text()).count()
    }

    /// Number of image blocks repeating an image already used earlier.
    pub fn duplicate_image_count(&self) -> usize {
        let refs = self.image_refs();
        let distinct: HashSet<ImageRef> = refs.iter().copied().collect();
        refs.len() - distinct.len()
    }

    /// Whether any image block references `image`.
    pub fn references_image(&self, image: ImageRef) -> bool {
        self.blocks.iter().any(|b| b.image_ref() == Some(image))
    }
}

impl TryFrom<Value> for ArticleDocument {
    type Error = NewsroomError;

    fn try_from(raw: Value) -> Result<Self> {
        Self::from_value(raw)
    }
}

impl From<ArticleDocument> for Vec<ContentBlock> {
    fn from(doc: ArticleDocument) -> Self {
        doc.blocks
    }
}

impl From<Vec<ContentBlock>> for ArticleDocument {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        Self::new(blocks)
    }
}

impl<'a> IntoIterator for &'a ArticleDocument {
    type Item = &'a ContentBlock;
    type IntoIter = std::slice::Iter<'a, ContentBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!([
            {"type": "rich_text", "value": "<p>Første afsnit.</p>", "id": "t1"},
            {"type": "image", "value": {"image": 5, "caption": "", "alt_text": "a"}, "id": "i1"},
            {"type": "image", "value": {"image": 5, "caption": "", "alt_text": "b"}, "id": "i2"},
            {"type": "mystery", "value": 1, "id": "m1"}
        ])
    }

    #[test]
    fn list_and_encoded_string_normalize_identically() {
        let from_list = ArticleDocument::from_value(sample()).unwrap();
        let encoded = Value::String(sample().to_string());
        let from_string = ArticleDocument::from_value(encoded).unwrap();
        assert_eq!(from_list, from_string);
        assert_eq!(from_list.len(), 4);
    }

    #[test]
    fn null_and_blank_are_empty() {
        assert!(ArticleDocument::from_value(Value::Null).unwrap().is_empty());
        assert!(ArticleDocument::from_value(json!("  ")).unwrap().is_empty());
    }

    #[test]
    fn non_list_body_is_parse_error() {
        let err = ArticleDocument::from_value(json!({"type": "rich_text"})).unwrap_err();
        assert!(err.to_string().contains("an object"));
        let err = ArticleDocument::from_value(json!("{\"a\": 1}")).unwrap_err();
        assert!(err.to_string().contains("encoded body"));
    }

    #[test]
    fn serde_accepts_both_forms_and_emits_list() {
        let doc: ArticleDocument = serde_json::from_str(&sample().to_string()).unwrap();
        let encoded = serde_json::to_string(&sample().to_string()).unwrap();
        let doc2: ArticleDocument = serde_json::from_str(&encoded).unwrap();
        assert_eq!(doc, doc2);
        assert_eq!(serde_json::to_value(&doc).unwrap(), sample());
    }

    #[test]
    fn stats() {
        let doc = ArticleDocument::from_value(sample()).unwrap();
        assert_eq!(doc.rich_text_len(), "<p>Første afsnit.</p>".chars().count());
        assert_eq!(doc.image_refs(), vec![ImageRef(5), ImageRef(5)]);
        assert_eq!(doc.image_count(), 2);
        assert_eq!(doc.rich_text_count(), 1);
        assert_eq!(doc.duplicate_image_count(), 1);
        assert!(doc.references_image(ImageRef(5)));
        assert!(!doc.references_image(ImageRef(6)));
    }

    #[test]
    fn rich_text_len_counts_characters_not_bytes() {
        let doc = ArticleDocument::new(vec![ContentBlock::rich_text("æøå")]);
        assert_eq!(doc.rich_text_len(), 3);
    }

    #[test]
    fn article_fixture_parses() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/article.fixture.json")
            .expect("read fixture");
        let doc = ArticleDocument::parse_str(&fixture).expect("parse fixture body");
        assert_eq!(doc.len(), 6);
        assert_eq!(doc.image_count(), 3);
        assert_eq!(doc.duplicate_image_count(), 1);
        assert!(doc.blocks().iter().any(|b| matches!(b, ContentBlock::Opaque(_))));
        assert_eq!(doc.to_json().unwrap(), serde_json::to_string(&doc).unwrap());
    }
}
