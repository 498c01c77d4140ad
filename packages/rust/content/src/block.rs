//! Content blocks: the atomic, typed units of an article body.
//!
//! On the wire a block is a record `{"type": ..., "value": ..., "id": ...}`.
//! Records with an unknown `type`, a value that does not fit the declared
//! type, or extra top-level keys are kept as [`ContentBlock::Opaque`] and
//! written back byte-for-byte equivalent, so no operation ever drops them.

use newsroom_shared::{BlockId, ImageRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Wire names of the block types.
pub mod kind {
    pub const RICH_TEXT: &str = "rich_text";
    pub const IMAGE: &str = "image";
    pub const HEADING: &str = "heading";
    pub const QUOTE: &str = "quote";
    pub const CALLOUT: &str = "callout";
    pub const FAQ_LIST: &str = "faq_list";
}

// ---------------------------------------------------------------------------
// Block values
// ---------------------------------------------------------------------------

/// A key that may be absent (`None`), explicitly `null` (`Some(None)`) or set.
///
/// Keeping the three apart lets a block be written back exactly as it was read.
pub type Nullable<T> = Option<Option<T>>;

mod nullable {
    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(de).map(Some)
    }
}

/// Value of an `image` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageValue {
    /// Reference into the asset store.
    pub image: ImageRef,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub caption: Nullable<String>,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub alt_text: Nullable<String>,
    /// Keys this model does not know about, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageValue {
    /// A new image value with an empty caption and the given alt text.
    pub fn new(image: ImageRef, alt_text: impl Into<String>) -> Self {
        Self {
            image,
            caption: Some(Some(String::new())),
            alt_text: Some(Some(alt_text.into())),
            extra: Map::new(),
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(Some(caption.into()));
        self
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_ref().and_then(|c| c.as_deref())
    }

    pub fn alt_text(&self) -> Option<&str> {
        self.alt_text.as_ref().and_then(|a| a.as_deref())
    }
}

/// Heading level allowed inside an article body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    H2,
    H3,
}

/// Value of a `heading` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingValue {
    pub level: HeadingLevel,
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Value of a `quote` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteValue {
    pub quote: String,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub attribution: Nullable<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuoteValue {
    pub fn attribution(&self) -> Option<&str> {
        self.attribution.as_ref().and_then(|a| a.as_deref())
    }
}

/// Visual style of a callout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalloutStyle {
    #[default]
    Info,
    Warning,
    Success,
    Error,
}

/// Value of a `callout` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalloutValue {
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Nullable<String>,
    /// Rich text HTML.
    pub text: String,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub style: Nullable<CalloutStyle>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CalloutValue {
    pub fn title(&self) -> Option<&str> {
        self.title.as_ref().and_then(|t| t.as_deref())
    }

    /// Declared style, `info` when absent.
    pub fn style(&self) -> CalloutStyle {
        self.style.flatten().unwrap_or_default()
    }
}

/// One question/answer pair of a FAQ list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqItem {
    pub question: String,
    /// Rich text HTML.
    pub answer: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Value of a `faq_list` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqListValue {
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Nullable<String>,
    #[serde(
        default,
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub faqs: Nullable<Vec<FaqItem>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FaqListValue {
    pub fn title(&self) -> &str {
        self.title.as_ref().and_then(|t| t.as_deref()).unwrap_or_default()
    }

    pub fn faqs(&self) -> &[FaqItem] {
        self.faqs.as_ref().and_then(|f| f.as_deref()).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// ContentBlock
// ---------------------------------------------------------------------------

/// A typed block of an article body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ContentBlock {
    RichText { id: BlockId, html: String },
    Image { id: BlockId, value: ImageValue },
    Heading { id: BlockId, value: HeadingValue },
    Quote { id: BlockId, value: QuoteValue },
    Callout { id: BlockId, value: CalloutValue },
    FaqList { id: BlockId, value: FaqListValue },
    /// Unrecognized or malformed record, preserved verbatim.
    Opaque(Value),
}

impl ContentBlock {
    /// New rich text block with a fresh id.
    pub fn rich_text(html: impl Into<String>) -> Self {
        Self::RichText {
            id: BlockId::generate(),
            html: html.into(),
        }
    }

    /// New image block with a fresh id.
    pub fn image(value: ImageValue) -> Self {
        Self::Image {
            id: BlockId::generate(),
            value,
        }
    }

    /// The block's stable id. Opaque records report their raw `id` if it is a string.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::RichText { id, .. }
            | Self::Image { id, .. }
            | Self::Heading { id, .. }
            | Self::Quote { id, .. }
            | Self::Callout { id, .. }
            | Self::FaqList { id, .. } => Some(id.as_str()),
            Self::Opaque(raw) => raw.get("id").and_then(Value::as_str),
        }
    }

    /// The wire `type` name.
    pub fn type_name(&self) -> &str {
        match self {
            Self::RichText { .. } => kind::RICH_TEXT,
            Self::Image { .. } => kind::IMAGE,
            Self::Heading { .. } => kind::HEADING,
            Self::Quote { .. } => kind::QUOTE,
            Self::Callout { .. } => kind::CALLOUT,
            Self::FaqList { .. } => kind::FAQ_LIST,
            Self::Opaque(raw) => raw.get("type").and_then(Value::as_str).unwrap_or("unknown"),
        }
    }

    /// HTML of a rich text block.
    pub fn as_rich_text(&self) -> Option<&str> {
        match self {
            Self::RichText { html, .. } => Some(html),
            _ => None,
        }
    }

    /// Image reference of an image block.
    pub fn image_ref(&self) -> Option<ImageRef> {
        match self {
            Self::Image { value, .. } => Some(value.image),
            _ => None,
        }
    }

    pub fn is_rich_text(&self) -> bool {
        matches!(self, Self::RichText { .. })
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }
}

impl From<Value> for ContentBlock {
    fn from(raw: Value) -> Self {
        match parse_known(&raw) {
            Some(block) => block,
            None => {
                tracing::trace!(block_type = ?raw.get("type"), "keeping block as opaque");
                Self::Opaque(raw)
            }
        }
    }
}

impl From<ContentBlock> for Value {
    fn from(block: ContentBlock) -> Self {
        let (kind, id, value) = match block {
            ContentBlock::Opaque(raw) => return raw,
            ContentBlock::RichText { id, html } => (kind::RICH_TEXT, id, Value::String(html)),
            ContentBlock::Image { id, value } => (kind::IMAGE, id, to_value(value)),
            ContentBlock::Heading { id, value } => (kind::HEADING, id, to_value(value)),
            ContentBlock::Quote { id, value } => (kind::QUOTE, id, to_value(value)),
            ContentBlock::Callout { id, value } => (kind::CALLOUT, id, to_value(value)),
            ContentBlock::FaqList { id, value } => (kind::FAQ_LIST, id, to_value(value)),
        };
        json!({ "type": kind, "value": value, "id": id.0 })
    }
}

fn to_value<T: Serialize>(value: T) -> Value {
    // Plain structs with string keys always serialize.
    serde_json::to_value(value).unwrap_or_default()
}

/// Recognize a well-formed record of a known type.
fn parse_known(raw: &Value) -> Option<ContentBlock> {
    let obj = raw.as_object()?;
    if obj
        .keys()
        .any(|k| !matches!(k.as_str(), "type" | "value" | "id"))
    {
        return None;
    }

    let id = BlockId(obj.get("id")?.as_str()?.to_string());
    let value = obj.get("value")?;

    let block = match obj.get("type")?.as_str()? {
        kind::RICH_TEXT => ContentBlock::RichText {
            id,
            html: value.as_str()?.to_string(),
        },
        kind::IMAGE => ContentBlock::Image {
            id,
            value: from_value(value)?,
        },
        kind::HEADING => ContentBlock::Heading {
            id,
            value: from_value(value)?,
        },
        kind::QUOTE => ContentBlock::Quote {
            id,
            value: from_value(value)?,
        },
        kind::CALLOUT => ContentBlock::Callout {
            id,
            value: from_value(value)?,
        },
        kind::FAQ_LIST => ContentBlock::FaqList {
            id,
            value: from_value(value)?,
        },
        _ => return None,
    };
    Some(block)
}

fn from_value<T: for<'de> Deserialize<'de>>(value: &Value) -> Option<T> {
    T::deserialize(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rich_text_record() {
        let block: ContentBlock =
            serde_json::from_value(json!({"type": "rich_text", "value": "<p>Hej</p>", "id": "a1"}))
                .unwrap();
        assert_eq!(block.as_rich_text(), Some("<p>Hej</p>"));
        assert_eq!(block.id(), Some("a1"));
        assert_eq!(block.type_name(), "rich_text");
    }

    #[test]
    fn parses_image_record_and_keeps_extra_keys() {
        let raw = json!({
            "type": "image",
            "value": {"image": 12, "caption": "", "alt_text": "Dashboard", "link": "/x"},
            "id": "b2"
        });
        let block: ContentBlock = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(block.image_ref(), Some(ImageRef(12)));
        assert_eq!(Value::from(block), raw);
    }

    #[test]
    fn unknown_type_is_opaque_and_verbatim() {
        let raw = json!({"type": "embed", "value": {"url": "https://x"}, "id": "c3"});
        let block: ContentBlock = serde_json::from_value(raw.clone()).unwrap();
        assert!(matches!(block, ContentBlock::Opaque(_)));
        assert_eq!(block.type_name(), "embed");
        assert_eq!(block.id(), Some("c3"));
        assert_eq!(serde_json::to_value(&block).unwrap(), raw);
    }

    #[test]
    fn malformed_image_is_opaque() {
        let raw = json!({"type": "image", "value": {"caption": "no image id"}, "id": "d4"});
        let block = ContentBlock::from(raw);
        assert!(matches!(block, ContentBlock::Opaque(_)));
        assert_eq!(block.image_ref(), None);
    }

    #[test]
    fn record_without_id_is_opaque() {
        let block = ContentBlock::from(json!({"type": "rich_text", "value": "<p>x</p>"}));
        assert!(matches!(block, ContentBlock::Opaque(_)));
        assert_eq!(block.id(), None);
    }

    #[test]
    fn structured_blocks_roundtrip() {
        let records = [
            json!({"type": "heading", "value": {"level": "h2", "text": "Trin 1"}, "id": "h"}),
            json!({"type": "quote", "value": {"quote": "Data slår mavefornemmelse", "attribution": "CMO"}, "id": "q"}),
            json!({"type": "callout", "value": {"title": "Tip", "text": "<p>Test</p>", "style": "warning"}, "id": "c"}),
            json!({"type": "faq_list", "value": {"title": "Ofte stillede spørgsmål", "faqs": [{"question": "Hvad?", "answer": "<p>Det.</p>"}]}, "id": "f"}),
        ];
        for raw in records {
            let block = ContentBlock::from(raw.clone());
            assert!(!matches!(block, ContentBlock::Opaque(_)), "{raw}");
            assert_eq!(Value::from(block), raw);
        }
    }

    #[test]
    fn null_and_missing_keys_survive_roundtrip() {
        let records = [
            json!({"type": "image", "value": {"alt_text": "a", "caption": null, "image": 5}, "id": "i"}),
            json!({"type": "image", "value": {"image": 6}, "id": "j"}),
            json!({"type": "quote", "value": {"quote": "Q", "attribution": null}, "id": "q"}),
            json!({"type": "callout", "value": {"text": "<p>T</p>"}, "id": "c"}),
            json!({"type": "callout", "value": {"title": null, "text": "<p>T</p>", "style": null}, "id": "d"}),
            json!({"type": "faq_list", "value": {"faqs": []}, "id": "f"}),
            json!({"type": "faq_list", "value": {"title": null}, "id": "g"}),
        ];
        for raw in records {
            let block = ContentBlock::from(raw.clone());
            assert!(!matches!(block, ContentBlock::Opaque(_)), "{raw}");
            assert_eq!(Value::from(block), raw);
        }
    }

    #[test]
    fn accessors_flatten_null_and_missing() {
        let block = ContentBlock::from(
            json!({"type": "image", "value": {"alt_text": "a", "caption": null, "image": 5}, "id": "i"}),
        );
        let ContentBlock::Image { value, .. } = block else {
            panic!("expected image");
        };
        assert_eq!(value.caption(), None);
        assert_eq!(value.alt_text(), Some("a"));

        let block = ContentBlock::from(json!({"type": "callout", "value": {"text": "x", "style": null}, "id": "c"}));
        let ContentBlock::Callout { value, .. } = block else {
            panic!("expected callout");
        };
        assert_eq!(value.style(), CalloutStyle::Info);
        assert_eq!(value.title(), None);
    }

    #[test]
    fn heading_level_outside_enum_is_opaque() {
        let block = ContentBlock::from(
            json!({"type": "heading", "value": {"level": "h5", "text": "x"}, "id": "h"}),
        );
        assert!(matches!(block, ContentBlock::Opaque(_)));
    }

    #[test]
    fn constructors_assign_fresh_ids() {
        let a = ContentBlock::rich_text("<p>a</p>");
        let b = ContentBlock::image(ImageValue::new(ImageRef(1), "alt"));
        assert!(a.id().is_some());
        assert_ne!(a.id(), b.id());
        assert!(b.is_image());
        assert!(a.is_rich_text());
    }
}
