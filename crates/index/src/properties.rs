//! Typed property values and page-body blocks, with their wire JSON.

use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Per-element character limit on rich text and titles.
pub const MAX_TEXT_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(String),
    RichText(String),
    Select(String),
    Number(f64),
    Date(String),
    Relation(Vec<String>),
    Checkbox(bool),
    Url(String),
}

impl PropertyValue {
    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Title(text) => {
                json!({ "title": [text_element(&truncate_chars(text, MAX_TEXT_CHARS))] })
            }
            PropertyValue::RichText(text) => {
                let elements: Vec<Value> = chunk_text(text).iter().map(|c| text_element(c)).collect();
                json!({ "rich_text": elements })
            }
            PropertyValue::Select(name) => json!({ "select": { "name": name } }),
            PropertyValue::Number(n) => json!({ "number": n }),
            PropertyValue::Date(start) => json!({ "date": { "start": start } }),
            PropertyValue::Relation(ids) => {
                let ids: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
                json!({ "relation": ids })
            }
            PropertyValue::Checkbox(checked) => json!({ "checkbox": checked }),
            PropertyValue::Url(url) => json!({ "url": url }),
        }
    }
}

fn text_element(content: &str) -> Value {
    json!({ "type": "text", "text": { "content": content } })
}

/// Split `text` into blocks of at most [`MAX_TEXT_CHARS`] characters.
///
/// Concatenating the blocks yields `text`; an empty string yields one empty block.
pub fn chunk_text(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_TEXT_CHARS)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// An ordered property map for a create or update call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(BTreeMap<String, PropertyValue>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, name: &str, value: PropertyValue) -> Self {
        self.0.insert(name.to_string(), value);
        self
    }

    pub fn title(self, name: &str, text: impl Into<String>) -> Self {
        self.insert(name, PropertyValue::Title(text.into()))
    }

    pub fn rich_text(self, name: &str, text: impl Into<String>) -> Self {
        self.insert(name, PropertyValue::RichText(text.into()))
    }

    pub fn select(self, name: &str, option: impl Into<String>) -> Self {
        self.insert(name, PropertyValue::Select(option.into()))
    }

    pub fn number(self, name: &str, value: impl Into<f64>) -> Self {
        self.insert(name, PropertyValue::Number(value.into()))
    }

    pub fn date(self, name: &str, start: impl Into<String>) -> Self {
        self.insert(name, PropertyValue::Date(start.into()))
    }

    pub fn relation<I, S>(self, name: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(
            name,
            PropertyValue::Relation(ids.into_iter().map(Into::into).collect()),
        )
    }

    pub fn checkbox(self, name: &str, checked: bool) -> Self {
        self.insert(name, PropertyValue::Checkbox(checked))
    }

    pub fn url(self, name: &str, url: impl Into<String>) -> Self {
        self.insert(name, PropertyValue::Url(url.into()))
    }

    /// Set a date only when `start` is non-empty.
    pub fn optional_date(self, name: &str, start: &str) -> Self {
        let start = start.trim();
        if start.is_empty() {
            self
        } else {
            self.date(name, start)
        }
    }

    /// Set a url only when present and non-empty.
    pub fn optional_url(self, name: &str, url: Option<&str>) -> Self {
        match url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => self.url(name, url),
            None => self,
        }
    }

    /// Keep only the named properties.
    pub fn subset(&self, names: &[&str]) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(name, _)| names.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect()
    }
}

/// A run of paragraph text, optionally bold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub content: String,
    pub bold: bool,
}

impl TextSegment {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            bold: false,
        }
    }

    pub fn bold(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            bold: true,
        }
    }

    /// One text element per [`MAX_TEXT_CHARS`] chunk, each carrying the annotation.
    fn elements(&self) -> Vec<Value> {
        chunk_text(&self.content)
            .iter()
            .map(|chunk| {
                let mut element = text_element(chunk);
                if self.bold {
                    element["annotations"] = json!({ "bold": true });
                }
                element
            })
            .collect()
    }
}

/// Page-body block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading2(String),
    Paragraph(Vec<TextSegment>),
}

impl Block {
    pub fn to_json(&self) -> Value {
        match self {
            Block::Heading2(text) => json!({
                "object": "block",
                "type": "heading_2",
                "heading_2": { "rich_text": TextSegment::plain(text.clone()).elements() }
            }),
            Block::Paragraph(segments) => {
                let rich_text: Vec<Value> = segments.iter().flat_map(TextSegment::elements).collect();
                json!({
                    "object": "block",
                    "type": "paragraph",
                    "paragraph": { "rich_text": rich_text }
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_text_is_one_empty_block() {
        assert_eq!(chunk_text(""), vec![String::new()]);
        let json = PropertyValue::RichText(String::new()).to_json();
        assert_eq!(json["rich_text"].as_array().unwrap().len(), 1);
        assert_eq!(json["rich_text"][0]["text"]["content"], "");
    }

    #[test]
    fn test_rich_text_chunked_at_limit() {
        let text = "x".repeat(4500);
        let chunks = chunk_text(&text);
        assert_eq!(
            chunks.iter().map(String::len).collect::<Vec<_>>(),
            vec![2000, 2000, 500]
        );
    }

    #[test]
    fn test_title_cut_to_limit() {
        let json = PropertyValue::Title("t".repeat(2500)).to_json();
        let content = json["title"][0]["text"]["content"].as_str().unwrap();
        assert_eq!(content.chars().count(), MAX_TEXT_CHARS);
    }

    #[test]
    fn test_value_shapes() {
        assert_eq!(
            PropertyValue::Select("High".into()).to_json(),
            json!({"select": {"name": "High"}})
        );
        assert_eq!(PropertyValue::Number(72.0).to_json(), json!({"number": 72.0}));
        assert_eq!(
            PropertyValue::Relation(vec!["a".into(), "b".into()]).to_json(),
            json!({"relation": [{"id": "a"}, {"id": "b"}]})
        );
        assert_eq!(
            PropertyValue::Date("2026-02-28".into()).to_json(),
            json!({"date": {"start": "2026-02-28"}})
        );
        assert_eq!(PropertyValue::Checkbox(true).to_json(), json!({"checkbox": true}));
        assert_eq!(
            PropertyValue::Url("https://x.test".into()).to_json(),
            json!({"url": "https://x.test"})
        );
    }

    #[test]
    fn test_optional_setters_skip_empty() {
        let props = Properties::new()
            .optional_date("Date", "  ")
            .optional_url("URL", Some(""))
            .optional_url("Other URL", None);
        assert!(props.is_empty());

        let props = Properties::new().optional_date("Date", "2025-11-01");
        assert_eq!(props.get("Date"), Some(&PropertyValue::Date("2025-11-01".into())));
    }

    #[test]
    fn test_subset_keeps_named_properties() {
        let props = Properties::new()
            .title("Title", "T")
            .select("Reliability", "High")
            .rich_text("Summary", "S");
        let core = props.subset(&["Title", "Reliability", "Missing"]);
        assert_eq!(core.names().collect::<Vec<_>>(), vec!["Reliability", "Title"]);
    }

    #[test]
    fn test_bold_segment_annotation() {
        let block = Block::Paragraph(vec![TextSegment::bold("Russia"), TextSegment::plain(" moved")]);
        let json = block.to_json();
        assert_eq!(json["type"], "paragraph");
        assert_eq!(json["paragraph"]["rich_text"][0]["annotations"]["bold"], true);
        assert!(json["paragraph"]["rich_text"][1].get("annotations").is_none());
    }

    #[test]
    fn test_long_paragraph_is_split_not_cut() {
        let block = Block::Paragraph(vec![
            TextSegment::plain("a".repeat(4500)),
            TextSegment::bold("b".repeat(2001)),
        ]);
        let json = block.to_json();
        let rich_text = json["paragraph"]["rich_text"].as_array().unwrap();
        assert_eq!(rich_text.len(), 5);

        let lengths: Vec<usize> = rich_text
            .iter()
            .map(|e| e["text"]["content"].as_str().unwrap().chars().count())
            .collect();
        assert_eq!(lengths, vec![2000, 2000, 500, 2000, 1]);
        assert!(rich_text[3..].iter().all(|e| e["annotations"]["bold"] == true));
        assert!(rich_text[..3].iter().all(|e| e.get("annotations").is_none()));

        let heading = Block::Heading2("h".repeat(2500)).to_json();
        assert_eq!(heading["heading_2"]["rich_text"].as_array().unwrap().len(), 2);
    }

    proptest! {
        #[test]
        fn chunks_bounded_and_lossless(text in ".{0,5000}") {
            let chunks = chunk_text(&text);
            prop_assert!(!chunks.is_empty());
            prop_assert!(chunks.iter().all(|c| c.chars().count() <= MAX_TEXT_CHARS));
            prop_assert_eq!(chunks.concat(), text);
        }
    }
}
