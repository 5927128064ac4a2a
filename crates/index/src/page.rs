use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A page as returned by the store: id, url and raw property JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Identity of a created or updated page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub id: String,
    pub url: String,
}

impl PageRef {
    pub fn new(id: impl Into<String>, url: Option<String>) -> Self {
        let id = id.into();
        let url = url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| fallback_url(&id));
        Self { id, url }
    }
}

pub fn fallback_url(id: &str) -> String {
    format!("https://notion.so/{}", id.replace('-', ""))
}

impl From<&Page> for PageRef {
    fn from(page: &Page) -> Self {
        PageRef::new(page.id.clone(), page.url.clone())
    }
}

impl Page {
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Concatenated text of a title or rich_text property; empty when absent.
    pub fn text(&self, name: &str) -> String {
        self.property(name).map(plain_text).unwrap_or_default()
    }

    /// Text of the first of `names` that is present and non-empty.
    pub fn text_any(&self, names: &[&str]) -> String {
        names
            .iter()
            .map(|name| self.text(name))
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }

    pub fn select(&self, name: &str) -> Option<String> {
        self.property(name)?
            .get("select")?
            .get("name")?
            .as_str()
            .map(str::to_string)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.property(name)?.get("number")?.as_f64()
    }

    pub fn date(&self, name: &str) -> Option<String> {
        self.property(name)?
            .get("date")?
            .get("start")?
            .as_str()
            .map(str::to_string)
    }

    pub fn relation_ids(&self, name: &str) -> Vec<String> {
        self.property(name)
            .and_then(|p| p.get("relation"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("id").and_then(Value::as_str))
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Text of whichever property has type `title`.
    pub fn title(&self) -> String {
        self.properties
            .values()
            .find(|p| p.get("type").and_then(Value::as_str) == Some("title") || p.get("title").is_some())
            .map(plain_text)
            .unwrap_or_default()
    }
}

/// Text of a title/rich_text property. Elements from the API carry
/// `plain_text`; elements written locally carry only `text.content`.
pub fn plain_text(property: &Value) -> String {
    let items = property
        .get("title")
        .or_else(|| property.get("rich_text"))
        .and_then(Value::as_array);

    items
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.get("plain_text")
                        .or_else(|| item.get("text").and_then(|t| t.get("content")))
                        .and_then(Value::as_str)
                })
                .collect()
        })
        .unwrap_or_default()
}
