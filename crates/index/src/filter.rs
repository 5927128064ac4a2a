//! Query filters and sorts.

use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    TitleEquals(String),
    SelectEquals(String),
    RelationContains(String),
    NumberIsNotEmpty,
    DateOnOrAfter(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Property { property: String, condition: Condition },
    /// Page creation time on or after an RFC 3339 timestamp.
    CreatedOnOrAfter(String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn property(property: &str, condition: Condition) -> Self {
        Filter::Property {
            property: property.to_string(),
            condition,
        }
    }

    pub fn title_equals(property: &str, value: impl Into<String>) -> Self {
        Self::property(property, Condition::TitleEquals(value.into()))
    }

    pub fn select_equals(property: &str, value: impl Into<String>) -> Self {
        Self::property(property, Condition::SelectEquals(value.into()))
    }

    pub fn relation_contains(property: &str, page_id: impl Into<String>) -> Self {
        Self::property(property, Condition::RelationContains(page_id.into()))
    }

    pub fn to_json(&self) -> Value {
        match self {
            Filter::Property {
                property,
                condition,
            } => {
                let (kind, body) = match condition {
                    Condition::TitleEquals(v) => ("title", json!({ "equals": v })),
                    Condition::SelectEquals(v) => ("select", json!({ "equals": v })),
                    Condition::RelationContains(id) => ("relation", json!({ "contains": id })),
                    Condition::NumberIsNotEmpty => ("number", json!({ "is_not_empty": true })),
                    Condition::DateOnOrAfter(d) => ("date", json!({ "on_or_after": d })),
                };
                let mut filter = json!({ "property": property });
                filter[kind] = body;
                filter
            }
            Filter::CreatedOnOrAfter(ts) => json!({
                "timestamp": "created_time",
                "created_time": { "on_or_after": ts }
            }),
            Filter::And(filters) => {
                json!({ "and": filters.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
            Filter::Or(filters) => {
                json!({ "or": filters.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sort {
    Property { property: String, direction: Direction },
    CreatedTime(Direction),
}

impl Sort {
    pub fn property(property: &str, direction: Direction) -> Self {
        Sort::Property {
            property: property.to_string(),
            direction,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Sort::Property {
                property,
                direction,
            } => json!({ "property": property, "direction": direction.as_str() }),
            Sort::CreatedTime(direction) => {
                json!({ "timestamp": "created_time", "direction": direction.as_str() })
            }
        }
    }
}
