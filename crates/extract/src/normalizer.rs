use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::schema::{
    Actor, ActorType, Event, EventType, ExtractionResult, Label, PfSignal, Reliability, Source,
    SourceType,
};

/// Record of an out-of-set value replaced by its field default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionWarning {
    pub field: String,
    pub value: String,
    pub default: String,
}

/// Coerces model output into the closed extraction schema.
///
/// Coercion is total: every enum field ends up a member of its set, either
/// the model's value or the field default. Each replacement is logged and
/// kept in [`EnumNormalizer::warnings`].
#[derive(Debug, Default)]
pub struct EnumNormalizer {
    warnings: Vec<CoercionWarning>,
}

impl EnumNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `value` to a member of `L`, or to `default` with a warning.
    pub fn coerce<L: Label>(&mut self, value: &Value, field: &str, default: L) -> L {
        let raw = value_as_string(value);
        if let Some(label) = L::parse(&raw) {
            return label;
        }

        warn!(
            field = field,
            value = %raw,
            default = default.as_str(),
            "invalid enum value, using default"
        );
        self.warnings.push(CoercionWarning {
            field: field.to_string(),
            value: raw,
            default: default.as_str().to_string(),
        });
        default
    }

    /// Coerce a parsed extraction object into an [`ExtractionResult`].
    pub fn normalize_extraction(&mut self, data: &Map<String, Value>) -> ExtractionResult {
        let empty = Map::new();
        let source = data.get("source").and_then(Value::as_object).unwrap_or(&empty);
        let event = data.get("event").and_then(Value::as_object).unwrap_or(&empty);

        let source = Source {
            title: text_field(source, "title"),
            author_organization: text_field(source, "author_organization"),
            publication_date: text_field(source, "publication_date"),
            source_type: self.coerce(
                field(source, "source_type"),
                "source.source_type",
                SourceType::Other,
            ),
            reliability: self.coerce(
                field(source, "reliability"),
                "source.reliability",
                Reliability::Medium,
            ),
            summary: text_field(source, "summary"),
            url: optional_text(field(source, "url")),
        };

        let event = Event {
            event_name: text_field(event, "event_name"),
            date: text_field(event, "date"),
            event_type: self.coerce(field(event, "event_type"), "event.event_type", EventType::Other),
            description: text_field(event, "description"),
            pf_signal: self.coerce(field(event, "pf_signal"), "event.pf_signal", PfSignal::Indirect),
        };

        let actors = data
            .get("actors")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|actor| self.normalize_actor(actor))
                    .collect()
            })
            .unwrap_or_default();

        ExtractionResult {
            source,
            event,
            actors,
        }
    }

    fn normalize_actor(&mut self, actor: &Map<String, Value>) -> Actor {
        let name = text_field(actor, "name");
        let label = format!(
            "actors[{}].actor_type",
            if name.is_empty() { "?" } else { name.as_str() }
        );

        Actor {
            actor_type: self.coerce(field(actor, "actor_type"), &label, ActorType::NonState),
            role_in_event: text_field(actor, "role_in_event"),
            iso3: optional_text(field(actor, "iso3")),
            name,
        }
    }

    pub fn warnings(&self) -> &[CoercionWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<CoercionWarning> {
        self.warnings
    }
}

static NULL: Value = Value::Null;

fn field<'a>(object: &'a Map<String, Value>, key: &str) -> &'a Value {
    object.get(key).unwrap_or(&NULL)
}

fn text_field(object: &Map<String, Value>, key: &str) -> String {
    value_as_string(field(object, key))
}

/// Strings pass through, null becomes empty, anything else its JSON text.
pub(crate) fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `Some(trimmed)` only for non-empty strings.
fn optional_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
