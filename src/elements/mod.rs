mod presets;
mod vocab;

pub use presets::Preset;
pub use vocab::{Composition, Lighting, Mood, Style};

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The eight elements that together describe one image prompt.
///
/// Only `subject` is required for assembly; every other element may be left
/// empty and is then skipped. Deserialization rejects keys outside the eight
/// element names, so a stray key in a template or a model response fails
/// instead of being silently dropped. Values are read loosely: `null` is an
/// empty element and lists or numbers are flattened to text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElementSet {
    #[serde(deserialize_with = "loose_text")]
    pub subject: String,
    #[serde(deserialize_with = "loose_text")]
    pub composition: String,
    #[serde(deserialize_with = "loose_text")]
    pub style: String,
    #[serde(deserialize_with = "loose_text")]
    pub lighting: String,
    #[serde(deserialize_with = "loose_text")]
    pub color: String,
    #[serde(deserialize_with = "loose_text")]
    pub mood: String,
    #[serde(deserialize_with = "loose_text")]
    pub details: String,
    #[serde(deserialize_with = "loose_text")]
    pub context: String,
}

fn loose_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(flatten_text)
}

fn flatten_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        Value::Array(items) => items
            .into_iter()
            .map(flatten_text)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

impl ElementSet {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Subject => &self.subject,
            Field::Composition => &self.composition,
            Field::Style => &self.style,
            Field::Lighting => &self.lighting,
            Field::Color => &self.color,
            Field::Mood => &self.mood,
            Field::Details => &self.details,
            Field::Context => &self.context,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Subject => &mut self.subject,
            Field::Composition => &mut self.composition,
            Field::Style => &mut self.style,
            Field::Lighting => &mut self.lighting,
            Field::Color => &mut self.color,
            Field::Mood => &mut self.mood,
            Field::Details => &mut self.details,
            Field::Context => &mut self.context,
        };
        *slot = value.into();
    }

    pub fn has_subject(&self) -> bool {
        !self.subject.trim().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|field| self.get(*field).is_empty())
    }

    /// Non-empty elements in canonical order.
    pub fn populated(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        Field::ALL
            .iter()
            .map(|field| (*field, self.get(*field)))
            .filter(|(_, value)| !value.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Subject,
    Composition,
    Style,
    Lighting,
    Color,
    Mood,
    Details,
    Context,
}

#[cfg(test)]
impl ElementSet {
    pub fn with_subject(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }
}

impl Field {
    /// Canonical order, shared by assembly, persistence and the line scanner.
    pub const ALL: [Field; 8] = [
        Field::Subject,
        Field::Composition,
        Field::Style,
        Field::Lighting,
        Field::Color,
        Field::Mood,
        Field::Details,
        Field::Context,
    ];

    /// JSON key and English keyword.
    pub fn key(self) -> &'static str {
        match self {
            Field::Subject => "subject",
            Field::Composition => "composition",
            Field::Style => "style",
            Field::Lighting => "lighting",
            Field::Color => "color",
            Field::Mood => "mood",
            Field::Details => "details",
            Field::Context => "context",
        }
    }

    /// Label used in the assembled prompt. The subject is emitted bare.
    pub fn prompt_label(self) -> Option<&'static str> {
        match self {
            Field::Subject => None,
            Field::Composition => Some("composition"),
            Field::Style => Some("style"),
            Field::Lighting => Some("lighting"),
            Field::Color => Some("colors"),
            Field::Mood => Some("mood"),
            Field::Details => Some("details"),
            Field::Context => Some("for"),
        }
    }

    /// Hebrew keyword that free-text model answers may use instead of the key.
    pub fn native_label(self) -> &'static str {
        match self {
            Field::Subject => "נושא",
            Field::Composition => "קומפוזיציה",
            Field::Style => "סגנון",
            Field::Lighting => "תאורה",
            Field::Color => "צבע",
            Field::Mood => "מצב רוח",
            Field::Details => "פרטים",
            Field::Context => "הקשר",
        }
    }

    pub fn from_key(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "subject" => Some(Field::Subject),
            "composition" => Some(Field::Composition),
            "style" => Some(Field::Style),
            "lighting" => Some(Field::Lighting),
            "color" | "colors" => Some(Field::Color),
            "mood" => Some(Field::Mood),
            "details" => Some(Field::Details),
            "context" => Some(Field::Context),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
