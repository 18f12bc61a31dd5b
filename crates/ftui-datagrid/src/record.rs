#![forbid(unsafe_code)]

//! Records and header fields as delivered by the remote source.
//!
//! A [`Record`] is an ordered list of `(label, payload)` pairs. The payload is
//! opaque to the cache; it is copied in verbatim and handed to the renderer.
//! Field order follows the order of keys in the source document, so records
//! are decoded with a map visitor rather than through `serde_json::Map`.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

/// One labelled cell of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Display text of the cell.
    pub label: String,
    /// Cell attributes (link targets, click handlers, ...). Opaque here.
    pub payload: Value,
}

impl Field {
    /// Create a field.
    pub fn new(label: impl Into<String>, payload: Value) -> Self {
        Self {
            label: label.into(),
            payload,
        }
    }
}

/// A single row of grid data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<Field>,
}

impl Record {
    /// Create a record from fields, preserving their order.
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Create a record whose fields all carry an empty payload.
    pub fn from_labels<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            labels
                .into_iter()
                .map(|l| Field::new(l, Value::Object(serde_json::Map::new()))),
        )
    }

    /// Fields in source order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over field labels.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.label.as_str())
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a record object mapping labels to payloads")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Record, A::Error> {
                let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((label, payload)) = map.next_entry::<String, Value>()? {
                    fields.push(Field { label, payload });
                }
                Ok(Record { fields })
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// A column header.
///
/// The width is advisory: a renderer may widen the column to fit its content
/// but never narrows it below the configured minimum column width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    /// Column label.
    pub label: String,
    /// Preferred width in cells, if the source specified one.
    pub width: Option<u16>,
}

impl HeaderField {
    /// A header without a preferred width.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            width: None,
        }
    }

    /// Set the preferred width.
    #[must_use]
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }
}

/// Accepts either `"Label"` or `{"Label": 170}`.
impl<'de> Deserialize<'de> for HeaderField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HeaderVisitor;

        impl<'de> Visitor<'de> for HeaderVisitor {
            type Value = HeaderField;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a header label or a single-entry {label: width} object")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<HeaderField, E> {
                Ok(HeaderField::new(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<HeaderField, E> {
                Ok(HeaderField::new(v))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<HeaderField, A::Error> {
                let Some((label, width)) = map.next_entry::<String, u16>()? else {
                    return Err(de::Error::invalid_length(0, &self));
                };
                if map.next_key::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::custom(
                        "header object must contain exactly one label",
                    ));
                }
                Ok(HeaderField {
                    label,
                    width: Some(width),
                })
            }
        }

        deserializer.deserialize_any(HeaderVisitor)
    }
}
