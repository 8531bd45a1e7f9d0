//! Raw attribute storage and the lenient value accessors used while populating entities.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{Color, ModelError};

/// Delimiter for list-valued attributes.
pub const ATTRIBUTE_VALUE_DELIMITER: char = ',';

/// A single name/value pair taken out of an [`AttributeCollection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    /// Parse as a float, falling back to `default` on malformed input.
    pub fn value_as_float(&self, default: f32) -> f32 {
        self.value.trim().parse().unwrap_or(default)
    }

    /// Parse as an integer, falling back to `default` on malformed input.
    pub fn value_as_int(&self, default: i32) -> i32 {
        self.value.trim().parse().unwrap_or(default)
    }

    /// Positive integers are true; anything else is false.
    pub fn value_as_bool(&self) -> bool {
        self.value_as_int(0) > 0
    }

    /// One of the named pack colors, else hex, else `default`.
    pub fn value_as_color(&self, default: Color) -> Color {
        match self.value.trim().to_ascii_lowercase().as_str() {
            "white" => Color::WHITE,
            "yellow" => Color::rgba(255, 255, 0, 255),
            "red" => Color::rgba(242, 13, 19, 255),
            "green" => Color::rgba(85, 221, 85, 255),
            hex => Color::from_hex(hex).unwrap_or(default),
        }
    }

    /// Parse a pack GUID.
    ///
    /// Packs store GUIDs as base64 of the 16 raw bytes, with the first three
    /// fields little-endian. Hyphenated UUID text is accepted as well.
    pub fn value_as_guid(&self) -> Result<Uuid, ModelError> {
        let value = self.value.trim();

        if let Ok(bytes) = BASE64.decode(value) {
            if let Ok(raw) = <[u8; 16]>::try_from(bytes.as_slice()) {
                return Ok(Uuid::from_bytes_le(raw));
            }
        }

        Uuid::parse_str(value).map_err(|_| ModelError::InvalidGuid(self.value.clone()))
    }

    /// Split a list value and parse each entry, using `0.0` for malformed ones.
    pub fn value_as_floats(&self) -> Vec<f32> {
        self.value
            .split(ATTRIBUTE_VALUE_DELIMITER)
            .map(|part| part.trim().parse().unwrap_or_default())
            .collect()
    }
}

/// Attributes of a descriptor, keyed case-insensitively.
///
/// Entity construction pops the attributes it understands; whatever remains
/// afterwards went unused.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeCollection {
    attributes: HashMap<String, String>,
}

impl AttributeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute, replacing any earlier value under the same name.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Remove and return an attribute if present.
    pub fn try_pop(&mut self, name: &str) -> Option<Attribute> {
        let name = name.to_ascii_lowercase();
        self.attributes
            .remove(&name)
            .map(|value| Attribute { name, value })
    }

    /// Peek at an attribute without consuming it.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Names of the attributes still present.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for AttributeCollection {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut collection = Self::new();
        for (name, value) in iter {
            collection.insert(name.as_ref(), value);
        }
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_pop_removes_attribute() {
        let mut attributes: AttributeCollection =
            [("XPos", "1.5"), ("title", "Vista")].into_iter().collect();

        assert_eq!(attributes.get("XPOS"), Some("1.5"));
        let xpos = attributes.try_pop("xpos").expect("case-insensitive pop");
        assert_eq!(xpos.value_as_float(0.0), 1.5);
        assert!(attributes.try_pop("xpos").is_none());
        assert!(attributes.get("xpos").is_none());
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes.names().collect::<Vec<_>>(), vec!["title"]);
    }

    fn attribute(name: &str, value: &str) -> Attribute {
        Attribute {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_base64_guid_decodes_with_little_endian_fields() {
        let guid = attribute("guid", "Ktp0WjQUNEeXjkvlEYoBBw==").value_as_guid().unwrap();

        assert_eq!(guid.hyphenated().to_string(), "5a74da2a-1434-4734-978e-4be5118a0107");
        assert_eq!(attribute("guid", " Ktp0WjQUNEeXjkvlEYoBBw== ").value_as_guid().unwrap(), guid);
    }

    #[test]
    fn test_guid_falls_back_to_uuid_text() {
        let text = "5a74da2a-1434-4734-978e-4be5118a0107";
        let guid = attribute("guid", text).value_as_guid().unwrap();
        assert_eq!(guid.hyphenated().to_string(), text);

        // Valid base64, but not 16 bytes.
        assert!(attribute("guid", "AAAA").value_as_guid().is_err());
    }

    #[test]
    fn test_named_colors() {
        let color = |value: &str| attribute("color", value).value_as_color(Color::WHITE);

        assert_eq!(color("Red"), Color::rgba(242, 13, 19, 255));
        assert_eq!(color("yellow"), Color::rgba(255, 255, 0, 255));
        assert_eq!(color("green"), Color::rgba(85, 221, 85, 255));
        assert_eq!(color("#00ff00"), Color::rgba(0, 255, 0, 255));

        let black = Color::rgba(0, 0, 0, 255);
        assert_eq!(attribute("color", "WHITE").value_as_color(black), Color::WHITE);
    }

    #[test]
    fn test_lenient_parsing_uses_defaults() {
        let bad = Attribute {
            name: "triggerrange".to_string(),
            value: "far".to_string(),
        };

        assert_eq!(bad.value_as_float(2.0), 2.0);
        assert_eq!(bad.value_as_int(7), 7);
        assert!(!bad.value_as_bool());
        assert_eq!(bad.value_as_color(Color::WHITE), Color::WHITE);
        assert!(bad.value_as_guid().is_err());
    }

    #[test]
    fn test_list_values() {
        let attribute = Attribute {
            name: "fade".to_string(),
            value: "1, 2.5,x".to_string(),
        };

        assert_eq!(attribute.value_as_floats(), vec![1.0, 2.5, 0.0]);
    }
}
