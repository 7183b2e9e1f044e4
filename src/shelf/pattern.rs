use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A knitting pattern as returned by the catalog.
///
/// Only `id` is typed. Every other field is kept exactly as the catalog sent
/// it, explicit `null`s and empty arrays included, and read through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: i64,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSize {
    Medium,
    Small,
    Square,
}

impl PhotoSize {
    fn key(self) -> &'static str {
        match self {
            PhotoSize::Medium => "medium_url",
            PhotoSize::Small => "small_url",
            PhotoSize::Square => "square_url",
        }
    }
}

impl Pattern {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Catalog lookups such as `craft` arrive either as a string or as an
    /// object carrying a `name`.
    fn named(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            Value::String(s) => Some(s.as_str()),
            other => other.get("name").and_then(Value::as_str),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    pub fn craft(&self) -> Option<&str> {
        self.named("craft")
    }

    pub fn published(&self) -> Option<&str> {
        self.str_field("published")
    }

    pub fn yarn_weight(&self) -> Option<&str> {
        self.named("yarn_weight")
    }

    pub fn pattern_type(&self) -> Option<&str> {
        self.named("pattern_type")
    }

    pub fn description(&self) -> Option<&str> {
        self.str_field("description")
    }

    pub fn photo_url(&self, size: PhotoSize) -> Option<&str> {
        self.get("first_photo")?.get(size.key())?.as_str()
    }

    /// Price of the first source that lists one.
    pub fn price(&self) -> Option<&Value> {
        self.get("pattern_sources")?
            .as_array()?
            .iter()
            .find_map(|s| s.get("price").filter(|p| !p.is_null()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_unknown_catalog_fields() {
        let raw = json!({
            "id": 7,
            "name": "Hitchhiker",
            "craft": {"id": 2, "name": "Knitting"},
            "pattern_type": "Shawl/Wrap",
            "yarn_weight": {"name": "Fingering", "ply": "4"},
            "first_photo": {"small_url": "https://img/s.jpg"},
            "pattern_sources": [{"name": "Ravelry"}, {"price": 5.5, "name": "Shop"}],
            "rating_average": 4.8
        });
        let pattern: Pattern = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(pattern.craft(), Some("Knitting"));
        assert_eq!(pattern.pattern_type(), Some("Shawl/Wrap"));
        assert_eq!(pattern.yarn_weight(), Some("Fingering"));
        assert_eq!(pattern.photo_url(PhotoSize::Small), Some("https://img/s.jpg"));
        assert_eq!(pattern.photo_url(PhotoSize::Medium), None);
        assert_eq!(pattern.price(), Some(&json!(5.5)));
        assert_eq!(serde_json::to_value(&pattern).unwrap(), raw);
    }

    #[test]
    fn keeps_explicit_nulls_and_empty_arrays() {
        let raw = json!({
            "id": 1,
            "name": "X",
            "description": null,
            "first_photo": null,
            "yarn_weight": null,
            "pattern_sources": [{"price": null}],
            "packs": []
        });
        let pattern: Pattern = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(pattern.description(), None);
        assert_eq!(pattern.photo_url(PhotoSize::Square), None);
        assert_eq!(pattern.price(), None);

        let text = serde_json::to_string(&pattern).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, raw);
    }
}
