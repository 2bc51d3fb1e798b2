use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::{is_blank, ValidationError};

/// Id of the built-in profile that matches every restaurant.
pub const DEFAULT_PROFILE_ID: &str = "all";

const DEFAULT_PROFILE_NAME: &str = "All Restaurants";

/// A named filter that restaurants opt into by id.
///
/// Like [`Restaurant`](super::Restaurant), a stored profile is kept as the
/// object it was read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(Map<String, Value>);

impl Profile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("id".into(), Value::String(id.into()));
        fields.insert("name".into(), Value::String(name.into()));
        Self(fields)
    }

    /// The `all` profile every document implicitly starts with.
    pub fn default_profile() -> Self {
        Self::new(DEFAULT_PROFILE_ID, DEFAULT_PROFILE_NAME)
    }

    /// Id as stored; empty when the record has no string id.
    pub fn id(&self) -> &str {
        self.0.get("id").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.0.get("name").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn is_default(&self) -> bool {
        self.id() == DEFAULT_PROFILE_ID
    }

    /// Validates a submitted profile body.
    ///
    /// Both `id` and `name` must be non-empty strings.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(fields) = value else {
            return Err(ValidationError::MissingFields);
        };

        if is_blank(fields.get("id")) || is_blank(fields.get("name")) {
            return Err(ValidationError::MissingFields);
        }
        if !fields["id"].is_string() {
            return Err(ValidationError::InvalidField(
                "id must be a string".to_string(),
            ));
        }
        if !fields["name"].is_string() {
            return Err(ValidationError::InvalidField(
                "name must be a string".to_string(),
            ));
        }

        Ok(Self(fields))
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}
