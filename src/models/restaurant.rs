use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::{is_blank, ValidationError};

/// Ways a restaurant can serve food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    Takeout,
    Delivery,
    DineIn,
    AtHome,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::Takeout,
        ServiceType::Delivery,
        ServiceType::DineIn,
        ServiceType::AtHome,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Takeout => "takeout",
            ServiceType::Delivery => "delivery",
            ServiceType::DineIn => "dine-in",
            ServiceType::AtHome => "at-home",
        }
    }

    /// Parse from the wire name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A restaurant record.
///
/// Records are kept as the JSON object they were stored as. A record added
/// by hand or by an older client still loads, and is written back as it
/// was; the schema is only enforced on records being added through
/// [`Restaurant::from_value`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Restaurant(Map<String, Value>);

impl Restaurant {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("id".into(), id.into());
        fields.insert("name".into(), Value::String(name.into()));
        fields.insert("foodTypes".into(), Value::Array(Vec::new()));
        fields.insert("serviceTypes".into(), Value::Array(Vec::new()));
        Self(fields)
    }

    pub fn with_food_types(mut self, food_types: Vec<String>) -> Self {
        self.0.insert("foodTypes".into(), food_types.into());
        self
    }

    pub fn with_service_types(mut self, service_types: Vec<ServiceType>) -> Self {
        let names: Vec<Value> = service_types.iter().map(|t| t.as_str().into()).collect();
        self.0.insert("serviceTypes".into(), Value::Array(names));
        self
    }

    pub fn with_profiles(mut self, profiles: Vec<String>) -> Self {
        self.0.insert("profiles".into(), profiles.into());
        self
    }

    /// Numeric id, if the record has one.
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    pub fn name(&self) -> &str {
        self.0.get("name").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn food_types(&self) -> Vec<&str> {
        strings(self.0.get("foodTypes"))
    }

    /// Service types as stored, including names outside [`ServiceType`].
    pub fn service_types(&self) -> Vec<&str> {
        strings(self.0.get("serviceTypes"))
    }

    /// Profile ids, or `None` when the record does not list any.
    pub fn profiles(&self) -> Option<Vec<&str>> {
        self.0
            .get("profiles")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_str).collect())
    }

    /// Raw field lookup, including fields this backend does not interpret.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Validates a submitted restaurant body.
    ///
    /// Checks run in the order clients see them reported: presence of the
    /// required fields, array shape, the service type whitelist, element
    /// types, the optional profile list, and finally the optional id.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(fields) = value else {
            return Err(ValidationError::MissingFields);
        };

        if ["name", "foodTypes", "serviceTypes"]
            .iter()
            .any(|key| is_blank(fields.get(*key)))
        {
            return Err(ValidationError::MissingFields);
        }

        let (Some(food_types), Some(service_types)) = (
            fields["foodTypes"].as_array(),
            fields["serviceTypes"].as_array(),
        ) else {
            return Err(ValidationError::NotArrays);
        };

        let invalid: Vec<String> = service_types
            .iter()
            .filter(|v| v.as_str().and_then(ServiceType::parse).is_none())
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        if !invalid.is_empty() {
            return Err(ValidationError::InvalidServiceTypes(invalid));
        }

        if !food_types.iter().all(Value::is_string) {
            return Err(ValidationError::InvalidField(
                "foodTypes must contain only strings".to_string(),
            ));
        }
        if !fields["name"].is_string() {
            return Err(ValidationError::InvalidField(
                "name must be a string".to_string(),
            ));
        }

        match fields.get("profiles") {
            None | Some(Value::Null) => {}
            Some(Value::Array(ids)) if ids.iter().all(Value::is_string) => {}
            Some(_) => return Err(ValidationError::ProfilesNotArray),
        }

        match fields.get("id") {
            None | Some(Value::Null) => {}
            Some(id) if id.as_i64().is_some() => {}
            Some(_) => {
                return Err(ValidationError::InvalidField(
                    "id must be an integer".to_string(),
                ))
            }
        }

        Ok(Self(fields))
    }
}

fn strings(value: Option<&Value>) -> Vec<&str> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

impl fmt::Display for Restaurant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = self.id() {
            write!(f, "#{} ", id)?;
        }
        write!(
            f,
            "{} [{}] ({})",
            self.name(),
            self.food_types().join(", "),
            self.service_types().join(", ")
        )
    }
}
