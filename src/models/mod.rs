//! Records stored in the restaurant picker document.

mod document;
mod profile;
mod restaurant;

pub use document::Document;
pub use profile::{Profile, DEFAULT_PROFILE_ID};
pub use restaurant::{Restaurant, ServiceType};

use thiserror::Error;

/// Reasons a submitted record is rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is absent, null or empty.
    #[error("Missing required fields")]
    MissingFields,
    /// `foodTypes` or `serviceTypes` is present but not an array.
    #[error("foodTypes and serviceTypes must be arrays")]
    NotArrays,
    /// One or more service types are outside the allowed set.
    #[error("Invalid service types: {}", .0.join(", "))]
    InvalidServiceTypes(Vec<String>),
    /// `profiles` is present but not an array of profile ids.
    #[error("profiles must be an array")]
    ProfilesNotArray,
    /// A field has the wrong JSON type.
    #[error("{0}")]
    InvalidField(String),
    /// The default profile cannot be removed.
    #[error("Cannot delete the default \"All Restaurants\" profile")]
    ProtectedProfile,
}

/// Returns true when a JSON value counts as "not provided".
///
/// Mirrors the loose presence check clients already rely on: null, empty
/// strings and `false` are treated the same as a missing key.
pub(crate) fn is_blank(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => s.is_empty(),
        Some(serde_json::Value::Bool(b)) => !b,
        Some(_) => false,
    }
}
