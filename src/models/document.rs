//! The single JSON document holding every restaurant and profile.
//!
//! ```text
//! {
//!   "restaurants": [ { "id": 1, "name": "...", ... } ],
//!   "profiles": [ { "id": "all", "name": "All Restaurants" } ]
//! }
//! ```
//!
//! Top-level keys other than the two collections are carried through
//! untouched so a write only changes what the caller changed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Profile, Restaurant};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
    /// `None` until a profile has been written for the first time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles: Option<Vec<Profile>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Profiles as clients see them, falling back to the default `all` entry.
    pub fn profiles_or_default(&self) -> Vec<Profile> {
        match &self.profiles {
            Some(profiles) => profiles.clone(),
            None => vec![Profile::default_profile()],
        }
    }

    /// Mutable access to the profile list, materializing the default first.
    pub fn profiles_mut(&mut self) -> &mut Vec<Profile> {
        self.profiles
            .get_or_insert_with(|| vec![Profile::default_profile()])
    }

    pub fn find_restaurant(&self, id: i64) -> Option<&Restaurant> {
        self.restaurants.iter().find(|r| r.id() == Some(id))
    }

    /// Removes the first restaurant with the given id.
    pub fn remove_restaurant(&mut self, id: i64) -> Option<Restaurant> {
        let index = self.restaurants.iter().position(|r| r.id() == Some(id))?;
        Some(self.restaurants.remove(index))
    }

    /// Removes the profile with the given id, if any profiles are recorded.
    pub fn remove_profile(&mut self, id: &str) -> Option<Profile> {
        let profiles = self.profiles.as_mut()?;
        let index = profiles.iter().position(|p| p.id() == id)?;
        Some(profiles.remove(index))
    }
}
