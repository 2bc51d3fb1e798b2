//! Restaurant and profile operations over the stored document.
//!
//! Every mutating operation checks the caller's credential, validates its
//! input, then runs one read → mutate → write cycle against the store.
//! Operations are independent: nothing spans two calls, and a
//! [`StoreError::VersionConflict`] is returned to the caller rather than
//! retried, since the whole operation has to be re-run on fresh data.

use serde_json::Value;
use thiserror::Error;

use crate::auth::{AuthError, Credentials};
use crate::models::{Document, Profile, Restaurant, ValidationError, DEFAULT_PROFILE_ID};
use crate::store::{DocumentStore, Snapshot, StoreError};

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Missing or invalid credential.
    #[error("Unauthorized")]
    Unauthorized,
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),
    #[error("{kind} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} with this ID already exists")]
    Conflict { kind: &'static str, id: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthError> for CatalogError {
    fn from(_: AuthError) -> Self {
        CatalogError::Unauthorized
    }
}

/// Restaurant and profile collections stored in one document.
#[derive(Debug)]
pub struct Catalog<S> {
    store: S,
    credentials: Credentials,
}

impl<S: DocumentStore> Catalog<S> {
    pub fn new(store: S, credentials: Credentials) -> Self {
        Self { store, credentials }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Exchanges the admin secret for a bearer credential.
    pub fn authenticate(&self, secret: &str) -> Result<String, AuthError> {
        self.credentials.authenticate(secret)
    }

    /// Fails with [`CatalogError::Unauthorized`] unless `credential` is valid.
    pub fn authorize(&self, credential: &str) -> Result<(), CatalogError> {
        if self.credentials.verify(credential) {
            Ok(())
        } else {
            Err(CatalogError::Unauthorized)
        }
    }

    /// The full stored document.
    pub async fn document(&self) -> Result<Document, CatalogError> {
        Ok(self.store.read().await?.document)
    }

    pub async fn list_restaurants(&self) -> Result<Vec<Restaurant>, CatalogError> {
        Ok(self.document().await?.restaurants)
    }

    /// Validates `record` and appends it to the restaurant list.
    ///
    /// Restaurant ids are assigned by the caller and may be left out. A
    /// duplicate id is stored as submitted and only reported in the log.
    pub async fn add_restaurant(
        &self,
        record: Value,
        credential: &str,
    ) -> Result<Restaurant, CatalogError> {
        self.authorize(credential)?;
        let restaurant = Restaurant::from_value(record)?;

        let Snapshot {
            mut document,
            version,
        } = self.store.read().await?;

        if let Some(id) = restaurant.id() {
            if document.find_restaurant(id).is_some() {
                tracing::warn!(id, "Restaurant id already in use, storing duplicate");
            }
        }
        document.restaurants.push(restaurant.clone());

        self.store
            .write(
                &document,
                &version,
                &format!("Add restaurant: {}", restaurant.name()),
            )
            .await?;

        tracing::info!(id = ?restaurant.id(), "Added restaurant {}", restaurant.name());
        Ok(restaurant)
    }

    /// Removes the restaurant with `id` and returns it.
    pub async fn delete_restaurant(
        &self,
        id: i64,
        credential: &str,
    ) -> Result<Restaurant, CatalogError> {
        self.authorize(credential)?;

        let Snapshot {
            mut document,
            version,
        } = self.store.read().await?;

        let deleted = document
            .remove_restaurant(id)
            .ok_or_else(|| CatalogError::NotFound {
                kind: "Restaurant",
                id: id.to_string(),
            })?;

        self.store
            .write(
                &document,
                &version,
                &format!("Delete restaurant: {}", deleted.name()),
            )
            .await?;

        tracing::info!(id, "Deleted restaurant {}", deleted.name());
        Ok(deleted)
    }

    /// Recorded profiles, or just the default `all` profile if none are.
    pub async fn list_profiles(&self) -> Result<Vec<Profile>, CatalogError> {
        Ok(self.document().await?.profiles_or_default())
    }

    /// Validates `record` and appends it to the profile list.
    pub async fn add_profile(&self, record: Value, credential: &str) -> Result<Profile, CatalogError> {
        self.authorize(credential)?;
        let profile = Profile::from_value(record)?;

        let Snapshot {
            mut document,
            version,
        } = self.store.read().await?;

        let profiles = document.profiles_mut();
        if profiles.iter().any(|p| p.id() == profile.id()) {
            return Err(CatalogError::Conflict {
                kind: "Profile",
                id: profile.id().to_string(),
            });
        }
        profiles.push(profile.clone());

        self.store
            .write(
                &document,
                &version,
                &format!("Add profile: {}", profile.name()),
            )
            .await?;

        tracing::info!(id = profile.id(), "Added profile {}", profile.name());
        Ok(profile)
    }

    /// Removes the profile with `id` and returns it. The default profile
    /// can never be removed.
    pub async fn delete_profile(&self, id: &str, credential: &str) -> Result<Profile, CatalogError> {
        self.authorize(credential)?;

        if id == DEFAULT_PROFILE_ID {
            return Err(ValidationError::ProtectedProfile.into());
        }

        let Snapshot {
            mut document,
            version,
        } = self.store.read().await?;

        let deleted = document
            .remove_profile(id)
            .ok_or_else(|| CatalogError::NotFound {
                kind: "Profile",
                id: id.to_string(),
            })?;

        self.store
            .write(
                &document,
                &version,
                &format!("Delete profile: {}", deleted.name()),
            )
            .await?;

        tracing::info!(id, "Deleted profile {}", deleted.name());
        Ok(deleted)
    }
}
