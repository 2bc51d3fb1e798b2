//! Request handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::error::ApiError;
use super::extract::BearerCredential;
use crate::catalog::{Catalog, CatalogError};
use crate::models::{Profile, Restaurant};
use crate::store::DocumentStore;

/// Public reads may be cached briefly by browsers and proxies.
const PUBLIC_CACHE: &str = "public, max-age=60";

/// Application state shared across handlers
pub struct AppState<S> {
    pub catalog: Arc<Catalog<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
pub struct AuthRequest {
    password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    authenticated: bool,
    token: String,
}

/// Exchange the admin password for a bearer credential
pub async fn authenticate<S: DocumentStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(request) = payload?;

    let token = state
        .catalog
        .authenticate(&request.password)
        .map_err(|_| ApiError::InvalidPassword)?;

    Ok(Json(AuthResponse {
        authenticated: true,
        token,
    }))
}

/// The whole document: restaurants plus any recorded profiles
pub async fn get_restaurants<S: DocumentStore>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state
        .catalog
        .document()
        .await
        .map_err(ApiError::during("Failed to fetch restaurants"))?;

    Ok(([(header::CACHE_CONTROL, PUBLIC_CACHE)], Json(document)))
}

#[derive(Serialize)]
pub struct RestaurantCreated {
    success: bool,
    restaurant: Restaurant,
}

pub async fn create_restaurant<S: DocumentStore>(
    State(state): State<AppState<S>>,
    BearerCredential(credential): BearerCredential,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RestaurantCreated>, ApiError> {
    // Bad credentials win over a bad body
    state
        .catalog
        .authorize(&credential)
        .map_err(ApiError::during("Failed to add restaurant"))?;
    let Json(record) = payload?;

    let restaurant = state
        .catalog
        .add_restaurant(record, &credential)
        .await
        .map_err(ApiError::during("Failed to add restaurant"))?;

    Ok(Json(RestaurantCreated {
        success: true,
        restaurant,
    }))
}

#[derive(Serialize)]
pub struct Deleted<T> {
    success: bool,
    deleted: T,
}

pub async fn delete_restaurant<S: DocumentStore>(
    State(state): State<AppState<S>>,
    BearerCredential(credential): BearerCredential,
    Path(id): Path<String>,
) -> Result<Json<Deleted<Restaurant>>, ApiError> {
    let result = match id.parse::<i64>() {
        Ok(id) => state.catalog.delete_restaurant(id, &credential).await,
        // Restaurant ids are integers, so nothing can match
        Err(_) => state
            .catalog
            .authorize(&credential)
            .and(Err(CatalogError::NotFound {
                kind: "Restaurant",
                id,
            })),
    };

    let deleted = result.map_err(ApiError::during("Failed to delete restaurant"))?;
    Ok(Json(Deleted {
        success: true,
        deleted,
    }))
}

#[derive(Serialize)]
pub struct ProfilesResponse {
    profiles: Vec<Profile>,
}

pub async fn get_profiles<S: DocumentStore>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, ApiError> {
    let profiles = state
        .catalog
        .list_profiles()
        .await
        .map_err(ApiError::during("Failed to fetch profiles"))?;

    Ok((
        [(header::CACHE_CONTROL, PUBLIC_CACHE)],
        Json(ProfilesResponse { profiles }),
    ))
}

#[derive(Serialize)]
pub struct ProfileCreated {
    success: bool,
    profile: Profile,
}

pub async fn create_profile<S: DocumentStore>(
    State(state): State<AppState<S>>,
    BearerCredential(credential): BearerCredential,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProfileCreated>, ApiError> {
    state
        .catalog
        .authorize(&credential)
        .map_err(ApiError::during("Failed to add profile"))?;
    let Json(record) = payload?;

    let profile = state
        .catalog
        .add_profile(record, &credential)
        .await
        .map_err(ApiError::during("Failed to add profile"))?;

    Ok(Json(ProfileCreated {
        success: true,
        profile,
    }))
}

pub async fn delete_profile<S: DocumentStore>(
    State(state): State<AppState<S>>,
    BearerCredential(credential): BearerCredential,
    Path(id): Path<String>,
) -> Result<Json<Deleted<Profile>>, ApiError> {
    let deleted = state
        .catalog
        .delete_profile(&id, &credential)
        .await
        .map_err(ApiError::during("Failed to delete profile"))?;

    Ok(Json(Deleted {
        success: true,
        deleted,
    }))
}
