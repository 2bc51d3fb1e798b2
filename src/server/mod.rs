//! HTTP API for the restaurant picker.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check
//! - `POST /auth`: Exchange the admin password for a bearer credential
//! - `GET /restaurants`: Full document (public)
//! - `POST /restaurants`: Add a restaurant (auth required)
//! - `DELETE /restaurants/{id}`: Remove a restaurant (auth required)
//! - `GET /profiles`: Profile list (public)
//! - `POST /profiles`: Add a profile (auth required)
//! - `DELETE /profiles/{id}`: Remove a profile (auth required)
//!
//! Every response, errors included, allows any origin. `OPTIONS` on any
//! path answers the CORS preflight.

pub mod error;
pub mod extract;
pub mod routes;

pub use error::ApiError;
pub use routes::AppState;

use axum::{
    http::{header, Method},
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::catalog::Catalog;
use crate::store::DocumentStore;

/// Builds the application router over `catalog`.
pub fn router<S: DocumentStore>(catalog: Arc<Catalog<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(routes::health))
        .route("/auth", post(routes::authenticate::<S>))
        .route(
            "/restaurants",
            get(routes::get_restaurants::<S>).post(routes::create_restaurant::<S>),
        )
        .route("/restaurants/{id}", delete(routes::delete_restaurant::<S>))
        .route(
            "/profiles",
            get(routes::get_profiles::<S>).post(routes::create_profile::<S>),
        )
        .route("/profiles/{id}", delete(routes::delete_profile::<S>))
        .with_state(AppState { catalog })
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Serves the API on `port` until Ctrl+C or SIGTERM.
pub async fn serve<S: DocumentStore>(catalog: Arc<Catalog<S>>, port: u16) -> std::io::Result<()> {
    let app = router(catalog);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Starting server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::models::{Document, Profile, Restaurant, ServiceType};
    use crate::store::{MemoryStore, Snapshot, StoreError, VersionToken, WriteAck};
    use axum::{
        body::Body,
        http::{HeaderMap, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const SECRET: &str = "hunter2";

    fn seeded_document() -> Document {
        let mut doc = Document::default();
        doc.restaurants.push(
            Restaurant::new(1, "Pho Place")
                .with_food_types(vec!["vietnamese".into()])
                .with_service_types(vec![ServiceType::DineIn]),
        );
        doc
    }

    fn setup() -> (Router, Arc<Catalog<MemoryStore>>) {
        let store = MemoryStore::new(&seeded_document()).unwrap();
        let catalog = Arc::new(Catalog::new(store, Credentials::new(SECRET)));
        (router(catalog.clone()), catalog)
    }

    fn bearer(catalog: &Catalog<MemoryStore>) -> String {
        format!("Bearer {}", catalog.authenticate(SECRET).unwrap())
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn bare_request(method: &str, uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn allows_any_origin(headers: &HeaderMap) -> bool {
        headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_some_and(|v| v == "*")
    }

    #[tokio::test]
    async fn test_auth_valid_password() {
        let (app, catalog) = setup();

        let (status, headers, body) = send(
            &app,
            json_request("POST", "/auth", None, json!({"password": SECRET})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(allows_any_origin(&headers));
        assert_eq!(body["authenticated"], true);
        let token = body["token"].as_str().unwrap();
        assert!(catalog.authorize(token).is_ok());
    }

    #[tokio::test]
    async fn test_auth_invalid_password() {
        let (app, _catalog) = setup();

        let (status, headers, body) = send(
            &app,
            json_request("POST", "/auth", None, json!({"password": "wrong-password"})),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(allows_any_origin(&headers));
        assert_eq!(body["error"], "Invalid password");
        assert!(body.get("authenticated").is_none());
    }

    #[tokio::test]
    async fn test_auth_malformed_body() {
        let (app, _catalog) = setup();

        let request = Request::builder()
            .method("POST")
            .uri("/auth")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("invalid json"))
            .unwrap();
        let (status, _headers, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn test_preflight() {
        let (app, _catalog) = setup();

        for uri in ["/auth", "/restaurants", "/restaurants/1", "/profiles/veg"] {
            let request = Request::builder()
                .method("OPTIONS")
                .uri(uri)
                .header(header::ORIGIN, "https://picker.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                .body(Body::empty())
                .unwrap();
            let (status, headers, body) = send(&app, request).await;

            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert!(allows_any_origin(&headers));
            let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
            assert!(methods.contains("DELETE"));
            let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
                .to_str()
                .unwrap()
                .to_lowercase();
            assert!(allowed.contains("authorization"));
            assert!(allowed.contains("content-type"));
            assert_eq!(body, Value::Null);
        }
    }

    #[tokio::test]
    async fn test_get_restaurants() {
        let (app, _catalog) = setup();

        let (status, headers, body) = send(&app, bare_request("GET", "/restaurants", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(allows_any_origin(&headers));
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=60");
        assert_eq!(body["restaurants"][0]["name"], "Pho Place");
        assert_eq!(body["restaurants"][0]["serviceTypes"], json!(["dine-in"]));
        assert!(body.get("profiles").is_none());
    }

    #[tokio::test]
    async fn test_create_restaurant_requires_auth() {
        let (app, catalog) = setup();
        let body = json!({"id": 2, "name": "Cafe", "foodTypes": [], "serviceTypes": []});

        let (status, headers, response) =
            send(&app, json_request("POST", "/restaurants", None, body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(allows_any_origin(&headers));
        assert_eq!(response["error"], "Unauthorized");

        let forged = format!("Bearer {}", crate::auth::encode_credential("nope", chrono::Utc::now()));
        let (status, _, _) = send(
            &app,
            json_request("POST", "/restaurants", Some(&forged), body),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        assert!(catalog.store().history().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_restaurant() {
        let (app, catalog) = setup();
        let auth = bearer(&catalog);

        let (status, _headers, body) = send(
            &app,
            json_request(
                "POST",
                "/restaurants",
                Some(&auth),
                json!({
                    "id": 2,
                    "name": "Taco Stand",
                    "foodTypes": ["mexican"],
                    "serviceTypes": ["takeout", "dine-in"],
                    "profiles": ["all"],
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["restaurant"]["name"], "Taco Stand");
        assert_eq!(catalog.list_restaurants().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_restaurant_without_id() {
        let (app, catalog) = setup();
        let auth = bearer(&catalog);
        let body = json!({"name": "Taco", "foodTypes": ["mexican"], "serviceTypes": ["takeout"]});

        let (status, _, response) =
            send(&app, json_request("POST", "/restaurants", Some(&auth), body.clone())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["restaurant"], body);
        assert_eq!(catalog.list_restaurants().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_legacy_records_pass_through() {
        let seed = json!({
            "restaurants": [
                {"id": 1, "name": "Pho Place", "foodTypes": [], "serviceTypes": ["dine-in"]},
                {"name": "Legacy", "serviceTypes": ["curbside"]},
            ],
        });
        let store = MemoryStore::from_bytes(serde_json::to_vec(&seed).unwrap());
        let catalog = Arc::new(Catalog::new(store, Credentials::new(SECRET)));
        let auth = bearer(&catalog);
        let app = router(catalog);

        let (status, _, body) = send(&app, bare_request("GET", "/restaurants", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, seed);

        let (status, _, _) = send(&app, bare_request("GET", "/profiles", None)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) =
            send(&app, bare_request("DELETE", "/restaurants/1", Some(&auth))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"]["name"], "Pho Place");
    }

    #[tokio::test]
    async fn test_create_restaurant_invalid_input() {
        let (app, catalog) = setup();
        let auth = bearer(&catalog);

        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/restaurants",
                Some(&auth),
                json!({"id": 2, "name": "Jet Food", "foodTypes": [], "serviceTypes": ["flying"]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid service types: flying");

        let (status, _, body) = send(
            &app,
            json_request("POST", "/restaurants", Some(&auth), json!({"name": "Nameless"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields");
    }

    #[tokio::test]
    async fn test_delete_restaurant() {
        let (app, catalog) = setup();
        let auth = bearer(&catalog);

        let (status, _, body) =
            send(&app, bare_request("DELETE", "/restaurants/1", Some(&auth))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["deleted"]["name"], "Pho Place");

        for uri in ["/restaurants/9999", "/restaurants/abc"] {
            let (status, headers, body) = send(&app, bare_request("DELETE", uri, Some(&auth))).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert!(allows_any_origin(&headers));
            assert_eq!(body["error"], "Restaurant not found");
        }

        let (status, _, _) = send(&app, bare_request("DELETE", "/restaurants/abc", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_profiles_end_to_end() {
        let (app, catalog) = setup();
        let auth = bearer(&catalog);

        let (status, _, body) = send(&app, bare_request("GET", "/profiles", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profiles"], json!([{"id": "all", "name": "All Restaurants"}]));

        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/profiles",
                Some(&auth),
                json!({"id": "veg", "name": "Vegetarian"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"], json!({"id": "veg", "name": "Vegetarian"}));

        let (_, _, body) = send(&app, bare_request("GET", "/profiles", None)).await;
        assert_eq!(
            body["profiles"],
            json!([
                {"id": "all", "name": "All Restaurants"},
                {"id": "veg", "name": "Vegetarian"},
            ])
        );

        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/profiles",
                Some(&auth),
                json!({"id": "veg", "name": "Veggie"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Profile with this ID already exists");

        let (status, _, body) = send(&app, bare_request("DELETE", "/profiles/veg", Some(&auth))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"]["id"], "veg");
    }

    #[tokio::test]
    async fn test_delete_protected_and_missing_profiles() {
        let (app, catalog) = setup();
        let auth = bearer(&catalog);

        let (status, _, body) = send(&app, bare_request("DELETE", "/profiles/all", Some(&auth))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Cannot delete the default \"All Restaurants\" profile"
        );

        let (status, _, body) =
            send(&app, bare_request("DELETE", "/profiles/ghost", Some(&auth))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Profile not found");

        assert!(catalog.store().history().await.is_empty());
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _catalog) = setup();
        let (status, _, body) = send(&app, bare_request("GET", "/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_store_failure_is_500() {
        let store = MemoryStore::from_bytes(b"not json".to_vec());
        let app = router(Arc::new(Catalog::new(store, Credentials::new(SECRET))));

        let (status, headers, body) = send(&app, bare_request("GET", "/profiles", None)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(allows_any_origin(&headers));
        assert!(headers.get(header::CACHE_CONTROL).is_none());
        assert_eq!(body["error"], "Failed to fetch profiles");
        assert!(body["details"]
            .as_str()
            .unwrap()
            .starts_with("Stored document is corrupt"));
    }

    /// Store whose document always changes between read and write.
    struct RacingStore(MemoryStore);

    impl DocumentStore for RacingStore {
        async fn read(&self) -> Result<Snapshot, StoreError> {
            self.0.read().await
        }

        async fn write(
            &self,
            _document: &Document,
            version: &VersionToken,
            _message: &str,
        ) -> Result<WriteAck, StoreError> {
            Err(StoreError::VersionConflict(version.clone()))
        }
    }

    #[tokio::test]
    async fn test_version_conflict_surfaces() {
        let store = RacingStore(MemoryStore::new(&seeded_document()).unwrap());
        let catalog = Arc::new(Catalog::new(store, Credentials::new(SECRET)));
        let auth = format!("Bearer {}", catalog.authenticate(SECRET).unwrap());
        let app = router(catalog.clone());

        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/profiles",
                Some(&auth),
                json!({"id": "veg", "name": "Vegetarian"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to add profile");
        assert!(body["details"].as_str().unwrap().contains("reload and retry"));
        assert_eq!(
            catalog.list_profiles().await.unwrap(),
            vec![Profile::default_profile()]
        );
    }
}
