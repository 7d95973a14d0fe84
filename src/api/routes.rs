//! Route definitions for the API.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::error::{ErrorResponse, INTERNAL_ERROR_MESSAGE};
use crate::AppState;

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_animals,
        handlers::get_animal,
        handlers::create_animal,
        handlers::update_animal,
        handlers::delete_animal,
        handlers::health_check,
    ),
    components(schemas(
        crate::api::types::ListAnimalsResponse,
        crate::api::types::GetAnimalResponse,
        crate::api::types::AnimalMutationResponse,
        crate::api::types::HealthResponse,
        crate::domain::Animal,
        crate::domain::NewAnimal,
        crate::domain::AnimalPatch,
        crate::error::ErrorResponse,
    )),
    tags(
        (name = "animals", description = "Animal resource endpoints"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "Animals API",
        version = "0.1.0",
        description = "REST API over the animals table of a managed datastore",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        // Animals
        .route(
            "/animals",
            get(handlers::list_animals).post(handlers::create_animal),
        )
        .route(
            "/animals/:id",
            get(handlers::get_animal)
                .put(handlers::update_animal)
                .delete(handlers::delete_animal),
        )
        // Health
        .route("/health", get(handlers::health_check))
        .with_state(state)
        // OpenAPI docs
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Last-resort handler: anything that escaped a handler becomes a logged 500.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(error = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: INTERNAL_ERROR_MESSAGE.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::{Animal, AnimalPatch, NewAnimal};
    use crate::error::{StoreError, StoreResult};
    use crate::storage::{AnimalStore, SqliteStore};

    async fn sqlite_app() -> Router {
        let store = SqliteStore::connect("sqlite::memory:", "animals")
            .await
            .expect("Failed to create test database");
        build_router(AppState {
            store: Arc::new(store),
        })
    }

    /// Store that misbehaves the same way on every call.
    enum BrokenStore {
        Rejecting,
        Garbled,
        Panicking,
        InsertsNothing,
    }

    #[async_trait]
    impl AnimalStore for BrokenStore {
        async fn list(&self) -> StoreResult<Vec<Animal>> {
            self.fail()
        }
        async fn find_by_id(&self, _id: &str) -> StoreResult<Vec<Animal>> {
            self.fail()
        }
        async fn insert(&self, _animal: &NewAnimal) -> StoreResult<Vec<Animal>> {
            self.fail()
        }
        async fn update(&self, _id: &str, _patch: &AnimalPatch) -> StoreResult<Vec<Animal>> {
            self.fail()
        }
        async fn delete(&self, _id: &str) -> StoreResult<Vec<Animal>> {
            self.fail()
        }
        async fn ping(&self) -> StoreResult<()> {
            Err(StoreError::Transport("connection refused".to_string()))
        }
        fn backend(&self) -> &'static str {
            "broken"
        }
    }

    impl BrokenStore {
        fn fail(&self) -> StoreResult<Vec<Animal>> {
            match self {
                BrokenStore::Rejecting => Err(StoreError::Query(
                    "permission denied for table animals".to_string(),
                )),
                BrokenStore::Garbled => Err(StoreError::Decode("expected array".to_string())),
                BrokenStore::Panicking => panic!("datastore client blew up"),
                BrokenStore::InsertsNothing => Ok(Vec::new()),
            }
        }
    }

    fn broken_app(store: BrokenStore) -> Router {
        build_router(AppState {
            store: Arc::new(store),
        })
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn ocelot(id: i64) -> Value {
        json!({
            "id": id,
            "name": "Ocelot",
            "cientific_name": "Leopardus pardalis",
            "description": "Spotted wild cat",
            "images": ["https://img.example/ocelot-1.png", "https://img.example/ocelot-2.png"],
            "country": "Mexico"
        })
    }

    #[tokio::test]
    async fn test_create_then_get_returns_single_element_array() {
        let app = sqlite_app().await;

        let (status, body) = send(&app, Method::POST, "/animals", Some(ocelot(1))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Animal created successfully");
        assert_eq!(body["value"], ocelot(1));

        let (status, body) = send(&app, Method::GET, "/animals/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["animal"], json!([ocelot(1)]));
    }

    #[tokio::test]
    async fn test_create_without_id_gets_assigned_one() {
        let app = sqlite_app().await;

        let mut animal = ocelot(0);
        animal.as_object_mut().unwrap().remove("id");

        let (status, body) = send(&app, Method::POST, "/animals", Some(animal)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["value"]["id"].as_i64().is_some());
    }

    #[tokio::test]
    async fn test_create_with_incomplete_body_is_bad_request() {
        let app = sqlite_app().await;

        let (status, body) =
            send(&app, Method::POST, "/animals", Some(json!({"name": "Ocelot"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("cientific_name"));
    }

    #[tokio::test]
    async fn test_create_duplicate_id_is_bad_request() {
        let app = sqlite_app().await;

        send(&app, Method::POST, "/animals", Some(ocelot(4))).await;
        let (status, body) = send(&app, Method::POST, "/animals", Some(ocelot(4))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("UNIQUE"));
    }

    #[tokio::test]
    async fn test_list_wraps_rows_in_value() {
        let app = sqlite_app().await;

        let (status, body) = send(&app, Method::GET, "/animals", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"value": []}));

        send(&app, Method::POST, "/animals", Some(ocelot(1))).await;
        send(&app, Method::POST, "/animals", Some(ocelot(2))).await;

        let (_, body) = send(&app, Method::GET, "/animals", None).await;
        assert_eq!(body["value"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let app = sqlite_app().await;

        let (status, body) = send(&app, Method::GET, "/animals/999999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Animal not found for this ID"}));
    }

    #[tokio::test]
    async fn test_get_non_numeric_id_is_bad_request() {
        let app = sqlite_app().await;

        let (status, body) = send(&app, Method::GET, "/animals/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "invalid input syntax for type bigint: \"abc\""
        );
    }

    #[tokio::test]
    async fn test_update_changes_only_given_fields() {
        let app = sqlite_app().await;
        send(&app, Method::POST, "/animals", Some(ocelot(7))).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/animals/7",
            Some(json!({"name": "New Name"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Animal updated successfully");
        assert_eq!(body["value"]["name"], "New Name");
        assert_eq!(body["value"]["cientific_name"], "Leopardus pardalis");
        assert_eq!(body["value"]["images"], ocelot(7)["images"]);
    }

    #[tokio::test]
    async fn test_update_unknown_column_is_bad_request() {
        let app = sqlite_app().await;
        send(&app, Method::POST, "/animals", Some(ocelot(7))).await;

        let (status, body) =
            send(&app, Method::PUT, "/animals/7", Some(json!({"legs": 4}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("'legs'"));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let app = sqlite_app().await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/animals/999999",
            Some(json!({"name": "Ghost"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Animal not found for this ID");
    }

    #[tokio::test]
    async fn test_update_with_non_object_body_is_bad_request() {
        let app = sqlite_app().await;
        send(&app, Method::POST, "/animals", Some(ocelot(7))).await;

        let (status, _) = send(&app, Method::PUT, "/animals/7", Some(json!(["name"]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_returns_prior_row_then_not_found() {
        let app = sqlite_app().await;
        send(&app, Method::POST, "/animals", Some(ocelot(9))).await;

        let (status, body) = send(&app, Method::DELETE, "/animals/9", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Animal deleted successfully");
        assert_eq!(body["value"], ocelot(9));

        let (status, _) = send(&app, Method::GET, "/animals/9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, "/animals/9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_store_rejection_is_bad_request_with_message() {
        let app = broken_app(BrokenStore::Rejecting);

        for (method, uri, body) in [
            (Method::GET, "/animals/1", None),
            (Method::POST, "/animals", Some(ocelot(1))),
            (Method::PUT, "/animals/1", Some(json!({"name": "x"}))),
            (Method::DELETE, "/animals/1", None),
        ] {
            let (status, body) = send(&app, method, uri, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "permission denied for table animals");
        }
    }

    #[tokio::test]
    async fn test_list_failure_is_internal_error() {
        let app = broken_app(BrokenStore::Rejecting);

        let (status, body) = send(&app, Method::GET, "/animals", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn test_garbled_store_reply_is_internal_error() {
        let app = broken_app(BrokenStore::Garbled);

        let (status, body) = send(&app, Method::GET, "/animals/1", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_empty_insert_is_create_failed() {
        let app = broken_app(BrokenStore::InsertsNothing);

        let (status, body) = send(&app, Method::POST, "/animals", Some(ocelot(1))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to create animal");
    }

    #[tokio::test]
    async fn test_panic_is_caught_as_internal_error() {
        let app = broken_app(BrokenStore::Panicking);

        let (status, body) = send(&app, Method::GET, "/animals/1", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_health_reports_datastore() {
        let (status, body) = send(&sqlite_app().await, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["backend"], "sqlite");
        assert_eq!(body["datastore"], "connected");

        let (status, body) =
            send(&broken_app(BrokenStore::Rejecting), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["datastore"], "error: connection refused");
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let app = sqlite_app().await;

        let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/animals/{id}"].is_object());
    }
}
