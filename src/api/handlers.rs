//! HTTP request handlers.
//!
//! Every handler returns [`ApiResult`]; the 400/404/500 decisions are the
//! explicit `Err` branches below.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::types::*;
use crate::domain::{AnimalPatch, NewAnimal};
use crate::error::{ApiError, ApiResult, ErrorResponse};
use crate::AppState;

/// List every animal.
///
/// GET /animals
#[utoipa::path(
    get,
    path = "/animals",
    responses(
        (status = 200, description = "All animals", body = ListAnimalsResponse),
        (status = 500, description = "Datastore failure", body = ErrorResponse)
    ),
    tag = "animals"
)]
pub async fn list_animals(State(state): State<AppState>) -> ApiResult<Json<ListAnimalsResponse>> {
    // No structured 400 here: any datastore failure is a server error.
    let animals = state
        .store
        .list()
        .await
        .map_err(|e| ApiError::Internal(format!("listing animals: {}", e)))?;

    tracing::debug!(count = animals.len(), "Listed animals");

    Ok(Json(ListAnimalsResponse { value: animals }))
}

/// Fetch one animal by id.
///
/// GET /animals/{id}
#[utoipa::path(
    get,
    path = "/animals/{id}",
    params(
        ("id" = i64, Path, description = "Animal ID")
    ),
    responses(
        (status = 200, description = "Matching animal, as a one-element array", body = GetAnimalResponse),
        (status = 400, description = "Datastore rejected the query", body = ErrorResponse),
        (status = 404, description = "Animal not found", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "animals"
)]
pub async fn get_animal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<GetAnimalResponse>> {
    require_id(&id)?;

    let animal = state.store.find_by_id(&id).await?;
    if animal.is_empty() {
        return Err(ApiError::not_found());
    }

    Ok(Json(GetAnimalResponse { animal }))
}

/// Create an animal.
///
/// POST /animals
#[utoipa::path(
    post,
    path = "/animals",
    request_body = NewAnimal,
    responses(
        (status = 201, description = "Animal created", body = AnimalMutationResponse),
        (status = 400, description = "Invalid body or datastore error", body = ErrorResponse),
        (status = 500, description = "Insert returned no row", body = ErrorResponse)
    ),
    tag = "animals"
)]
pub async fn create_animal(
    State(state): State<AppState>,
    payload: Result<Json<NewAnimal>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AnimalMutationResponse>)> {
    let Json(animal) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let created = state
        .store
        .insert(&animal)
        .await?
        .into_iter()
        .next()
        .ok_or(ApiError::CreateFailed)?;

    tracing::info!(animal_id = created.id, name = %created.name, "Animal created");

    Ok((
        StatusCode::CREATED,
        Json(AnimalMutationResponse::new(
            "Animal created successfully",
            created,
        )),
    ))
}

/// Update some fields of an animal.
///
/// PUT /animals/{id}
#[utoipa::path(
    put,
    path = "/animals/{id}",
    params(
        ("id" = i64, Path, description = "Animal ID")
    ),
    request_body = AnimalPatch,
    responses(
        (status = 200, description = "Animal updated", body = AnimalMutationResponse),
        (status = 400, description = "Invalid body or datastore error", body = ErrorResponse),
        (status = 404, description = "Animal not found", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "animals"
)]
pub async fn update_animal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AnimalPatch>, JsonRejection>,
) -> ApiResult<Json<AnimalMutationResponse>> {
    require_id(&id)?;
    let Json(patch) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let updated = state
        .store
        .update(&id, &patch)
        .await?
        .into_iter()
        .next()
        .ok_or_else(ApiError::not_found)?;

    tracing::info!(
        animal_id = updated.id,
        fields = patch.0.len(),
        "Animal updated"
    );

    Ok(Json(AnimalMutationResponse::new(
        "Animal updated successfully",
        updated,
    )))
}

/// Delete an animal.
///
/// DELETE /animals/{id}
#[utoipa::path(
    delete,
    path = "/animals/{id}",
    params(
        ("id" = i64, Path, description = "Animal ID")
    ),
    responses(
        (status = 200, description = "Animal deleted, with its prior data", body = AnimalMutationResponse),
        (status = 400, description = "Datastore rejected the query", body = ErrorResponse),
        (status = 404, description = "Animal not found", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "animals"
)]
pub async fn delete_animal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AnimalMutationResponse>> {
    require_id(&id)?;

    let deleted = state
        .store
        .delete(&id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(ApiError::not_found)?;

    tracing::info!(animal_id = deleted.id, "Animal deleted");

    Ok(Json(AnimalMutationResponse::new(
        "Animal deleted successfully",
        deleted,
    )))
}

/// Health check endpoint.
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let datastore = match state.store.ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.store.backend().to_string(),
        datastore,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// Routing never yields an empty segment, but the check stays at the boundary.
fn require_id(id: &str) -> ApiResult<()> {
    if id.trim().is_empty() {
        return Err(ApiError::BadRequest("ID is required".to_string()));
    }
    Ok(())
}
