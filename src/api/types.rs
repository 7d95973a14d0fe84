//! API request and response types.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Animal;

// ==================== Animals ====================

/// Response for listing animals.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListAnimalsResponse {
    /// Every row of the table.
    pub value: Vec<Animal>,
}

/// Response for fetching one animal.
///
/// The match is returned as an array even though ids are unique.
#[derive(Debug, Serialize, ToSchema)]
pub struct GetAnimalResponse {
    pub animal: Vec<Animal>,
}

/// Response for create, update and delete.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnimalMutationResponse {
    /// Human readable outcome.
    pub message: String,
    /// The row as created, updated, or as it was before deletion.
    pub value: Animal,
}

impl AnimalMutationResponse {
    pub fn new(message: &str, value: Animal) -> Self {
        Self {
            message: message.to_string(),
            value,
        }
    }
}

// ==================== Health ====================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Datastore backend in use.
    pub backend: String,
    /// Datastore connectivity.
    pub datastore: String,
    /// Timestamp.
    pub timestamp: String,
}
