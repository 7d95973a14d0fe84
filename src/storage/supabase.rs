//! Supabase backend, spoken over the project's PostgREST interface.
//!
//! Filters use PostgREST operators (`id=eq.5`) and every mutation asks for
//! `return=representation` so the affected rows come back in the reply.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::domain::{Animal, AnimalPatch, NewAnimal};
use crate::error::{StoreError, StoreResult};
use crate::storage::AnimalStore;

const RETURN_REPRESENTATION: &str = "return=representation";

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// Animal store backed by a Supabase table.
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl SupabaseStore {
    /// Create a client for `{base_url}/rest/v1/{table}`.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        table: &str,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            api_key: api_key.into(),
        })
    }

    fn request(&self, method: reqwest::Method) -> RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn id_filter(id: &str) -> String {
        format!("eq.{}", id)
    }

    async fn rows(response: Response) -> StoreResult<Vec<Animal>> {
        let response = Self::check(response).await?;
        Ok(response.json::<Vec<Animal>>().await?)
    }

    async fn check(response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::debug!(status = %status, error = %message, "Datastore rejected request");
        Err(StoreError::Query(message))
    }
}

/// Extract the PostgREST `message`, or fall back to the raw status and body.
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<PostgrestError>(body) {
        Ok(err) => {
            tracing::trace!(
                code = ?err.code,
                details = ?err.details,
                hint = ?err.hint,
                "PostgREST error"
            );
            err.message
        }
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => format!("{}: {}", status, body.trim()),
    }
}

#[async_trait]
impl AnimalStore for SupabaseStore {
    async fn list(&self) -> StoreResult<Vec<Animal>> {
        let response = self
            .request(reqwest::Method::GET)
            .query(&[("select", "*")])
            .send()
            .await?;

        Self::rows(response).await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Vec<Animal>> {
        let response = self
            .request(reqwest::Method::GET)
            .query(&[("select", "*".to_string()), ("id", Self::id_filter(id))])
            .send()
            .await?;

        Self::rows(response).await
    }

    async fn insert(&self, animal: &NewAnimal) -> StoreResult<Vec<Animal>> {
        let response = self
            .request(reqwest::Method::POST)
            .query(&[("select", "*")])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(animal)
            .send()
            .await?;

        Self::rows(response).await
    }

    async fn update(&self, id: &str, patch: &AnimalPatch) -> StoreResult<Vec<Animal>> {
        let response = self
            .request(reqwest::Method::PATCH)
            .query(&[("id", Self::id_filter(id)), ("select", "*".to_string())])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(patch)
            .send()
            .await?;

        Self::rows(response).await
    }

    async fn delete(&self, id: &str) -> StoreResult<Vec<Animal>> {
        let response = self
            .request(reqwest::Method::DELETE)
            .query(&[("id", Self::id_filter(id)), ("select", "*".to_string())])
            .header("Prefer", RETURN_REPRESENTATION)
            .send()
            .await?;

        Self::rows(response).await
    }

    async fn ping(&self) -> StoreResult<()> {
        let response = self
            .request(reqwest::Method::GET)
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "supabase"
    }
}
