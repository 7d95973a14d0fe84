//! Storage layer for the Animals API.
//!
//! Handlers only see [`AnimalStore`]. Two backends implement it: the managed
//! Supabase project reached over its REST interface, and a local SQLite
//! database via SQLx.

mod models;
mod sqlite;
mod supabase;

use async_trait::async_trait;

use crate::domain::{Animal, AnimalPatch, NewAnimal};
use crate::error::StoreResult;

pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

/// Table-scoped access to the animals datastore.
///
/// Every mutation returns the affected rows, so callers can tell "nothing
/// matched" apart from success. `id` is the raw path segment; backends reject
/// values that are not integers.
#[async_trait]
pub trait AnimalStore: Send + Sync {
    /// All rows, unfiltered.
    async fn list(&self) -> StoreResult<Vec<Animal>>;

    /// Rows whose id equals `id` (zero or one).
    async fn find_by_id(&self, id: &str) -> StoreResult<Vec<Animal>>;

    /// Insert one row and return it as stored.
    async fn insert(&self, animal: &NewAnimal) -> StoreResult<Vec<Animal>>;

    /// Apply `patch` to rows matching `id` and return them as updated.
    async fn update(&self, id: &str, patch: &AnimalPatch) -> StoreResult<Vec<Animal>>;

    /// Delete rows matching `id` and return them as they were.
    async fn delete(&self, id: &str) -> StoreResult<Vec<Animal>>;

    /// Cheap connectivity probe.
    async fn ping(&self) -> StoreResult<()>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
