//! SQLite backend for local development and tests.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;

use crate::domain::{Animal, AnimalPatch, NewAnimal};
use crate::error::{StoreError, StoreResult};
use crate::storage::models::{into_animals, AnimalRow};
use crate::storage::AnimalStore;

const COLUMNS: &str = "id, name, cientific_name, description, images, country";

/// Animal store backed by a SQLite pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    table: String,
}

/// A validated column assignment from an update body.
#[derive(Debug)]
enum Assignment {
    Integer(&'static str, i64),
    Text(&'static str, String),
}

impl SqliteStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: SqlitePool, table: impl Into<String>) -> StoreResult<Self> {
        let table = table.into();
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(StoreError::Query(format!("invalid table name '{}'", table)));
        }
        Ok(Self { pool, table })
    }

    /// Connect to `url` and make sure the table exists.
    ///
    /// In-memory databases are per connection, so they get a single
    /// connection that is never recycled.
    pub async fn connect(url: &str, table: &str) -> StoreResult<Self> {
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(url)
                .await?
        } else {
            SqlitePoolOptions::new().connect(url).await?
        };

        let store = Self::new(pool, table)?;
        store.init_schema().await?;
        Ok(store)
    }

    /// Initialize the database schema.
    pub async fn init_schema(&self) -> StoreResult<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                cientific_name TEXT NOT NULL,
                description TEXT NOT NULL,
                images TEXT NOT NULL,
                country TEXT NOT NULL
            )
            "#,
            self.table
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn assignments(&self, patch: &AnimalPatch) -> StoreResult<Vec<Assignment>> {
        patch
            .fields()
            .map(|(key, value)| self.assignment(key, value))
            .collect()
    }

    fn assignment(&self, key: &str, value: &Value) -> StoreResult<Assignment> {
        let column: &'static str = match key {
            "id" => "id",
            "name" => "name",
            "cientific_name" => "cientific_name",
            "description" => "description",
            "images" => "images",
            "country" => "country",
            other => {
                return Err(StoreError::Query(format!(
                    "Could not find the '{}' column of '{}' in the schema cache",
                    other, self.table
                )))
            }
        };

        if value.is_null() {
            return Err(StoreError::Query(format!(
                "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                column, self.table
            )));
        }

        let invalid = |expected: &str| {
            StoreError::Query(format!(
                "invalid input syntax for type {}: {}",
                expected, value
            ))
        };

        match column {
            "id" => value
                .as_i64()
                .map(|id| Assignment::Integer(column, id))
                .ok_or_else(|| invalid("bigint")),
            "images" => {
                let images: Vec<String> =
                    serde_json::from_value(value.clone()).map_err(|_| invalid("text[]"))?;
                Ok(Assignment::Text(column, serde_json::to_string(&images)?))
            }
            _ => value
                .as_str()
                .map(|s| Assignment::Text(column, s.to_string()))
                .ok_or_else(|| invalid("text")),
        }
    }
}

fn parse_id(id: &str) -> StoreResult<i64> {
    id.trim().parse::<i64>().map_err(|_| {
        StoreError::Query(format!("invalid input syntax for type bigint: \"{}\"", id))
    })
}

#[async_trait]
impl AnimalStore for SqliteStore {
    async fn list(&self) -> StoreResult<Vec<Animal>> {
        let rows = sqlx::query_as::<_, AnimalRow>(&format!(
            "SELECT {} FROM {} ORDER BY id",
            COLUMNS, self.table
        ))
        .fetch_all(&self.pool)
        .await?;

        into_animals(rows)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Vec<Animal>> {
        let id = parse_id(id)?;

        let rows = sqlx::query_as::<_, AnimalRow>(&format!(
            "SELECT {} FROM {} WHERE id = ?",
            COLUMNS, self.table
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        into_animals(rows)
    }

    async fn insert(&self, animal: &NewAnimal) -> StoreResult<Vec<Animal>> {
        // A NULL id lets SQLite assign the next rowid.
        let rows = sqlx::query_as::<_, AnimalRow>(&format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
            self.table, COLUMNS, COLUMNS
        ))
        .bind(animal.id)
        .bind(&animal.name)
        .bind(&animal.cientific_name)
        .bind(&animal.description)
        .bind(serde_json::to_string(&animal.images)?)
        .bind(&animal.country)
        .fetch_all(&self.pool)
        .await?;

        into_animals(rows)
    }

    async fn update(&self, id: &str, patch: &AnimalPatch) -> StoreResult<Vec<Animal>> {
        let id = parse_id(id)?;
        let assignments = self.assignments(patch)?;

        if assignments.is_empty() {
            return self.find_by_id(&id.to_string()).await;
        }

        let mut builder = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", self.table));
        {
            let mut separated = builder.separated(", ");
            for assignment in assignments {
                match assignment {
                    Assignment::Integer(column, value) => {
                        separated.push(format!("{} = ", column));
                        separated.push_bind_unseparated(value);
                    }
                    Assignment::Text(column, value) => {
                        separated.push(format!("{} = ", column));
                        separated.push_bind_unseparated(value);
                    }
                }
            }
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {}", COLUMNS));

        let rows = builder
            .build_query_as::<AnimalRow>()
            .fetch_all(&self.pool)
            .await?;

        into_animals(rows)
    }

    async fn delete(&self, id: &str) -> StoreResult<Vec<Animal>> {
        let id = parse_id(id)?;

        let rows = sqlx::query_as::<_, AnimalRow>(&format!(
            "DELETE FROM {} WHERE id = ? RETURNING {}",
            self.table, COLUMNS
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        into_animals(rows)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
