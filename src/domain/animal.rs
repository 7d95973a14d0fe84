//! Animal domain types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// A row of the `animals` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Animal {
    /// Unique identifier.
    pub id: i64,

    /// Common name.
    pub name: String,

    /// Scientific name. The column keeps the spelling of the upstream schema.
    pub cientific_name: String,

    /// Free-form description.
    pub description: String,

    /// Image URLs, in display order.
    pub images: Vec<String>,

    /// Country of origin.
    pub country: String,
}

/// Body of a create request.
///
/// `id` may be omitted, in which case the datastore assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewAnimal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub cientific_name: String,
    pub description: String,
    pub images: Vec<String>,
    pub country: String,
}

/// Body of an update request: any subset of columns, forwarded to the
/// datastore without filtering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct AnimalPatch(pub Map<String, Value>);

impl AnimalPatch {
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}
