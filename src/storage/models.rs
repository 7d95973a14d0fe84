//! Database models for the SQLite backend.
//!
//! These are the row types returned by SQLx queries.

use sqlx::FromRow;

use crate::domain::Animal;
use crate::error::StoreError;

/// Database row for the animals table. `images` is stored as a JSON array.
#[derive(Debug, Clone, FromRow)]
pub struct AnimalRow {
    pub id: i64,
    pub name: String,
    pub cientific_name: String,
    pub description: String,
    pub images: String,
    pub country: String,
}

impl TryFrom<AnimalRow> for Animal {
    type Error = StoreError;

    fn try_from(row: AnimalRow) -> Result<Self, Self::Error> {
        Ok(Animal {
            id: row.id,
            name: row.name,
            cientific_name: row.cientific_name,
            description: row.description,
            images: serde_json::from_str(&row.images)?,
            country: row.country,
        })
    }
}

/// Convert a batch of rows, failing on the first malformed one.
pub fn into_animals(rows: Vec<AnimalRow>) -> Result<Vec<Animal>, StoreError> {
    rows.into_iter().map(Animal::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let row = AnimalRow {
            id: 7,
            name: "Capybara".to_string(),
            cientific_name: "Hydrochoerus hydrochaeris".to_string(),
            description: "Largest living rodent".to_string(),
            images: r#"["a.png","b.png"]"#.to_string(),
            country: "Venezuela".to_string(),
        };

        let animal = Animal::try_from(row).unwrap();
        assert_eq!(animal.id, 7);
        assert_eq!(animal.images, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_row_with_bad_images_is_decode_error() {
        let row = AnimalRow {
            id: 1,
            name: "x".to_string(),
            cientific_name: "x".to_string(),
            description: "x".to_string(),
            images: "not json".to_string(),
            country: "x".to_string(),
        };

        assert!(matches!(
            Animal::try_from(row),
            Err(StoreError::Decode(_))
        ));
    }
}
