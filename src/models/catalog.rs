use serde::{Deserialize, Serialize};

use super::generate_id;

/// Recipe tag, e.g. "Breakfast"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// Ingredient with the unit its amounts are measured in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub measurement_unit: String,
}

impl Tag {
    pub fn new(request: CreateTagRequest) -> Self {
        Self {
            id: generate_id('T'),
            name: request.name.trim().to_string(),
            color: request.color.to_uppercase(),
            slug: request.slug.trim().to_string(),
        }
    }
}

impl Ingredient {
    pub fn new(request: CreateIngredientRequest) -> Self {
        Self {
            id: generate_id('I'),
            name: request.name.trim().to_string(),
            measurement_unit: request.measurement_unit.trim().to_string(),
        }
    }

    /// Case-insensitive prefix match used by the ingredient search box
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.name
            .to_lowercase()
            .starts_with(&prefix.trim().to_lowercase())
    }
}
