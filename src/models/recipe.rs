use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{generate_id, IngredientLine, Tag, UserResponse};

/// Published recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub author_id: String,
    pub name: String,
    pub text: String,
    pub image: Option<String>,
    pub cooking_time: u32,
    pub tags: Vec<String>,
    pub ingredients: Vec<RecipeIngredient>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ingredient amount within a recipe.
///
/// Name and unit are copied from the ingredient catalog when the recipe is
/// written so a recipe can be expanded without extra lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub ingredient_id: String,
    pub name: String,
    pub measurement_unit: String,
    pub amount: u32,
}

/// Ingredient reference in a create/update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAmount {
    pub id: String,
    pub amount: u32,
}

/// Request model for publishing a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecipeRequest {
    pub name: String,
    pub text: String,
    pub image: Option<String>,
    pub cooking_time: u32,
    pub tags: Vec<String>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Partial update; tags and ingredients are replaced wholesale when present
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<u32>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

/// Filters for the recipe feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeFilters {
    /// Tag slugs; a recipe matches if it carries any of them
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub viewer: Option<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// Full recipe view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeResponse {
    pub id: String,
    pub author: UserResponse,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: u32,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact view returned by favorite/cart actions and subscription previews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeShortResponse {
    pub id: String,
    pub name: String,
    pub image: String,
    pub cooking_time: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeListResponse {
    pub recipes: Vec<RecipeResponse>,
    pub total_count: usize,
    pub page: u32,
    pub page_size: u32,
}

impl Recipe {
    /// Create a new recipe from a request whose ingredient ids were already resolved
    pub fn new(
        author_id: &str,
        request: CreateRecipeRequest,
        ingredients: Vec<RecipeIngredient>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id('R'),
            author_id: author_id.to_string(),
            name: request.name.trim().to_string(),
            text: request.text,
            image: request.image,
            cooking_time: request.cooking_time,
            tags: request.tags,
            ingredients,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply scalar fields and tags of an update; ingredients are passed resolved
    pub fn update(
        &mut self,
        request: UpdateRecipeRequest,
        ingredients: Option<Vec<RecipeIngredient>>,
    ) {
        if let Some(name) = request.name {
            self.name = name.trim().to_string();
        }
        if let Some(text) = request.text {
            self.text = text;
        }
        if let Some(image) = request.image {
            self.image = Some(image);
        }
        if let Some(cooking_time) = request.cooking_time {
            self.cooking_time = cooking_time;
        }
        if let Some(tags) = request.tags {
            self.tags = tags;
        }
        if let Some(ingredients) = ingredients {
            self.ingredients = ingredients;
        }
        self.updated_at = Utc::now();
    }

    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author_id == user_id
    }

    pub fn has_any_tag(&self, tag_ids: &[String]) -> bool {
        self.tags.iter().any(|tag| tag_ids.contains(tag))
    }

    /// Explode the recipe into the lines consumed by shopping list aggregation
    pub fn ingredient_lines(&self) -> Vec<IngredientLine> {
        self.ingredients
            .iter()
            .map(|ingredient| IngredientLine {
                name: ingredient.name.clone(),
                measurement_unit: ingredient.measurement_unit.clone(),
                amount: ingredient.amount,
            })
            .collect()
    }

    pub fn image_url(&self, media_cdn_url: &str) -> String {
        match &self.image {
            Some(image_path) => {
                if media_cdn_url.is_empty() {
                    image_path.clone()
                } else {
                    let cdn_url = media_cdn_url.trim_end_matches('/');
                    format!("{}/{}", cdn_url, image_path.trim_start_matches('/'))
                }
            }
            None => String::new(),
        }
    }

    /// Full view; viewer flags start false and are filled in by the caller
    pub fn to_response(
        &self,
        author: UserResponse,
        tags: Vec<Tag>,
        media_cdn_url: &str,
    ) -> RecipeResponse {
        RecipeResponse {
            id: self.id.clone(),
            author,
            name: self.name.clone(),
            text: self.text.clone(),
            image: self.image_url(media_cdn_url),
            cooking_time: self.cooking_time,
            tags,
            ingredients: self.ingredients.clone(),
            is_favorited: false,
            is_in_shopping_cart: false,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn to_short_response(&self, media_cdn_url: &str) -> RecipeShortResponse {
        RecipeShortResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            image: self.image_url(media_cdn_url),
            cooking_time: self.cooking_time,
        }
    }
}

/// Newest first; ties broken by id so paging is stable
pub fn sort_newest_first(recipes: &mut [Recipe]) {
    recipes.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_request() -> CreateRecipeRequest {
        CreateRecipeRequest {
            name: "Pancakes".to_string(),
            text: "Mix and fry.".to_string(),
            image: Some("recipes/pancakes.jpg".to_string()),
            cooking_time: 20,
            tags: vec!["T1".to_string()],
            ingredients: vec![IngredientAmount {
                id: "I1".to_string(),
                amount: 200,
            }],
        }
    }

    fn flour(amount: u32) -> RecipeIngredient {
        RecipeIngredient {
            ingredient_id: "I1".to_string(),
            name: "Flour".to_string(),
            measurement_unit: "g".to_string(),
            amount,
        }
    }

    #[test]
    fn test_recipe_creation() {
        let recipe = Recipe::new("U1", create_test_request(), vec![flour(200)]);

        assert!(recipe.id.starts_with('R'));
        assert!(recipe.is_authored_by("U1"));
        assert!(!recipe.is_authored_by("U2"));
        assert_eq!(recipe.created_at, recipe.updated_at);
        assert_eq!(
            recipe.ingredient_lines(),
            vec![IngredientLine::new("Flour", "g", 200)]
        );
    }

    #[test]
    fn test_recipe_update() {
        let mut recipe = Recipe::new("U1", create_test_request(), vec![flour(200)]);
        let original_updated_at = recipe.updated_at;

        std::thread::sleep(std::time::Duration::from_millis(1));

        recipe.update(
            UpdateRecipeRequest {
                cooking_time: Some(25),
                tags: Some(vec!["T2".to_string(), "T3".to_string()]),
                ..Default::default()
            },
            Some(vec![flour(250)]),
        );

        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(recipe.cooking_time, 25);
        assert!(recipe.has_any_tag(&["T3".to_string()]));
        assert!(!recipe.has_any_tag(&["T1".to_string()]));
        assert_eq!(recipe.ingredients[0].amount, 250);
        assert!(recipe.updated_at > original_updated_at);
    }

    #[test]
    fn test_image_url_generation() {
        let mut recipe = Recipe::new("U1", create_test_request(), vec![flour(200)]);

        assert_eq!(
            recipe.image_url("https://media.example.com/"),
            "https://media.example.com/recipes/pancakes.jpg"
        );
        assert_eq!(
            recipe.image_url("https://d1234567890.cloudfront.net/media"),
            "https://d1234567890.cloudfront.net/media/recipes/pancakes.jpg"
        );
        assert_eq!(recipe.image_url(""), "recipes/pancakes.jpg");

        recipe.image = None;
        assert_eq!(recipe.image_url("https://media.example.com"), "");

        let short = recipe.to_short_response("https://media.example.com");
        assert_eq!(short.image, "");
        assert_eq!(short.cooking_time, 20);
    }

    #[test]
    fn test_sort_newest_first() {
        let mut older = Recipe::new("U1", create_test_request(), vec![flour(1)]);
        let newer = Recipe::new("U1", create_test_request(), vec![flour(2)]);
        older.created_at = newer.created_at - Duration::minutes(5);

        let mut recipes = vec![older.clone(), newer.clone()];
        sort_newest_first(&mut recipes);

        assert_eq!(recipes[0].id, newer.id);
        assert_eq!(recipes[1].id, older.id);
    }

    #[test]
    fn test_serde_serialization() {
        let recipe = Recipe::new("U1", create_test_request(), vec![flour(200)]);

        let json = serde_json::to_string(&recipe).unwrap();
        let deserialized: Recipe = serde_json::from_str(&json).unwrap();

        assert_eq!(recipe, deserialized);
    }
}
