use async_trait::async_trait;
use aws_sdk_dynamodb::operation::RequestId;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument};

use super::dynamodb::{
    dynamodb_span, get_datetime, get_n, get_opt_s, get_s, get_string_list, map_dynamodb_error,
    missing, n, s, scan_all, Item,
};
use crate::models::{Recipe, RecipeIngredient, RepositoryResult};

/// Trait defining the interface for recipe data access operations
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Find every recipe
    async fn find_all(&self) -> RepositoryResult<Vec<Recipe>>;

    /// Find a recipe by its ID
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Recipe>>;

    /// Find recipes by author using the author GSI
    async fn find_by_author(&self, author_id: &str) -> RepositoryResult<Vec<Recipe>>;

    /// Create a new recipe
    async fn create(&self, recipe: Recipe) -> RepositoryResult<Recipe>;

    /// Replace an existing recipe
    async fn update(&self, recipe: Recipe) -> RepositoryResult<Recipe>;

    /// Delete a recipe, returning whether it existed
    async fn delete(&self, id: &str) -> RepositoryResult<bool>;
}

/// DynamoDB implementation of the RecipeRepository trait
pub struct DynamoDbRecipeRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    author_index: String,
    region: String,
}

impl DynamoDbRecipeRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            author_index: "AuthorIndex".to_string(),
            region,
        }
    }

    fn create_dynamodb_span(&self, operation: &str) -> tracing::Span {
        dynamodb_span(operation, &self.table_name, &self.region)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn author_index(&self) -> &str {
        &self.author_index
    }

    /// Convert a Recipe to DynamoDB attribute values
    pub fn recipe_to_item(&self, recipe: &Recipe) -> Item {
        let mut item = HashMap::new();

        item.insert("id".to_string(), s(&recipe.id));
        item.insert("author_id".to_string(), s(&recipe.author_id));
        item.insert("name".to_string(), s(&recipe.name));
        item.insert("text".to_string(), s(&recipe.text));
        if let Some(ref image) = recipe.image {
            item.insert("image".to_string(), s(image));
        }
        item.insert("cooking_time".to_string(), n(recipe.cooking_time));
        item.insert(
            "tags".to_string(),
            AttributeValue::L(recipe.tags.iter().map(s).collect()),
        );

        let ingredients = recipe
            .ingredients
            .iter()
            .map(|ingredient| {
                let mut map = HashMap::new();
                map.insert("ingredient_id".to_string(), s(&ingredient.ingredient_id));
                map.insert("name".to_string(), s(&ingredient.name));
                map.insert(
                    "measurement_unit".to_string(),
                    s(&ingredient.measurement_unit),
                );
                map.insert("amount".to_string(), n(ingredient.amount));
                AttributeValue::M(map)
            })
            .collect();
        item.insert("ingredients".to_string(), AttributeValue::L(ingredients));

        item.insert("created_at".to_string(), s(recipe.created_at.to_rfc3339()));
        item.insert("updated_at".to_string(), s(recipe.updated_at.to_rfc3339()));

        item
    }

    /// Convert DynamoDB attribute values to a Recipe
    pub fn item_to_recipe(&self, item: Item) -> RepositoryResult<Recipe> {
        let ingredients = item
            .get("ingredients")
            .and_then(|v| v.as_l().ok())
            .ok_or_else(|| missing("ingredients"))?
            .iter()
            .map(|value| {
                let map = value.as_m().map_err(|_| missing("ingredients"))?;
                Ok(RecipeIngredient {
                    ingredient_id: get_s(map, "ingredient_id")?,
                    name: get_s(map, "name")?,
                    measurement_unit: get_s(map, "measurement_unit")?,
                    amount: get_n(map, "amount")?,
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        let created_at = get_datetime(&item, "created_at")?;
        let updated_at = get_datetime(&item, "updated_at").unwrap_or(created_at);

        Ok(Recipe {
            id: get_s(&item, "id")?,
            author_id: get_s(&item, "author_id")?,
            name: get_s(&item, "name")?,
            text: get_s(&item, "text")?,
            image: get_opt_s(&item, "image"),
            cooking_time: get_n(&item, "cooking_time")?,
            tags: get_string_list(&item, "tags"),
            ingredients,
            created_at,
            updated_at,
        })
    }

    fn items_to_recipes(&self, items: Vec<Item>) -> Vec<Recipe> {
        let mut recipes = Vec::with_capacity(items.len());
        for item in items {
            match self.item_to_recipe(item) {
                Ok(recipe) => recipes.push(recipe),
                Err(e) => {
                    warn!("Failed to parse recipe item: {}", e);
                    continue;
                }
            }
        }
        recipes
    }
}

#[async_trait]
impl RecipeRepository for DynamoDbRecipeRepository {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<Recipe>> {
        info!("Scanning all recipes");

        let scan_span = self.create_dynamodb_span("Scan");

        let items = scan_all(&self.client, &self.table_name)
            .instrument(scan_span)
            .await?;

        let recipes = self.items_to_recipes(items);
        info!("Found {} recipes", recipes.len());
        Ok(recipes)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Recipe>> {
        info!("Finding recipe by ID");

        let get_span = self.create_dynamodb_span("GetItem");

        let response = async {
            let result = self
                .client
                .get_item()
                .table_name(&self.table_name)
                .key("id", s(id))
                .send()
                .await;

            match &result {
                Ok(output) => {
                    tracing::Span::current().record("http.status_code", 200);
                    if let Some(request_id) = output.request_id() {
                        tracing::Span::current().record("aws.request_id", request_id);
                    }
                }
                Err(e) => {
                    tracing::Span::current().record("http.status_code", 400);
                    error!("DynamoDB GetItem failed: {}", e);
                }
            }

            result.map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => Ok(Some(self.item_to_recipe(item)?)),
            None => {
                info!("Recipe not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self), fields(table = %self.table_name, author_id = %author_id))]
    async fn find_by_author(&self, author_id: &str) -> RepositoryResult<Vec<Recipe>> {
        info!("Finding recipes by author using GSI");

        let query_span = self.create_dynamodb_span("Query");

        let items = async {
            let mut items = Vec::new();
            let mut start_key = None;
            loop {
                let output = self
                    .client
                    .query()
                    .table_name(&self.table_name)
                    .index_name(&self.author_index)
                    .key_condition_expression("author_id = :author_id")
                    .expression_attribute_values(":author_id", s(author_id))
                    .scan_index_forward(false)
                    .set_exclusive_start_key(start_key)
                    .send()
                    .await
                    .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))?;

                items.extend(output.items.unwrap_or_default());
                match output.last_evaluated_key {
                    Some(key) if !key.is_empty() => start_key = Some(key),
                    _ => break,
                }
            }
            RepositoryResult::Ok(items)
        }
        .instrument(query_span)
        .await?;

        let recipes = self.items_to_recipes(items);
        info!("Found {} recipes for author", recipes.len());
        Ok(recipes)
    }

    #[instrument(skip(self, recipe), fields(table = %self.table_name, id = %recipe.id))]
    async fn create(&self, recipe: Recipe) -> RepositoryResult<Recipe> {
        info!("Creating new recipe");

        let item = self.recipe_to_item(&recipe);
        let put_span = self.create_dynamodb_span("PutItem");

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .condition_expression("attribute_not_exists(id)")
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(put_span)
        .await?;

        info!("Recipe created successfully");
        Ok(recipe)
    }

    #[instrument(skip(self, recipe), fields(table = %self.table_name, id = %recipe.id))]
    async fn update(&self, recipe: Recipe) -> RepositoryResult<Recipe> {
        info!("Updating recipe");

        let item = self.recipe_to_item(&recipe);
        let put_span = self.create_dynamodb_span("PutItem");

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .condition_expression("attribute_exists(id)")
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(put_span)
        .await?;

        info!("Recipe updated successfully");
        Ok(recipe)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        info!("Deleting recipe");

        let delete_span = self.create_dynamodb_span("DeleteItem");

        let output = async {
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .key("id", s(id))
                .return_values(ReturnValue::AllOld)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(delete_span)
        .await?;

        let existed = output.attributes.is_some_and(|attributes| !attributes.is_empty());
        info!(existed, "Recipe delete finished");
        Ok(existed)
    }
}
