use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::dynamodb::{dynamodb_span, get_s, map_dynamodb_error, s, scan_all, Item};
use crate::models::{Ingredient, RepositoryResult, Tag};

/// Data access for recipe tags
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// All tags ordered by slug
    async fn find_all(&self) -> RepositoryResult<Vec<Tag>>;

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Tag>>;

    async fn create(&self, tag: Tag) -> RepositoryResult<Tag>;
}

/// Data access for the ingredient catalog
#[async_trait]
pub trait IngredientRepository: Send + Sync {
    /// All ingredients ordered by name, optionally restricted to a name prefix
    async fn find_all(&self, name_prefix: Option<String>) -> RepositoryResult<Vec<Ingredient>>;

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Ingredient>>;

    async fn create(&self, ingredient: Ingredient) -> RepositoryResult<Ingredient>;
}

pub struct DynamoDbTagRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbTagRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn tag_to_item(&self, tag: &Tag) -> Item {
        let mut item = HashMap::new();
        item.insert("id".to_string(), s(&tag.id));
        item.insert("name".to_string(), s(&tag.name));
        item.insert("color".to_string(), s(&tag.color));
        item.insert("slug".to_string(), s(&tag.slug));
        item
    }

    pub fn item_to_tag(&self, item: &Item) -> RepositoryResult<Tag> {
        Ok(Tag {
            id: get_s(item, "id")?,
            name: get_s(item, "name")?,
            color: get_s(item, "color")?,
            slug: get_s(item, "slug")?,
        })
    }
}

#[async_trait]
impl TagRepository for DynamoDbTagRepository {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<Tag>> {
        let span = dynamodb_span("Scan", &self.table_name, &self.region);
        let items = scan_all(&self.client, &self.table_name)
            .instrument(span)
            .await?;

        let mut tags: Vec<Tag> = items
            .iter()
            .filter_map(|item| match self.item_to_tag(item) {
                Ok(tag) => Some(tag),
                Err(e) => {
                    warn!("Failed to parse tag item: {}", e);
                    None
                }
            })
            .collect();
        tags.sort_by(|a, b| a.slug.cmp(&b.slug));

        info!("Found {} tags", tags.len());
        Ok(tags)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Tag>> {
        let span = dynamodb_span("GetItem", &self.table_name, &self.region);
        let output = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("id", s(id))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(span)
        .await?;

        output.item.map(|item| self.item_to_tag(&item)).transpose()
    }

    #[instrument(skip(self, tag), fields(table = %self.table_name, slug = %tag.slug))]
    async fn create(&self, tag: Tag) -> RepositoryResult<Tag> {
        let span = dynamodb_span("PutItem", &self.table_name, &self.region);
        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(self.tag_to_item(&tag)))
                .condition_expression("attribute_not_exists(id)")
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(span)
        .await?;

        info!("Tag created");
        Ok(tag)
    }
}

pub struct DynamoDbIngredientRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbIngredientRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn ingredient_to_item(&self, ingredient: &Ingredient) -> Item {
        let mut item = HashMap::new();
        item.insert("id".to_string(), s(&ingredient.id));
        item.insert("name".to_string(), s(&ingredient.name));
        item.insert(
            "measurement_unit".to_string(),
            s(&ingredient.measurement_unit),
        );
        item
    }

    pub fn item_to_ingredient(&self, item: &Item) -> RepositoryResult<Ingredient> {
        Ok(Ingredient {
            id: get_s(item, "id")?,
            name: get_s(item, "name")?,
            measurement_unit: get_s(item, "measurement_unit")?,
        })
    }
}

#[async_trait]
impl IngredientRepository for DynamoDbIngredientRepository {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self, name_prefix: Option<String>) -> RepositoryResult<Vec<Ingredient>> {
        let span = dynamodb_span("Scan", &self.table_name, &self.region);
        let items = scan_all(&self.client, &self.table_name)
            .instrument(span)
            .await?;

        // Prefix matching is case-insensitive, which DynamoDB filters cannot express
        let mut ingredients: Vec<Ingredient> = items
            .iter()
            .filter_map(|item| match self.item_to_ingredient(item) {
                Ok(ingredient) => Some(ingredient),
                Err(e) => {
                    warn!("Failed to parse ingredient item: {}", e);
                    None
                }
            })
            .filter(|ingredient| {
                name_prefix
                    .as_deref()
                    .map_or(true, |prefix| ingredient.matches_prefix(prefix))
            })
            .collect();
        ingredients.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        info!("Found {} ingredients", ingredients.len());
        Ok(ingredients)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Ingredient>> {
        let span = dynamodb_span("GetItem", &self.table_name, &self.region);
        let output = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("id", s(id))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(span)
        .await?;

        output
            .item
            .map(|item| self.item_to_ingredient(&item))
            .transpose()
    }

    #[instrument(skip(self, ingredient), fields(table = %self.table_name, name = %ingredient.name))]
    async fn create(&self, ingredient: Ingredient) -> RepositoryResult<Ingredient> {
        let span = dynamodb_span("PutItem", &self.table_name, &self.region);
        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(self.ingredient_to_item(&ingredient)))
                .condition_expression("attribute_not_exists(id)")
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(span)
        .await?;

        info!("Ingredient created");
        Ok(ingredient)
    }
}
