// Repositories module - data access layer

pub mod catalog_repository;
mod dynamodb;
pub mod recipe_repository;
pub mod table_manager;
pub mod user_list_repository;
pub mod user_repository;

pub use catalog_repository::{
    DynamoDbIngredientRepository, DynamoDbTagRepository, IngredientRepository, TagRepository,
};
pub use recipe_repository::{DynamoDbRecipeRepository, RecipeRepository};
pub use table_manager::{foodgram_tables, TableManager, TableSpec};
pub use user_list_repository::{DynamoDbUserListRepository, UserListRepository};
pub use user_repository::{DynamoDbUserRepository, UserRepository};

use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::sync::Arc;

use crate::config::DatabaseConfig;

/// One handle per table, shared by the services
#[derive(Clone)]
pub struct Repositories {
    pub recipes: Arc<dyn RecipeRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub ingredients: Arc<dyn IngredientRepository>,
    pub users: Arc<dyn UserRepository>,
    pub user_lists: Arc<dyn UserListRepository>,
}

impl Repositories {
    /// DynamoDB-backed repositories for the configured tables
    pub fn dynamodb(client: Arc<DynamoDbClient>, database: &DatabaseConfig) -> Self {
        let region = database.region.clone();
        Self {
            recipes: Arc::new(DynamoDbRecipeRepository::new(
                client.clone(),
                database.recipes_table_name.clone(),
                region.clone(),
            )),
            tags: Arc::new(DynamoDbTagRepository::new(
                client.clone(),
                database.tags_table_name.clone(),
                region.clone(),
            )),
            ingredients: Arc::new(DynamoDbIngredientRepository::new(
                client.clone(),
                database.ingredients_table_name.clone(),
                region.clone(),
            )),
            users: Arc::new(DynamoDbUserRepository::new(
                client.clone(),
                database.users_table_name.clone(),
                region.clone(),
            )),
            user_lists: Arc::new(DynamoDbUserListRepository::new(
                client,
                database.user_lists_table_name.clone(),
                region,
            )),
        }
    }
}
