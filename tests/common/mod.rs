#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use foodgram_rs::{
    config::{DatabaseConfig, ServerConfig},
    create_app,
    handlers::{admin, api::ApiState},
    models::{
        sort_by_added, Ingredient, Recipe, RepositoryResult, Tag, User, UserListEntry,
        UserListKind,
    },
    observability::{BusinessTracingMiddleware, Metrics},
    repositories::{
        IngredientRepository, RecipeRepository, Repositories, TableManager, TagRepository,
        UserListRepository, UserRepository,
    },
};

pub const MEDIA_CDN_URL: &str = "https://media.example.com/";

// =============================================================================
// IN-MEMORY REPOSITORIES
// =============================================================================

#[derive(Default)]
pub struct InMemoryRecipeRepository {
    recipes: Mutex<HashMap<String, Recipe>>,
}

#[async_trait]
impl RecipeRepository for InMemoryRecipeRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Recipe>> {
        Ok(self.recipes.lock().unwrap().values().cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Recipe>> {
        Ok(self.recipes.lock().unwrap().get(id).cloned())
    }

    async fn find_by_author(&self, author_id: &str) -> RepositoryResult<Vec<Recipe>> {
        Ok(self
            .recipes
            .lock()
            .unwrap()
            .values()
            .filter(|recipe| recipe.author_id == author_id)
            .cloned()
            .collect())
    }

    async fn create(&self, recipe: Recipe) -> RepositoryResult<Recipe> {
        self.recipes
            .lock()
            .unwrap()
            .insert(recipe.id.clone(), recipe.clone());
        Ok(recipe)
    }

    async fn update(&self, recipe: Recipe) -> RepositoryResult<Recipe> {
        self.create(recipe).await
    }

    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        Ok(self.recipes.lock().unwrap().remove(id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryTagRepository {
    tags: Mutex<Vec<Tag>>,
}

#[async_trait]
impl TagRepository for InMemoryTagRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Tag>> {
        let mut tags = self.tags.lock().unwrap().clone();
        tags.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(tags)
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Tag>> {
        Ok(self
            .tags
            .lock()
            .unwrap()
            .iter()
            .find(|tag| tag.id == id)
            .cloned())
    }

    async fn create(&self, tag: Tag) -> RepositoryResult<Tag> {
        self.tags.lock().unwrap().push(tag.clone());
        Ok(tag)
    }
}

#[derive(Default)]
pub struct InMemoryIngredientRepository {
    ingredients: Mutex<Vec<Ingredient>>,
}

#[async_trait]
impl IngredientRepository for InMemoryIngredientRepository {
    async fn find_all(&self, name_prefix: Option<String>) -> RepositoryResult<Vec<Ingredient>> {
        let mut ingredients: Vec<Ingredient> = self
            .ingredients
            .lock()
            .unwrap()
            .iter()
            .filter(|ingredient| match &name_prefix {
                Some(prefix) => ingredient.matches_prefix(prefix),
                None => true,
            })
            .cloned()
            .collect();
        ingredients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ingredients)
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Ingredient>> {
        Ok(self
            .ingredients
            .lock()
            .unwrap()
            .iter()
            .find(|ingredient| ingredient.id == id)
            .cloned())
    }

    async fn create(&self, ingredient: Ingredient) -> RepositoryResult<Ingredient> {
        self.ingredients.lock().unwrap().push(ingredient.clone());
        Ok(ingredient)
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == id)
            .cloned())
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> RepositoryResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.email == email || user.username == username)
            .cloned())
    }

    async fn create(&self, user: User) -> RepositoryResult<User> {
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn exists(&self, id: &str) -> RepositoryResult<bool> {
        Ok(self.users.lock().unwrap().iter().any(|user| user.id == id))
    }
}

#[derive(Default)]
pub struct InMemoryUserListRepository {
    entries: Mutex<Vec<UserListEntry>>,
}

#[async_trait]
impl UserListRepository for InMemoryUserListRepository {
    async fn find_entries(
        &self,
        user_id: &str,
        kind: UserListKind,
    ) -> RepositoryResult<Vec<UserListEntry>> {
        let mut entries: Vec<UserListEntry> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.user_id == user_id && entry.kind == kind)
            .cloned()
            .collect();
        sort_by_added(&mut entries);
        Ok(entries)
    }

    async fn contains(
        &self,
        user_id: &str,
        kind: UserListKind,
        target_id: &str,
    ) -> RepositoryResult<bool> {
        Ok(self.entries.lock().unwrap().iter().any(|entry| {
            entry.user_id == user_id && entry.kind == kind && entry.target_id == target_id
        }))
    }

    async fn add_entry(&self, entry: UserListEntry) -> RepositoryResult<bool> {
        let mut entries = self.entries.lock().unwrap();
        if entries
            .iter()
            .any(|existing| existing.list_key() == entry.list_key() && existing.user_id == entry.user_id)
        {
            return Ok(false);
        }
        entries.push(entry);
        Ok(true)
    }

    async fn remove_entry(
        &self,
        user_id: &str,
        kind: UserListKind,
        target_id: &str,
    ) -> RepositoryResult<bool> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|entry| {
            !(entry.user_id == user_id && entry.kind == kind && entry.target_id == target_id)
        });
        Ok(entries.len() != before)
    }
}

// =============================================================================
// TEST APPLICATION
// =============================================================================

pub struct TestApp {
    pub router: Router,
    pub metrics: Arc<Metrics>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

/// DynamoDB client that is never reached; admin table setup is not exercised here
fn offline_dynamodb_client() -> aws_sdk_dynamodb::Client {
    let config = aws_sdk_dynamodb::Config::builder()
        .region(aws_sdk_dynamodb::config::Region::new("us-west-2"))
        .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
        .build();
    aws_sdk_dynamodb::Client::from_conf(config)
}

impl TestApp {
    pub fn new() -> Self {
        let repositories = Repositories {
            recipes: Arc::new(InMemoryRecipeRepository::default()),
            tags: Arc::new(InMemoryTagRepository::default()),
            ingredients: Arc::new(InMemoryIngredientRepository::default()),
            users: Arc::new(InMemoryUserRepository::default()),
            user_lists: Arc::new(InMemoryUserListRepository::default()),
        };

        let metrics = Arc::new(Metrics::new().unwrap());
        let tracing = Arc::new(BusinessTracingMiddleware::new(metrics.clone()));
        let api_state = ApiState::new(&repositories, tracing, MEDIA_CDN_URL);
        let admin_router = admin::create_admin_router(
            api_state.catalog_service.clone(),
            Arc::new(TableManager::new(Arc::new(offline_dynamodb_client()))),
            DatabaseConfig::default(),
        );

        let router = create_app(
            metrics.clone(),
            api_state,
            admin_router,
            &ServerConfig::default(),
        );

        Self { router, metrics }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => {
                let bytes = serde_json::to_vec(&body).unwrap();
                builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::CONTENT_LENGTH, bytes.len())
                    .body(Body::from(bytes))
                    .unwrap()
            }
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn post_empty(&self, uri: &str) -> TestResponse {
        self.request(Method::POST, uri, None).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    // -------------------------------------------------------------------------
    // Fixtures
    // -------------------------------------------------------------------------

    pub async fn seed_catalog(&self) {
        let response = self.post_empty("/api/admin/seed").await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.json());
    }

    pub async fn create_user(&self, username: &str) -> String {
        let response = self
            .post(
                "/api/users",
                serde_json::json!({
                    "email": format!("{}@example.com", username),
                    "username": username,
                    "first_name": "Test",
                    "last_name": "User",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.json());
        response.json()["id"].as_str().unwrap().to_string()
    }

    pub async fn tag_id(&self, slug: &str) -> String {
        let tags = self.get("/api/tags").await.json();
        tags.as_array()
            .unwrap()
            .iter()
            .find(|tag| tag["slug"] == slug)
            .and_then(|tag| tag["id"].as_str())
            .unwrap()
            .to_string()
    }

    pub async fn ingredient_id(&self, name: &str) -> String {
        let ingredients = self
            .get(&format!("/api/ingredients?name={}", name))
            .await
            .json();
        ingredients
            .as_array()
            .unwrap()
            .iter()
            .find(|ingredient| ingredient["name"] == name)
            .and_then(|ingredient| ingredient["id"].as_str())
            .unwrap()
            .to_string()
    }

    /// Publish a recipe tagged `breakfast` with the given catalog ingredients
    pub async fn create_recipe(
        &self,
        author_id: &str,
        name: &str,
        ingredients: &[(&str, u32)],
    ) -> String {
        let tag = self.tag_id("breakfast").await;
        let mut amounts = Vec::new();
        for (ingredient, amount) in ingredients {
            amounts.push(serde_json::json!({
                "id": self.ingredient_id(ingredient).await,
                "amount": amount,
            }));
        }

        let response = self
            .post(
                &format!("/api/users/{}/recipes", author_id),
                serde_json::json!({
                    "name": name,
                    "text": "Combine everything and cook.",
                    "image": "/media/recipes/dish.jpg",
                    "cooking_time": 20,
                    "tags": [tag],
                    "ingredients": amounts,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.json());
        response.json()["id"].as_str().unwrap().to_string()
    }
}
