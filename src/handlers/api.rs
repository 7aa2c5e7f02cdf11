use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::models::{Ingredient, Pagination, RepositoryError, ServiceError, Tag};
use crate::observability::BusinessTracingMiddleware;
use crate::repositories::Repositories;
use crate::services::{
    CatalogService, CollectionService, RecipeService, ShoppingListService, UserService,
};

use super::{recipes, shopping_cart, users};

/// Shared state for the public API
#[derive(Clone)]
pub struct ApiState {
    pub catalog_service: Arc<CatalogService>,
    pub recipe_service: Arc<RecipeService>,
    pub user_service: Arc<UserService>,
    pub collection_service: Arc<CollectionService>,
    pub shopping_list_service: Arc<ShoppingListService>,
}

impl ApiState {
    /// Wire every service over one set of repositories
    pub fn new(
        repositories: &Repositories,
        tracing: Arc<BusinessTracingMiddleware>,
        media_cdn_url: &str,
    ) -> Self {
        let Repositories {
            recipes,
            tags,
            ingredients,
            users,
            user_lists,
        } = repositories.clone();

        Self {
            catalog_service: Arc::new(CatalogService::new(tags.clone(), ingredients.clone())),
            recipe_service: Arc::new(RecipeService::new(
                recipes.clone(),
                tags,
                ingredients,
                users.clone(),
                user_lists.clone(),
                tracing.clone(),
                media_cdn_url.to_string(),
            )),
            user_service: Arc::new(UserService::new(
                users.clone(),
                user_lists.clone(),
                recipes.clone(),
                tracing.clone(),
                media_cdn_url.to_string(),
            )),
            collection_service: Arc::new(CollectionService::new(
                users.clone(),
                recipes.clone(),
                user_lists.clone(),
                tracing.clone(),
                media_cdn_url.to_string(),
            )),
            shopping_list_service: Arc::new(ShoppingListService::new(
                users, recipes, user_lists, tracing,
            )),
        }
    }
}

pub type ApiError = (StatusCode, Json<Value>);
pub type ApiResult<T> = Result<T, ApiError>;

/// `?page=&limit=` on list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn pagination(&self) -> ApiResult<Pagination> {
        Pagination::new(self.page, self.limit)
            .map_err(|err| service_error_to_response(err.into()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IngredientSearchQuery {
    pub name: Option<String>,
}

/// Public API routes
pub fn create_api_router(state: ApiState) -> Router {
    Router::new()
        // Catalog
        .route("/api/tags", get(list_tags))
        .route("/api/tags/:tag_id", get(get_tag))
        .route("/api/ingredients", get(list_ingredients))
        .route("/api/ingredients/:ingredient_id", get(get_ingredient))
        // Recipes
        .route("/api/recipes", get(recipes::list_recipes))
        .route("/api/recipes/:recipe_id", get(recipes::get_recipe))
        .route("/api/users/:user_id/recipes", post(recipes::create_recipe))
        .route(
            "/api/users/:user_id/recipes/:recipe_id",
            delete(recipes::delete_recipe).patch(recipes::update_recipe),
        )
        // Users and subscriptions
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/:user_id", get(users::get_user))
        .route(
            "/api/users/:user_id/subscriptions",
            get(users::list_subscriptions),
        )
        .route(
            "/api/users/:user_id/subscriptions/:author_id",
            post(users::subscribe).delete(users::unsubscribe),
        )
        // Favorites and shopping cart
        .route(
            "/api/users/:user_id/favorites/:recipe_id",
            post(shopping_cart::add_favorite).delete(shopping_cart::remove_favorite),
        )
        .route(
            "/api/users/:user_id/shopping-cart",
            get(shopping_cart::list_shopping_cart),
        )
        .route(
            "/api/users/:user_id/shopping-cart/summary",
            get(shopping_cart::shopping_list_summary),
        )
        .route(
            "/api/users/:user_id/shopping-cart/download",
            get(shopping_cart::download_shopping_list),
        )
        .route(
            "/api/users/:user_id/shopping-cart/:recipe_id",
            post(shopping_cart::add_to_shopping_cart)
                .delete(shopping_cart::remove_from_shopping_cart),
        )
        .with_state(state)
}

// =============================================================================
// CATALOG ENDPOINTS
// =============================================================================

#[instrument(name = "list_tags", skip(state))]
pub async fn list_tags(State(state): State<ApiState>) -> ApiResult<Json<Vec<Tag>>> {
    state
        .catalog_service
        .list_tags()
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "get_tag", skip(state), fields(tag_id = %tag_id))]
pub async fn get_tag(
    State(state): State<ApiState>,
    Path(tag_id): Path<String>,
) -> ApiResult<Json<Tag>> {
    state
        .catalog_service
        .get_tag(&tag_id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "list_ingredients", skip(state), fields(name = query.name.as_deref()))]
pub async fn list_ingredients(
    State(state): State<ApiState>,
    Query(query): Query<IngredientSearchQuery>,
) -> ApiResult<Json<Vec<Ingredient>>> {
    match state.catalog_service.list_ingredients(query.name).await {
        Ok(ingredients) => {
            info!("Returning {} ingredients", ingredients.len());
            Ok(Json(ingredients))
        }
        Err(err) => {
            error!("Failed to list ingredients: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

#[instrument(name = "get_ingredient", skip(state), fields(ingredient_id = %ingredient_id))]
pub async fn get_ingredient(
    State(state): State<ApiState>,
    Path(ingredient_id): Path<String>,
) -> ApiResult<Json<Ingredient>> {
    state
        .catalog_service
        .get_ingredient(&ingredient_id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

/// Map a service error to a status code and `{"error", "timestamp"}` body
pub fn service_error_to_response(err: ServiceError) -> ApiError {
    let status = match &err {
        ServiceError::RecipeNotFound { .. }
        | ServiceError::IngredientNotFound { .. }
        | ServiceError::TagNotFound { .. }
        | ServiceError::UserNotFound { .. } => StatusCode::NOT_FOUND,
        ServiceError::ValidationError { .. }
        | ServiceError::AlreadyInList { .. }
        | ServiceError::NotInList { .. }
        | ServiceError::SelfSubscription { .. } => StatusCode::BAD_REQUEST,
        ServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        ServiceError::AlreadyExists { .. } => StatusCode::CONFLICT,
        ServiceError::Repository {
            source: RepositoryError::ConnectionFailed,
        } => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Repository { .. }
        | ServiceError::Configuration { .. }
        | ServiceError::Rendering { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    // Internal details stay in the logs
    let message = if status.is_server_error() {
        crate::error_with_trace!(error = %err, "Request failed with server error");
        match status {
            StatusCode::SERVICE_UNAVAILABLE => "Database connection failed".to_string(),
            _ => "Internal server error".to_string(),
        }
    } else {
        crate::warn_with_trace!(error = %err, "Request rejected");
        err.to_string()
    };

    (
        status,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_errors_map_to_404() {
        let (status, Json(body)) = service_error_to_response(ServiceError::RecipeNotFound {
            id: "R1".to_string(),
        });
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Recipe not found: R1");
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn test_business_errors_status_codes() {
        let cases = vec![
            (
                ServiceError::AlreadyInList {
                    user_id: "U1".to_string(),
                    list: "favorite".to_string(),
                    target_id: "R1".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::SelfSubscription {
                    user_id: "U1".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Forbidden {
                    user_id: "U1".to_string(),
                    action: "delete recipe R1".to_string(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                ServiceError::AlreadyExists {
                    field: "email".to_string(),
                    value: "a@b.c".to_string(),
                },
                StatusCode::CONFLICT,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(service_error_to_response(err).0, expected);
        }
    }

    #[test]
    fn test_repository_errors_hide_details() {
        let (status, Json(body)) = service_error_to_response(ServiceError::Repository {
            source: RepositoryError::AwsSdk {
                message: "secret table arn".to_string(),
            },
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");

        let (status, _) = service_error_to_response(ServiceError::Repository {
            source: RepositoryError::ConnectionFailed,
        });
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_page_query_validation() {
        let query = PageQuery {
            page: Some(0),
            limit: None,
        };
        let (status, _) = query.pagination().unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let query = PageQuery::default();
        assert_eq!(query.pagination().unwrap(), Pagination::default());
    }
}
