use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::models::{
    CreateRecipeRequest, RecipeFilters, RecipeListResponse, RecipeResponse, UpdateRecipeRequest,
};

use super::api::{service_error_to_response, ApiResult, ApiState, PageQuery};

/// Query string of the recipe feed
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    /// Comma-separated tag slugs
    pub tags: Option<String>,
    pub author: Option<String>,
    pub viewer: Option<String>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewerQuery {
    pub viewer: Option<String>,
}

/// `1` and `true` switch a filter on
fn flag(value: &Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim),
        Some("1") | Some("true") | Some("True")
    )
}

impl RecipeListQuery {
    fn filters(&self) -> RecipeFilters {
        let tags = self
            .tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|slug| !slug.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        RecipeFilters {
            tags,
            author: self.author.clone().filter(|author| !author.is_empty()),
            viewer: self.viewer.clone().filter(|viewer| !viewer.is_empty()),
            is_favorited: flag(&self.is_favorited),
            is_in_shopping_cart: flag(&self.is_in_shopping_cart),
        }
    }

    fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[instrument(name = "list_recipes", skip(state, query))]
pub async fn list_recipes(
    State(state): State<ApiState>,
    Query(query): Query<RecipeListQuery>,
) -> ApiResult<Json<RecipeListResponse>> {
    let pagination = query.page_query().pagination()?;
    let filters = query.filters();
    info!(?filters, "Listing recipes");

    match state.recipe_service.list_recipes(filters, pagination).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            error!("Failed to list recipes: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

#[instrument(name = "get_recipe", skip(state), fields(recipe_id = %recipe_id))]
pub async fn get_recipe(
    State(state): State<ApiState>,
    Path(recipe_id): Path<String>,
    Query(query): Query<ViewerQuery>,
) -> ApiResult<Json<RecipeResponse>> {
    state
        .recipe_service
        .get_recipe(&recipe_id, query.viewer.as_deref())
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "create_recipe", skip(state, request), fields(user_id = %user_id))]
pub async fn create_recipe(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Json(request): Json<CreateRecipeRequest>,
) -> ApiResult<(StatusCode, Json<RecipeResponse>)> {
    match state.recipe_service.create_recipe(&user_id, request).await {
        Ok(recipe) => {
            info!(recipe_id = %recipe.id, "Created recipe");
            Ok((StatusCode::CREATED, Json(recipe)))
        }
        Err(err) => Err(service_error_to_response(err)),
    }
}

#[instrument(name = "update_recipe", skip(state, request), fields(user_id = %user_id, recipe_id = %recipe_id))]
pub async fn update_recipe(
    State(state): State<ApiState>,
    Path((user_id, recipe_id)): Path<(String, String)>,
    Json(request): Json<UpdateRecipeRequest>,
) -> ApiResult<Json<RecipeResponse>> {
    state
        .recipe_service
        .update_recipe(&user_id, &recipe_id, request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "delete_recipe", skip(state), fields(user_id = %user_id, recipe_id = %recipe_id))]
pub async fn delete_recipe(
    State(state): State<ApiState>,
    Path((user_id, recipe_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .recipe_service
        .delete_recipe(&user_id, &recipe_id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(service_error_to_response)
}
