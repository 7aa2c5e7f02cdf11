use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::{info, instrument};

use crate::models::{RecipeShortResponse, ShoppingList, UserListKind};
use crate::services::{PDF_CONTENT_TYPE, PDF_FILE_NAME};

use super::api::{service_error_to_response, ApiResult, ApiState};

async fn add_to_list(
    state: &ApiState,
    user_id: &str,
    kind: UserListKind,
    recipe_id: &str,
) -> ApiResult<(StatusCode, Json<RecipeShortResponse>)> {
    state
        .collection_service
        .add_recipe(user_id, kind, recipe_id)
        .await
        .map(|recipe| (StatusCode::CREATED, Json(recipe)))
        .map_err(service_error_to_response)
}

async fn remove_from_list(
    state: &ApiState,
    user_id: &str,
    kind: UserListKind,
    recipe_id: &str,
) -> ApiResult<StatusCode> {
    state
        .collection_service
        .remove_recipe(user_id, kind, recipe_id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(service_error_to_response)
}

#[instrument(name = "add_favorite", skip(state), fields(user_id = %user_id, recipe_id = %recipe_id))]
pub async fn add_favorite(
    State(state): State<ApiState>,
    Path((user_id, recipe_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<RecipeShortResponse>)> {
    add_to_list(&state, &user_id, UserListKind::Favorite, &recipe_id).await
}

#[instrument(name = "remove_favorite", skip(state), fields(user_id = %user_id, recipe_id = %recipe_id))]
pub async fn remove_favorite(
    State(state): State<ApiState>,
    Path((user_id, recipe_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    remove_from_list(&state, &user_id, UserListKind::Favorite, &recipe_id).await
}

#[instrument(name = "add_to_shopping_cart", skip(state), fields(user_id = %user_id, recipe_id = %recipe_id))]
pub async fn add_to_shopping_cart(
    State(state): State<ApiState>,
    Path((user_id, recipe_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<RecipeShortResponse>)> {
    add_to_list(&state, &user_id, UserListKind::ShoppingCart, &recipe_id).await
}

#[instrument(name = "remove_from_shopping_cart", skip(state), fields(user_id = %user_id, recipe_id = %recipe_id))]
pub async fn remove_from_shopping_cart(
    State(state): State<ApiState>,
    Path((user_id, recipe_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    remove_from_list(&state, &user_id, UserListKind::ShoppingCart, &recipe_id).await
}

#[instrument(name = "list_shopping_cart", skip(state), fields(user_id = %user_id))]
pub async fn list_shopping_cart(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<RecipeShortResponse>>> {
    state
        .collection_service
        .list_shopping_cart(&user_id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

/// Aggregated ingredient lines for the cart, as JSON
#[instrument(name = "shopping_list_summary", skip(state), fields(user_id = %user_id))]
pub async fn shopping_list_summary(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ShoppingList>> {
    state
        .shopping_list_service
        .build_shopping_list(&user_id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

/// The aggregated list as a PDF attachment
#[instrument(name = "download_shopping_list", skip(state), fields(user_id = %user_id))]
pub async fn download_shopping_list(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> ApiResult<Response> {
    let bytes = state
        .shopping_list_service
        .render_shopping_list(&user_id)
        .await
        .map_err(service_error_to_response)?;

    info!(bytes = bytes.len(), "Sending shopping list");
    Ok((
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", PDF_FILE_NAME),
            ),
        ],
        bytes,
    )
        .into_response())
}
