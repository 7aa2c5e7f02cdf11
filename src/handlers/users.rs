use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::models::{
    CreateUserRequest, SubscriptionListResponse, UserListResponse, UserResponse,
};

use super::api::{service_error_to_response, ApiResult, ApiState, PageQuery};
use super::recipes::ViewerQuery;

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub viewer: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionQuery {
    pub recipes_limit: Option<usize>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[instrument(name = "create_user", skip(state, request), fields(username = %request.username))]
pub async fn create_user(
    State(state): State<ApiState>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .user_service
        .create_user(request)
        .await
        .map_err(service_error_to_response)?;

    info!(user_id = %user.id, "Registered user");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(name = "list_users", skip(state, query))]
pub async fn list_users(
    State(state): State<ApiState>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<UserListResponse>> {
    let pagination = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .pagination()?;

    state
        .user_service
        .list_users(query.viewer.as_deref(), pagination)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "get_user", skip(state), fields(user_id = %user_id))]
pub async fn get_user(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Query(query): Query<ViewerQuery>,
) -> ApiResult<Json<UserResponse>> {
    state
        .user_service
        .get_user(&user_id, query.viewer.as_deref())
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "subscribe", skip(state), fields(user_id = %user_id, author_id = %author_id))]
pub async fn subscribe(
    State(state): State<ApiState>,
    Path((user_id, author_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    state
        .user_service
        .subscribe(&user_id, &author_id)
        .await
        .map(|author| (StatusCode::CREATED, Json(author)))
        .map_err(service_error_to_response)
}

#[instrument(name = "unsubscribe", skip(state), fields(user_id = %user_id, author_id = %author_id))]
pub async fn unsubscribe(
    State(state): State<ApiState>,
    Path((user_id, author_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .user_service
        .unsubscribe(&user_id, &author_id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(service_error_to_response)
}

#[instrument(name = "list_subscriptions", skip(state, query), fields(user_id = %user_id))]
pub async fn list_subscriptions(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Query(query): Query<SubscriptionQuery>,
) -> ApiResult<Json<SubscriptionListResponse>> {
    let pagination = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .pagination()?;

    state
        .user_service
        .list_subscriptions(&user_id, query.recipes_limit, pagination)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}
