use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::config::DatabaseConfig;
use crate::models::{
    CreateIngredientRequest, CreateTagRequest, Ingredient, ServiceError, Tag,
};
use crate::repositories::TableManager;
use crate::services::CatalogService;

use super::api::service_error_to_response;

/// Admin state: catalog writes and table management
#[derive(Clone)]
pub struct AdminState {
    pub catalog_service: Arc<CatalogService>,
    pub table_manager: Arc<TableManager>,
    pub database: DatabaseConfig,
}

/// Response for seeding operations
#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub message: String,
    pub tags_created: usize,
    pub ingredients_created: usize,
    pub timestamp: String,
}

/// Response for table setup operations
#[derive(Debug, Serialize)]
pub struct SetupTablesResponse {
    pub message: String,
    pub tables_created: Vec<String>,
    pub timestamp: String,
}

/// Create admin router with catalog and database management endpoints
pub fn create_admin_router(
    catalog_service: Arc<CatalogService>,
    table_manager: Arc<TableManager>,
    database: DatabaseConfig,
) -> Router {
    let state = AdminState {
        catalog_service,
        table_manager,
        database,
    };

    Router::new()
        .route("/api/admin/setup-tables", post(setup_tables))
        .route("/api/admin/seed", post(seed_catalog))
        .route("/api/admin/tags", post(create_tag))
        .route("/api/admin/ingredients", post(create_ingredient))
        .with_state(state)
}

// =============================================================================
// DATABASE SETUP AND SEEDING ENDPOINTS
// =============================================================================

/// Create the service's DynamoDB tables
#[instrument(name = "setup_tables", skip(state), fields(
    recipes_table = %state.database.recipes_table_name,
    user_lists_table = %state.database.user_lists_table_name,
))]
pub async fn setup_tables(
    State(state): State<AdminState>,
) -> Result<Json<SetupTablesResponse>, (StatusCode, Json<Value>)> {
    let timestamp = chrono::Utc::now().to_rfc3339();

    info!("Setting up DynamoDB tables");

    match state.table_manager.create_all_tables(&state.database).await {
        Ok(tables_created) => {
            info!("Successfully created tables: {:?}", tables_created);

            Ok(Json(SetupTablesResponse {
                message: format!("Successfully created {} tables", tables_created.len()),
                tables_created,
                timestamp,
            }))
        }
        Err(err) => {
            error!("Failed to create tables: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to create tables",
                    "message": err.to_string(),
                    "timestamp": timestamp,
                })),
            ))
        }
    }
}

/// Load the default tags and ingredients. Entries already present are skipped.
#[instrument(name = "seed_catalog", skip(state))]
pub async fn seed_catalog(
    State(state): State<AdminState>,
) -> Result<Json<SeedResponse>, (StatusCode, Json<Value>)> {
    let timestamp = chrono::Utc::now().to_rfc3339();

    info!("Seeding catalog");

    let mut tags_created = 0;
    for request in default_tags() {
        let slug = request.slug.clone();
        match state.catalog_service.create_tag(request).await {
            Ok(_) => tags_created += 1,
            Err(ServiceError::AlreadyExists { field, .. }) => {
                info!(slug = %slug, field = %field, "Tag already present, skipping");
            }
            Err(err) => {
                error!(slug = %slug, "Failed to seed tag: {}", err);
                return Err(service_error_to_response(err));
            }
        }
    }

    let existing = state
        .catalog_service
        .list_ingredients(None)
        .await
        .map_err(service_error_to_response)?;

    let mut ingredients_created = 0;
    for request in default_ingredients() {
        let present = existing.iter().any(|ingredient| {
            ingredient.name == request.name
                && ingredient.measurement_unit == request.measurement_unit
        });
        if present {
            continue;
        }

        let name = request.name.clone();
        match state.catalog_service.create_ingredient(request).await {
            Ok(_) => ingredients_created += 1,
            Err(err) => {
                warn!(name = %name, "Failed to seed ingredient: {}", err);
                return Err(service_error_to_response(err));
            }
        }
    }

    info!(tags_created, ingredients_created, "Catalog seeded");
    Ok(Json(SeedResponse {
        message: format!(
            "Seeded {} tags and {} ingredients",
            tags_created, ingredients_created
        ),
        tags_created,
        ingredients_created,
        timestamp,
    }))
}

// =============================================================================
// CATALOG MANAGEMENT ENDPOINTS
// =============================================================================

#[instrument(name = "create_tag", skip(state, request), fields(slug = %request.slug))]
pub async fn create_tag(
    State(state): State<AdminState>,
    Json(request): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<Tag>), (StatusCode, Json<Value>)> {
    match state.catalog_service.create_tag(request).await {
        Ok(tag) => {
            info!(tag_id = %tag.id, "Created tag");
            Ok((StatusCode::CREATED, Json(tag)))
        }
        Err(err) => Err(service_error_to_response(err)),
    }
}

#[instrument(name = "create_ingredient", skip(state, request), fields(name = %request.name))]
pub async fn create_ingredient(
    State(state): State<AdminState>,
    Json(request): Json<CreateIngredientRequest>,
) -> Result<(StatusCode, Json<Ingredient>), (StatusCode, Json<Value>)> {
    match state.catalog_service.create_ingredient(request).await {
        Ok(ingredient) => {
            info!(ingredient_id = %ingredient.id, "Created ingredient");
            Ok((StatusCode::CREATED, Json(ingredient)))
        }
        Err(err) => Err(service_error_to_response(err)),
    }
}

// =============================================================================
// DEFAULT CATALOG
// =============================================================================

fn default_tags() -> Vec<CreateTagRequest> {
    [
        ("Breakfast", "#E26C2D", "breakfast"),
        ("Lunch", "#49B64E", "lunch"),
        ("Dinner", "#8775D2", "dinner"),
    ]
    .into_iter()
    .map(|(name, color, slug)| CreateTagRequest {
        name: name.to_string(),
        color: color.to_string(),
        slug: slug.to_string(),
    })
    .collect()
}

fn default_ingredients() -> Vec<CreateIngredientRequest> {
    [
        ("Butter", "g"),
        ("Eggs", "pcs"),
        ("Flour", "g"),
        ("Milk", "ml"),
        ("Olive oil", "tbsp"),
        ("Onion", "pcs"),
        ("Potatoes", "g"),
        ("Rice", "g"),
        ("Salt", "g"),
        ("Sugar", "g"),
        ("Tomatoes", "pcs"),
        ("Water", "ml"),
    ]
    .into_iter()
    .map(|(name, unit)| CreateIngredientRequest {
        name: name.to_string(),
        measurement_unit: unit.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{validate_hex_color, validate_slug};
    use std::collections::HashSet;

    #[test]
    fn test_default_tags_are_valid_and_distinct() {
        let tags = default_tags();
        assert_eq!(tags.len(), 3);

        for tag in &tags {
            assert!(validate_hex_color(&tag.color).is_ok(), "{}", tag.color);
            assert!(validate_slug(&tag.slug).is_ok(), "{}", tag.slug);
        }

        let slugs: HashSet<_> = tags.iter().map(|tag| tag.slug.as_str()).collect();
        let colors: HashSet<_> = tags.iter().map(|tag| tag.color.as_str()).collect();
        assert_eq!(slugs.len(), 3);
        assert_eq!(colors.len(), 3);
    }

    #[test]
    fn test_default_ingredients_are_unique() {
        let ingredients = default_ingredients();
        let names: HashSet<_> = ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names.len(), ingredients.len());
        assert!(ingredients.iter().all(|i| !i.measurement_unit.is_empty()));
    }
}
