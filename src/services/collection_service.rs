use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    Recipe, RecipeShortResponse, ServiceError, ServiceResult, UserListEntry, UserListKind,
};
use crate::observability::BusinessTracingMiddleware;
use crate::repositories::{RecipeRepository, UserListRepository, UserRepository};

/// Favorites and shopping cart: per-user lists of recipes
pub struct CollectionService {
    user_repository: Arc<dyn UserRepository>,
    recipe_repository: Arc<dyn RecipeRepository>,
    list_repository: Arc<dyn UserListRepository>,
    tracing: Arc<BusinessTracingMiddleware>,
    media_cdn_url: String,
}

fn recipe_list(kind: UserListKind) -> ServiceResult<UserListKind> {
    if kind.holds_recipes() {
        Ok(kind)
    } else {
        Err(ServiceError::ValidationError {
            message: format!("{} does not hold recipes", kind),
        })
    }
}

impl CollectionService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        recipe_repository: Arc<dyn RecipeRepository>,
        list_repository: Arc<dyn UserListRepository>,
        tracing: Arc<BusinessTracingMiddleware>,
        media_cdn_url: String,
    ) -> Self {
        Self {
            user_repository,
            recipe_repository,
            list_repository,
            tracing,
            media_cdn_url,
        }
    }

    async fn require_recipe(&self, recipe_id: &str) -> ServiceResult<Recipe> {
        self.recipe_repository
            .find_by_id(recipe_id)
            .await?
            .ok_or_else(|| ServiceError::RecipeNotFound {
                id: recipe_id.to_string(),
            })
    }

    async fn require_user(&self, user_id: &str) -> ServiceResult<()> {
        if self.user_repository.exists(user_id).await? {
            Ok(())
        } else {
            Err(ServiceError::UserNotFound {
                id: user_id.to_string(),
            })
        }
    }

    /// Put a recipe on the user's favorites or shopping cart
    #[instrument(skip(self), fields(user_id = %user_id, list = %kind, recipe_id = %recipe_id))]
    pub async fn add_recipe(
        &self,
        user_id: &str,
        kind: UserListKind,
        recipe_id: &str,
    ) -> ServiceResult<RecipeShortResponse> {
        let kind = recipe_list(kind)?;
        let list = kind.to_string();

        self.tracing
            .trace_list_operation(&list, "add", user_id, async {
                self.require_user(user_id).await?;
                let recipe = self.require_recipe(recipe_id).await?;

                let entry = UserListEntry::new(user_id, kind, recipe_id);
                if !self.list_repository.add_entry(entry).await? {
                    return Err(ServiceError::AlreadyInList {
                        user_id: user_id.to_string(),
                        list: list.clone(),
                        target_id: recipe_id.to_string(),
                    });
                }

                info!("Recipe added to list");
                Ok(recipe.to_short_response(&self.media_cdn_url))
            })
            .await
    }

    #[instrument(skip(self), fields(user_id = %user_id, list = %kind, recipe_id = %recipe_id))]
    pub async fn remove_recipe(
        &self,
        user_id: &str,
        kind: UserListKind,
        recipe_id: &str,
    ) -> ServiceResult<()> {
        let kind = recipe_list(kind)?;
        let list = kind.to_string();

        self.tracing
            .trace_list_operation(&list, "remove", user_id, async {
                if !self
                    .list_repository
                    .remove_entry(user_id, kind, recipe_id)
                    .await?
                {
                    return Err(ServiceError::NotInList {
                        user_id: user_id.to_string(),
                        list: list.clone(),
                        target_id: recipe_id.to_string(),
                    });
                }

                info!("Recipe removed from list");
                Ok(())
            })
            .await
    }

    /// Cart contents in the order recipes were added
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_shopping_cart(&self, user_id: &str) -> ServiceResult<Vec<RecipeShortResponse>> {
        self.require_user(user_id).await?;

        let entries = self
            .list_repository
            .find_entries(user_id, UserListKind::ShoppingCart)
            .await?;

        let mut recipes = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.recipe_repository.find_by_id(&entry.target_id).await? {
                Some(recipe) => recipes.push(recipe.to_short_response(&self.media_cdn_url)),
                None => crate::warn_with_trace!(recipe_id = %entry.target_id, "Cart references a deleted recipe"),
            }
        }

        Ok(recipes)
    }
}
