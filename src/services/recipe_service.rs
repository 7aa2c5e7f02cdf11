use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    sort_newest_first, CreateRecipeRequest, IngredientAmount, Pagination, Recipe,
    RecipeFilters, RecipeIngredient, RecipeListResponse, RecipeResponse, ServiceError,
    ServiceResult, Tag, UpdateRecipeRequest, User, UserListKind, Validate,
};
use crate::observability::BusinessTracingMiddleware;
use crate::repositories::{
    IngredientRepository, RecipeRepository, TagRepository, UserListRepository, UserRepository,
};

/// What one viewer has favorited, carted and subscribed to
#[derive(Debug, Default)]
struct ViewerLists {
    favorites: HashSet<String>,
    shopping_cart: HashSet<String>,
    subscriptions: HashSet<String>,
}

/// Publishing, editing and browsing recipes
pub struct RecipeService {
    recipe_repository: Arc<dyn RecipeRepository>,
    tag_repository: Arc<dyn TagRepository>,
    ingredient_repository: Arc<dyn IngredientRepository>,
    user_repository: Arc<dyn UserRepository>,
    list_repository: Arc<dyn UserListRepository>,
    tracing: Arc<BusinessTracingMiddleware>,
    media_cdn_url: String,
}

impl RecipeService {
    pub fn new(
        recipe_repository: Arc<dyn RecipeRepository>,
        tag_repository: Arc<dyn TagRepository>,
        ingredient_repository: Arc<dyn IngredientRepository>,
        user_repository: Arc<dyn UserRepository>,
        list_repository: Arc<dyn UserListRepository>,
        tracing: Arc<BusinessTracingMiddleware>,
        media_cdn_url: String,
    ) -> Self {
        Self {
            recipe_repository,
            tag_repository,
            ingredient_repository,
            user_repository,
            list_repository,
            tracing,
            media_cdn_url,
        }
    }

    async fn require_user(&self, user_id: &str) -> ServiceResult<User> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound {
                id: user_id.to_string(),
            })
    }

    async fn require_recipe(&self, recipe_id: &str) -> ServiceResult<Recipe> {
        self.recipe_repository
            .find_by_id(recipe_id)
            .await?
            .ok_or_else(|| ServiceError::RecipeNotFound {
                id: recipe_id.to_string(),
            })
    }

    async fn require_tags(&self, tag_ids: &[String]) -> ServiceResult<()> {
        for tag_id in tag_ids {
            if self.tag_repository.find_by_id(tag_id).await?.is_none() {
                return Err(ServiceError::TagNotFound { id: tag_id.clone() });
            }
        }
        Ok(())
    }

    /// Look up each ingredient and copy its name and unit into the recipe
    async fn resolve_ingredients(
        &self,
        amounts: &[IngredientAmount],
    ) -> ServiceResult<Vec<RecipeIngredient>> {
        let mut resolved = Vec::with_capacity(amounts.len());
        for amount in amounts {
            let ingredient = self
                .ingredient_repository
                .find_by_id(&amount.id)
                .await?
                .ok_or_else(|| ServiceError::IngredientNotFound {
                    id: amount.id.clone(),
                })?;

            resolved.push(RecipeIngredient {
                ingredient_id: ingredient.id,
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount: amount.amount,
            });
        }
        Ok(resolved)
    }

    async fn list_ids(&self, user_id: &str, kind: UserListKind) -> ServiceResult<HashSet<String>> {
        Ok(self
            .list_repository
            .find_entries(user_id, kind)
            .await?
            .into_iter()
            .map(|entry| entry.target_id)
            .collect())
    }

    async fn viewer_lists(&self, viewer: Option<&str>) -> ServiceResult<ViewerLists> {
        let Some(viewer) = viewer else {
            return Ok(ViewerLists::default());
        };

        Ok(ViewerLists {
            favorites: self.list_ids(viewer, UserListKind::Favorite).await?,
            shopping_cart: self.list_ids(viewer, UserListKind::ShoppingCart).await?,
            subscriptions: self.list_ids(viewer, UserListKind::Subscription).await?,
        })
    }

    async fn tags_by_id(&self) -> ServiceResult<HashMap<String, Tag>> {
        Ok(self
            .tag_repository
            .find_all()
            .await?
            .into_iter()
            .map(|tag| (tag.id.clone(), tag))
            .collect())
    }

    /// Full views for `recipes`, loading each author once
    async fn to_responses(
        &self,
        recipes: Vec<Recipe>,
        viewer: Option<&str>,
    ) -> ServiceResult<Vec<RecipeResponse>> {
        let lists = self.viewer_lists(viewer).await?;
        let tags = self.tags_by_id().await?;
        let mut authors: HashMap<String, User> = HashMap::new();

        let mut responses = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            if !authors.contains_key(&recipe.author_id) {
                let author = self.require_user(&recipe.author_id).await?;
                authors.insert(recipe.author_id.clone(), author);
            }
            let author = authors
                .get(&recipe.author_id)
                .map(|author| author.to_response(lists.subscriptions.contains(&author.id)))
                .ok_or_else(|| ServiceError::UserNotFound {
                    id: recipe.author_id.clone(),
                })?;

            // Tags deleted from the catalog are dropped from the view
            let recipe_tags = recipe
                .tags
                .iter()
                .filter_map(|tag_id| tags.get(tag_id).cloned())
                .collect();

            let mut response = recipe.to_response(author, recipe_tags, &self.media_cdn_url);
            response.is_favorited = lists.favorites.contains(&recipe.id);
            response.is_in_shopping_cart = lists.shopping_cart.contains(&recipe.id);
            responses.push(response);
        }

        Ok(responses)
    }

    async fn to_response(&self, recipe: Recipe, viewer: Option<&str>) -> ServiceResult<RecipeResponse> {
        let id = recipe.id.clone();
        self.to_responses(vec![recipe], viewer)
            .await?
            .pop()
            .ok_or(ServiceError::RecipeNotFound { id })
    }

    #[instrument(skip(self, request), fields(author_id = %author_id, name = %request.name))]
    pub async fn create_recipe(
        &self,
        author_id: &str,
        request: CreateRecipeRequest,
    ) -> ServiceResult<RecipeResponse> {
        let recipe = self
            .tracing
            .trace_recipe_operation("create", None, async {
                request.validate()?;
                self.require_user(author_id).await?;
                self.require_tags(&request.tags).await?;
                let ingredients = self.resolve_ingredients(&request.ingredients).await?;

                let recipe = Recipe::new(author_id, request, ingredients);
                Ok::<_, ServiceError>(self.recipe_repository.create(recipe).await?)
            })
            .await?;

        info!(recipe_id = %recipe.id, "Recipe published");
        self.to_response(recipe, Some(author_id)).await
    }

    #[instrument(skip(self), fields(recipe_id = %recipe_id))]
    pub async fn get_recipe(
        &self,
        recipe_id: &str,
        viewer: Option<&str>,
    ) -> ServiceResult<RecipeResponse> {
        let recipe = self.require_recipe(recipe_id).await?;
        self.to_response(recipe, viewer).await
    }

    /// Recipe feed, newest first
    #[instrument(skip(self, filters), fields(author = ?filters.author, tags = filters.tags.len()))]
    pub async fn list_recipes(
        &self,
        filters: RecipeFilters,
        pagination: Pagination,
    ) -> ServiceResult<RecipeListResponse> {
        if (filters.is_favorited || filters.is_in_shopping_cart) && filters.viewer.is_none() {
            return Err(ServiceError::ValidationError {
                message: "is_favorited and is_in_shopping_cart require a viewer".to_string(),
            });
        }

        let mut recipes = match &filters.author {
            Some(author) => self.recipe_repository.find_by_author(author).await?,
            None => self.recipe_repository.find_all().await?,
        };

        if !filters.tags.is_empty() {
            let tag_ids: Vec<String> = self
                .tag_repository
                .find_all()
                .await?
                .into_iter()
                .filter(|tag| filters.tags.contains(&tag.slug))
                .map(|tag| tag.id)
                .collect();
            recipes.retain(|recipe| recipe.has_any_tag(&tag_ids));
        }

        if let Some(viewer) = filters.viewer.as_deref() {
            if filters.is_favorited {
                let favorites = self.list_ids(viewer, UserListKind::Favorite).await?;
                recipes.retain(|recipe| favorites.contains(&recipe.id));
            }
            if filters.is_in_shopping_cart {
                let cart = self.list_ids(viewer, UserListKind::ShoppingCart).await?;
                recipes.retain(|recipe| cart.contains(&recipe.id));
            }
        }

        sort_newest_first(&mut recipes);
        let total_count = recipes.len();
        let recipes = self
            .to_responses(pagination.apply(recipes), filters.viewer.as_deref())
            .await?;

        info!(total_count, returned = recipes.len(), "Listed recipes");
        Ok(RecipeListResponse {
            recipes,
            total_count,
            page: pagination.page,
            page_size: pagination.limit,
        })
    }

    /// Partial update by the recipe's author
    #[instrument(skip(self, request), fields(user_id = %user_id, recipe_id = %recipe_id))]
    pub async fn update_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
        request: UpdateRecipeRequest,
    ) -> ServiceResult<RecipeResponse> {
        let recipe = self
            .tracing
            .trace_recipe_operation("update", Some(recipe_id), async {
                request.validate()?;
                let mut recipe = self.require_recipe(recipe_id).await?;
                if !recipe.is_authored_by(user_id) {
                    return Err(ServiceError::Forbidden {
                        user_id: user_id.to_string(),
                        action: format!("update recipe {}", recipe_id),
                    });
                }

                if let Some(tags) = &request.tags {
                    self.require_tags(tags).await?;
                }
                let ingredients = match &request.ingredients {
                    Some(amounts) => Some(self.resolve_ingredients(amounts).await?),
                    None => None,
                };

                recipe.update(request, ingredients);
                Ok::<_, ServiceError>(self.recipe_repository.update(recipe).await?)
            })
            .await?;

        self.to_response(recipe, Some(user_id)).await
    }

    /// Delete by the recipe's author. Other users' lists keep their references.
    #[instrument(skip(self), fields(user_id = %user_id, recipe_id = %recipe_id))]
    pub async fn delete_recipe(&self, user_id: &str, recipe_id: &str) -> ServiceResult<()> {
        self.tracing
            .trace_recipe_operation("delete", Some(recipe_id), async {
                let recipe = self.require_recipe(recipe_id).await?;
                if !recipe.is_authored_by(user_id) {
                    return Err(ServiceError::Forbidden {
                        user_id: user_id.to_string(),
                        action: format!("delete recipe {}", recipe_id),
                    });
                }

                if !self.recipe_repository.delete(recipe_id).await? {
                    return Err(ServiceError::RecipeNotFound {
                        id: recipe_id.to_string(),
                    });
                }
                info!("Recipe deleted");
                Ok(())
            })
            .await
    }
}
