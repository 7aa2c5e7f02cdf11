use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    CartEntry, Recipe, ServiceError, ServiceResult, ShoppingList, ShoppingListAggregator,
    UserListKind,
};
use crate::observability::BusinessTracingMiddleware;
use crate::repositories::{RecipeRepository, UserListRepository, UserRepository};

use super::shopping_list_document::render_pdf;

/// Builds a user's shopping list from the recipes in their cart
pub struct ShoppingListService {
    user_repository: Arc<dyn UserRepository>,
    recipe_repository: Arc<dyn RecipeRepository>,
    list_repository: Arc<dyn UserListRepository>,
    tracing: Arc<BusinessTracingMiddleware>,
}

impl ShoppingListService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        recipe_repository: Arc<dyn RecipeRepository>,
        list_repository: Arc<dyn UserListRepository>,
        tracing: Arc<BusinessTracingMiddleware>,
    ) -> Self {
        Self {
            user_repository,
            recipe_repository,
            list_repository,
            tracing,
        }
    }

    /// Load the cart and every distinct recipe in it, then aggregate over that snapshot.
    /// Recipes deleted since they were carted are left out of the snapshot so the
    /// aggregator reports them.
    async fn aggregate_cart(&self, user_id: &str) -> ServiceResult<ShoppingList> {
        if !self.user_repository.exists(user_id).await? {
            return Err(ServiceError::UserNotFound {
                id: user_id.to_string(),
            });
        }

        let entries: Vec<CartEntry> = self
            .list_repository
            .find_entries(user_id, UserListKind::ShoppingCart)
            .await?
            .iter()
            .map(|entry| entry.to_cart_entry())
            .collect();

        let mut recipes: HashMap<String, Recipe> = HashMap::new();
        for entry in &entries {
            if recipes.contains_key(&entry.recipe_id) {
                continue;
            }
            if let Some(recipe) = self.recipe_repository.find_by_id(&entry.recipe_id).await? {
                recipes.insert(recipe.id.clone(), recipe);
            }
        }

        let list = ShoppingListAggregator::aggregate(&entries, &recipes)?;
        info!(
            cart_entries = entries.len(),
            lines = list.len(),
            "Shopping list aggregated"
        );
        Ok(list)
    }

    /// Aggregated lines for the user's cart
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn build_shopping_list(&self, user_id: &str) -> ServiceResult<ShoppingList> {
        self.tracing
            .trace_shopping_list("json", user_id, ShoppingList::len, self.aggregate_cart(user_id))
            .await
    }

    /// The shopping list as a PDF dated today (UTC)
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn render_shopping_list(&self, user_id: &str) -> ServiceResult<Vec<u8>> {
        self.render_shopping_list_on(user_id, Utc::now().date_naive())
            .await
    }

    pub async fn render_shopping_list_on(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> ServiceResult<Vec<u8>> {
        let (_, bytes) = self
            .tracing
            .trace_shopping_list(
                "pdf",
                user_id,
                |(list, _): &(ShoppingList, Vec<u8>)| list.len(),
                async {
                    let list = self.aggregate_cart(user_id).await?;
                    let bytes = render_pdf(&list, date)?;
                    Ok::<_, ServiceError>((list, bytes))
                },
            )
            .await?;

        crate::info_with_trace!(bytes = bytes.len(), "Shopping list rendered");
        Ok(bytes)
    }
}
