use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    sort_newest_first, CreateUserRequest, Pagination, ServiceError, ServiceResult,
    SubscriptionListResponse, SubscriptionResponse, User, UserListEntry, UserListKind,
    UserListResponse, UserResponse, Validate,
};
use crate::observability::BusinessTracingMiddleware;
use crate::repositories::{RecipeRepository, UserListRepository, UserRepository};

/// Recipes shown per author on the subscriptions page when not specified
pub const DEFAULT_RECIPES_LIMIT: usize = 3;

/// Users and the subscriptions between them
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    list_repository: Arc<dyn UserListRepository>,
    recipe_repository: Arc<dyn RecipeRepository>,
    tracing: Arc<BusinessTracingMiddleware>,
    media_cdn_url: String,
}

impl UserService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        list_repository: Arc<dyn UserListRepository>,
        recipe_repository: Arc<dyn RecipeRepository>,
        tracing: Arc<BusinessTracingMiddleware>,
        media_cdn_url: String,
    ) -> Self {
        Self {
            user_repository,
            list_repository,
            recipe_repository,
            tracing,
            media_cdn_url,
        }
    }

    pub(crate) async fn require_user(&self, user_id: &str) -> ServiceResult<User> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound {
                id: user_id.to_string(),
            })
    }

    /// Author ids the viewer follows; empty without a viewer
    async fn subscribed_ids(&self, viewer: Option<&str>) -> ServiceResult<HashSet<String>> {
        let Some(viewer) = viewer else {
            return Ok(HashSet::new());
        };

        Ok(self
            .list_repository
            .find_entries(viewer, UserListKind::Subscription)
            .await?
            .into_iter()
            .map(|entry| entry.target_id)
            .collect())
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create_user(&self, request: CreateUserRequest) -> ServiceResult<UserResponse> {
        request.validate()?;
        let user = User::new(request);

        if let Some(existing) = self
            .user_repository
            .find_by_email_or_username(&user.email, &user.username)
            .await?
        {
            let (field, value) = if existing.email == user.email {
                ("email", user.email)
            } else {
                ("username", user.username)
            };
            return Err(ServiceError::AlreadyExists {
                field: field.to_string(),
                value,
            });
        }

        let created = self.user_repository.create(user).await?;
        info!(user_id = %created.id, "User created");
        Ok(created.to_response(false))
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user(&self, user_id: &str, viewer: Option<&str>) -> ServiceResult<UserResponse> {
        let user = self.require_user(user_id).await?;
        let is_subscribed = match viewer {
            Some(viewer) => {
                self.list_repository
                    .contains(viewer, UserListKind::Subscription, user_id)
                    .await?
            }
            None => false,
        };
        Ok(user.to_response(is_subscribed))
    }

    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        viewer: Option<&str>,
        pagination: Pagination,
    ) -> ServiceResult<UserListResponse> {
        let users = self.user_repository.find_all().await?;
        let subscribed = self.subscribed_ids(viewer).await?;
        let total_count = users.len();

        let users = pagination
            .apply(users)
            .into_iter()
            .map(|user| {
                let is_subscribed = subscribed.contains(&user.id);
                user.to_response(is_subscribed)
            })
            .collect();

        Ok(UserListResponse {
            users,
            total_count,
            page: pagination.page,
            page_size: pagination.limit,
        })
    }

    /// Follow `author_id`; returns the author as now seen by the subscriber
    #[instrument(skip(self), fields(user_id = %user_id, author_id = %author_id))]
    pub async fn subscribe(&self, user_id: &str, author_id: &str) -> ServiceResult<UserResponse> {
        self.tracing
            .trace_list_operation("subscription", "add", user_id, async {
                if user_id == author_id {
                    return Err(ServiceError::SelfSubscription {
                        user_id: user_id.to_string(),
                    });
                }
                self.require_user(user_id).await?;
                let author = self.require_user(author_id).await?;

                let entry = UserListEntry::new(user_id, UserListKind::Subscription, author_id);
                if !self.list_repository.add_entry(entry).await? {
                    return Err(ServiceError::AlreadyInList {
                        user_id: user_id.to_string(),
                        list: UserListKind::Subscription.to_string(),
                        target_id: author_id.to_string(),
                    });
                }

                Ok(author.to_response(true))
            })
            .await
    }

    #[instrument(skip(self), fields(user_id = %user_id, author_id = %author_id))]
    pub async fn unsubscribe(&self, user_id: &str, author_id: &str) -> ServiceResult<()> {
        self.tracing
            .trace_list_operation("subscription", "remove", user_id, async {
                let removed = self
                    .list_repository
                    .remove_entry(user_id, UserListKind::Subscription, author_id)
                    .await?;
                if !removed {
                    return Err(ServiceError::NotInList {
                        user_id: user_id.to_string(),
                        list: UserListKind::Subscription.to_string(),
                        target_id: author_id.to_string(),
                    });
                }
                Ok(())
            })
            .await
    }

    /// Followed authors in subscription order, each with a preview of their newest recipes
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_subscriptions(
        &self,
        user_id: &str,
        recipes_limit: Option<usize>,
        pagination: Pagination,
    ) -> ServiceResult<SubscriptionListResponse> {
        self.require_user(user_id).await?;
        let recipes_limit = recipes_limit.unwrap_or(DEFAULT_RECIPES_LIMIT);

        let entries = self
            .list_repository
            .find_entries(user_id, UserListKind::Subscription)
            .await?;
        let total_count = entries.len();

        let mut subscriptions = Vec::new();
        for entry in pagination.apply(entries) {
            // Authors removed since subscribing are skipped
            let Some(author) = self.user_repository.find_by_id(&entry.target_id).await? else {
                continue;
            };

            let mut recipes = self.recipe_repository.find_by_author(&author.id).await?;
            sort_newest_first(&mut recipes);

            subscriptions.push(SubscriptionResponse {
                author: author.to_response(true),
                recipes_count: recipes.len(),
                recipes: recipes
                    .iter()
                    .take(recipes_limit)
                    .map(|recipe| recipe.to_short_response(&self.media_cdn_url))
                    .collect(),
            });
        }

        info!("Listed {} subscriptions", subscriptions.len());
        Ok(SubscriptionListResponse {
            subscriptions,
            total_count,
            page: pagination.page,
            page_size: pagination.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateRecipeRequest, IngredientAmount, Recipe};
    use crate::observability::Metrics;
    use crate::services::mocks::{
        MockTestRecipeRepository, MockTestUserListRepository, MockTestUserRepository,
    };
    use mockall::predicate::eq;

    fn user(username: &str) -> User {
        User::new(CreateUserRequest {
            email: format!("{}@example.com", username),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        })
    }

    fn recipe_by(author_id: &str, name: &str) -> Recipe {
        Recipe::new(
            author_id,
            CreateRecipeRequest {
                name: name.to_string(),
                text: "Cook it.".to_string(),
                image: None,
                cooking_time: 10,
                tags: vec!["T1".to_string()],
                ingredients: vec![IngredientAmount {
                    id: "I1".to_string(),
                    amount: 1,
                }],
            },
            Vec::new(),
        )
    }

    fn service(
        users: MockTestUserRepository,
        lists: MockTestUserListRepository,
        recipes: MockTestRecipeRepository,
    ) -> UserService {
        let metrics = Arc::new(Metrics::new().unwrap());
        UserService::new(
            Arc::new(users),
            Arc::new(lists),
            Arc::new(recipes),
            Arc::new(BusinessTracingMiddleware::new(metrics)),
            String::new(),
        )
    }

    #[tokio::test]
    async fn test_create_user_rejects_taken_username() {
        let existing = user("cook");
        let mut users = MockTestUserRepository::new();
        users
            .expect_find_by_email_or_username()
            .times(1)
            .returning(move |_, _| Ok(Some(existing.clone())));
        users.expect_create().never();

        let result = service(users, MockTestUserListRepository::new(), MockTestRecipeRepository::new())
            .create_user(CreateUserRequest {
                email: "other@example.com".to_string(),
                username: "cook".to_string(),
                first_name: "Other".to_string(),
                last_name: "Cook".to_string(),
            })
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::AlreadyExists { field, value }) if field == "username" && value == "cook"
        ));
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let mut users = MockTestUserRepository::new();
        users
            .expect_find_by_email_or_username()
            .with(eq("chef@example.com"), eq("chef"))
            .times(1)
            .returning(|_, _| Ok(None));
        users.expect_create().times(1).returning(Ok);

        let response = service(users, MockTestUserListRepository::new(), MockTestRecipeRepository::new())
            .create_user(CreateUserRequest {
                email: "Chef@Example.com".to_string(),
                username: "chef".to_string(),
                first_name: "Julia".to_string(),
                last_name: "Child".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.email, "chef@example.com");
        assert!(!response.is_subscribed);
    }

    #[tokio::test]
    async fn test_subscribe_to_self_is_rejected() {
        let mut lists = MockTestUserListRepository::new();
        lists.expect_add_entry().never();

        let result = service(MockTestUserRepository::new(), lists, MockTestRecipeRepository::new())
            .subscribe("U1", "U1")
            .await;
        assert!(matches!(result, Err(ServiceError::SelfSubscription { .. })));
    }

    #[tokio::test]
    async fn test_subscribe_twice_is_rejected() {
        let subscriber = user("reader");
        let author = user("writer");
        let (subscriber_id, author_id) = (subscriber.id.clone(), author.id.clone());

        let mut users = MockTestUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |id| {
                Ok([subscriber.clone(), author.clone()]
                    .into_iter()
                    .find(|user| user.id == id))
            });
        let mut lists = MockTestUserListRepository::new();
        lists.expect_add_entry().times(1).returning(|_| Ok(false));

        let result = service(users, lists, MockTestRecipeRepository::new())
            .subscribe(&subscriber_id, &author_id)
            .await;
        assert!(matches!(result, Err(ServiceError::AlreadyInList { list, .. }) if list == "subscription"));
    }

    #[tokio::test]
    async fn test_subscribe_to_missing_author() {
        let subscriber = user("reader");
        let subscriber_id = subscriber.id.clone();

        let mut users = MockTestUserRepository::new();
        users.expect_find_by_id().returning(move |id| {
            Ok((id == subscriber.id).then(|| subscriber.clone()))
        });

        let result = service(users, MockTestUserListRepository::new(), MockTestRecipeRepository::new())
            .subscribe(&subscriber_id, "U404")
            .await;
        assert!(matches!(result, Err(ServiceError::UserNotFound { id }) if id == "U404"));
    }

    #[tokio::test]
    async fn test_unsubscribe_when_not_subscribed() {
        let mut lists = MockTestUserListRepository::new();
        lists
            .expect_remove_entry()
            .with(eq("U1"), eq(UserListKind::Subscription), eq("U2"))
            .times(1)
            .returning(|_, _, _| Ok(false));

        let result = service(MockTestUserRepository::new(), lists, MockTestRecipeRepository::new())
            .unsubscribe("U1", "U2")
            .await;
        assert!(matches!(result, Err(ServiceError::NotInList { .. })));
    }

    #[tokio::test]
    async fn test_list_subscriptions_limits_recipe_preview() {
        let subscriber = user("reader");
        let author = user("writer");
        let subscriber_id = subscriber.id.clone();
        let author_id = author.id.clone();

        let mut users = MockTestUserRepository::new();
        users.expect_find_by_id().returning(move |id| {
            Ok([subscriber.clone(), author.clone()]
                .into_iter()
                .find(|user| user.id == id))
        });

        let mut lists = MockTestUserListRepository::new();
        let entry_author = author_id.clone();
        lists
            .expect_find_entries()
            .returning(move |user_id, kind| {
                Ok(vec![UserListEntry::new(user_id, kind, &entry_author)])
            });

        let mut recipes = MockTestRecipeRepository::new();
        recipes
            .expect_find_by_author()
            .with(eq(author_id.clone()))
            .times(1)
            .returning(|author_id| {
                Ok(vec![
                    recipe_by(author_id, "Soup"),
                    recipe_by(author_id, "Stew"),
                    recipe_by(author_id, "Salad"),
                ])
            });

        let response = service(users, lists, recipes)
            .list_subscriptions(&subscriber_id, Some(2), Pagination::default())
            .await
            .unwrap();

        assert_eq!(response.total_count, 1);
        let subscription = &response.subscriptions[0];
        assert_eq!(subscription.author.id, author_id);
        assert!(subscription.author.is_subscribed);
        assert_eq!(subscription.recipes_count, 3);
        assert_eq!(subscription.recipes.len(), 2);
    }
}
