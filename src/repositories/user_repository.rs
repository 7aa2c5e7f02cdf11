use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::dynamodb::{dynamodb_span, get_datetime, get_s, map_dynamodb_error, s, scan_all, Item};
use crate::models::{RepositoryResult, User};

/// Trait defining the interface for user data access operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users, oldest account first
    async fn find_all(&self) -> RepositoryResult<Vec<User>>;

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<User>>;

    /// Look a user up by email or username; used for uniqueness checks
    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> RepositoryResult<Option<User>>;

    async fn create(&self, user: User) -> RepositoryResult<User>;

    async fn exists(&self, id: &str) -> RepositoryResult<bool>;
}

pub struct DynamoDbUserRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbUserRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn user_to_item(&self, user: &User) -> Item {
        let mut item = HashMap::new();
        item.insert("id".to_string(), s(&user.id));
        item.insert("email".to_string(), s(&user.email));
        item.insert("username".to_string(), s(&user.username));
        item.insert("first_name".to_string(), s(&user.first_name));
        item.insert("last_name".to_string(), s(&user.last_name));
        item.insert("created_at".to_string(), s(user.created_at.to_rfc3339()));
        item
    }

    pub fn item_to_user(&self, item: &Item) -> RepositoryResult<User> {
        Ok(User {
            id: get_s(item, "id")?,
            email: get_s(item, "email")?,
            username: get_s(item, "username")?,
            first_name: get_s(item, "first_name")?,
            last_name: get_s(item, "last_name")?,
            created_at: get_datetime(item, "created_at")?,
        })
    }

    async fn scan_users(&self) -> RepositoryResult<Vec<User>> {
        let span = dynamodb_span("Scan", &self.table_name, &self.region);
        let items = scan_all(&self.client, &self.table_name)
            .instrument(span)
            .await?;

        Ok(items
            .iter()
            .filter_map(|item| match self.item_to_user(item) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Failed to parse user item: {}", e);
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl UserRepository for DynamoDbUserRepository {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<User>> {
        let mut users = self.scan_users().await?;
        users.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        info!("Found {} users", users.len());
        Ok(users)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<User>> {
        let span = dynamodb_span("GetItem", &self.table_name, &self.region);
        let output = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("id", s(id))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(span)
        .await?;

        output.item.map(|item| self.item_to_user(&item)).transpose()
    }

    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> RepositoryResult<Option<User>> {
        let users = self.scan_users().await?;
        Ok(users
            .into_iter()
            .find(|user| user.email == email || user.username == username))
    }

    #[instrument(skip(self, user), fields(table = %self.table_name, id = %user.id))]
    async fn create(&self, user: User) -> RepositoryResult<User> {
        let span = dynamodb_span("PutItem", &self.table_name, &self.region);
        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(self.user_to_item(&user)))
                .condition_expression("attribute_not_exists(id)")
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(span)
        .await?;

        info!("User created");
        Ok(user)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn exists(&self, id: &str) -> RepositoryResult<bool> {
        let span = dynamodb_span("GetItem", &self.table_name, &self.region);
        let output = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("id", s(id))
                .projection_expression("id")
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(span)
        .await?;

        Ok(output.item.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateUserRequest;

    #[test]
    fn test_user_item_conversion() {
        let config = aws_sdk_dynamodb::Config::builder()
            .region(aws_sdk_dynamodb::config::Region::new("us-west-2"))
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .build();
        let repo = DynamoDbUserRepository::new(
            Arc::new(DynamoDbClient::from_conf(config)),
            "test-users".to_string(),
            "us-west-2".to_string(),
        );
        let user = User::new(CreateUserRequest {
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        });

        let mut item = repo.user_to_item(&user);
        let parsed = repo.item_to_user(&item).unwrap();
        assert_eq!(parsed, user);

        item.remove("email");
        assert!(repo.item_to_user(&item).is_err());
    }
}
