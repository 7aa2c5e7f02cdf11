use async_trait::async_trait;
use aws_sdk_dynamodb::types::ReturnValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::dynamodb::{dynamodb_span, get_datetime, get_s, map_dynamodb_error, missing, s, Item};
use crate::models::{
    sort_by_added, RepositoryError, RepositoryResult, UserListEntry, UserListKind,
};

/// Favorites, shopping carts and subscriptions, partitioned by user
#[async_trait]
pub trait UserListRepository: Send + Sync {
    /// Entries of one list, oldest first
    async fn find_entries(
        &self,
        user_id: &str,
        kind: UserListKind,
    ) -> RepositoryResult<Vec<UserListEntry>>;

    async fn contains(
        &self,
        user_id: &str,
        kind: UserListKind,
        target_id: &str,
    ) -> RepositoryResult<bool>;

    /// Add an entry; returns false if it was already present
    async fn add_entry(&self, entry: UserListEntry) -> RepositoryResult<bool>;

    /// Remove an entry; returns false if it was not present
    async fn remove_entry(
        &self,
        user_id: &str,
        kind: UserListKind,
        target_id: &str,
    ) -> RepositoryResult<bool>;
}

pub struct DynamoDbUserListRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbUserListRepository {
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

    pub fn entry_to_item(&self, entry: &UserListEntry) -> Item {
        let mut item = HashMap::new();
        item.insert("user_id".to_string(), s(&entry.user_id));
        item.insert("list_key".to_string(), s(entry.list_key()));
        item.insert("added_at".to_string(), s(entry.added_at.to_rfc3339()));
        item
    }

    pub fn item_to_entry(&self, item: &Item) -> RepositoryResult<UserListEntry> {
        let list_key = get_s(item, "list_key")?;
        let (kind, target_id) =
            UserListEntry::parse_list_key(&list_key).ok_or_else(|| missing("list_key"))?;

        Ok(UserListEntry {
            user_id: get_s(item, "user_id")?,
            kind,
            target_id,
            added_at: get_datetime(item, "added_at")?,
        })
    }

    /// Convert a whole list, failing on the first unreadable row
    pub fn items_to_entries(&self, items: &[Item]) -> RepositoryResult<Vec<UserListEntry>> {
        let mut entries = items
            .iter()
            .map(|item| self.item_to_entry(item))
            .collect::<RepositoryResult<Vec<_>>>()?;
        sort_by_added(&mut entries);
        Ok(entries)
    }

    fn key(&self, user_id: &str, kind: UserListKind, target_id: &str) -> Item {
        let mut key = HashMap::new();
        key.insert("user_id".to_string(), s(user_id));
        key.insert(
            "list_key".to_string(),
            s(UserListEntry::key_for(kind, target_id)),
        );
        key
    }
}

#[async_trait]
impl UserListRepository for DynamoDbUserListRepository {
    #[instrument(skip(self), fields(table = %self.table_name, user_id = %user_id, kind = %kind))]
    async fn find_entries(
        &self,
        user_id: &str,
        kind: UserListKind,
    ) -> RepositoryResult<Vec<UserListEntry>> {
        let span = dynamodb_span("Query", &self.table_name, &self.region);

        let items = async {
            let mut items = Vec::new();
            let mut start_key = None;
            loop {
                let output = self
                    .client
                    .query()
                    .table_name(&self.table_name)
                    .key_condition_expression("user_id = :user_id AND begins_with(list_key, :prefix)")
                    .expression_attribute_values(":user_id", s(user_id))
                    .expression_attribute_values(":prefix", s(UserListEntry::key_prefix(kind)))
                    .set_exclusive_start_key(start_key)
                    .send()
                    .await
                    .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))?;

                items.extend(output.items.unwrap_or_default());
                match output.last_evaluated_key {
                    Some(key) if !key.is_empty() => start_key = Some(key),
                    _ => break,
                }
            }
            RepositoryResult::Ok(items)
        }
        .instrument(span)
        .await?;

        let entries = self.items_to_entries(&items).map_err(|e| {
            warn!(error = %e, "Unreadable user list item");
            e
        })?;

        info!("Found {} entries", entries.len());
        Ok(entries)
    }

    #[instrument(skip(self), fields(table = %self.table_name, user_id = %user_id, kind = %kind, target_id = %target_id))]
    async fn contains(
        &self,
        user_id: &str,
        kind: UserListKind,
        target_id: &str,
    ) -> RepositoryResult<bool> {
        let span = dynamodb_span("GetItem", &self.table_name, &self.region);
        let output = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .set_key(Some(self.key(user_id, kind, target_id)))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(span)
        .await?;

        Ok(output.item.is_some())
    }

    #[instrument(skip(self, entry), fields(table = %self.table_name, user_id = %entry.user_id, kind = %entry.kind, target_id = %entry.target_id))]
    async fn add_entry(&self, entry: UserListEntry) -> RepositoryResult<bool> {
        let span = dynamodb_span("PutItem", &self.table_name, &self.region);
        let result = async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(self.entry_to_item(&entry)))
                .condition_expression("attribute_not_exists(list_key)")
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(span)
        .await;

        match result {
            Ok(_) => {
                info!("List entry added");
                Ok(true)
            }
            Err(RepositoryError::ConstraintViolation { .. }) => {
                info!("List entry already present");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self), fields(table = %self.table_name, user_id = %user_id, kind = %kind, target_id = %target_id))]
    async fn remove_entry(
        &self,
        user_id: &str,
        kind: UserListKind,
        target_id: &str,
    ) -> RepositoryResult<bool> {
        let span = dynamodb_span("DeleteItem", &self.table_name, &self.region);
        let output = async {
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .set_key(Some(self.key(user_id, kind, target_id)))
                .return_values(ReturnValue::AllOld)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(span)
        .await?;

        let removed = output.attributes.is_some_and(|attributes| !attributes.is_empty());
        info!(removed, "List entry remove finished");
        Ok(removed)
    }
}
